use std::sync::Arc;

use franchiseops_core::InvariantMode;
use franchiseops_infra::purchase_orders::{
    PurchaseOrderError, PurchaseOrderProcessor, PurchaseOrderReceipt,
};
use franchiseops_infra::store::{Database, StoreError};
use franchiseops_infra::write_path::{RecordWriter, WriteContext, WriteError};
use franchiseops_inventory::{InventoryRecord, RawMaterial, Shipment};
use franchiseops_purchasing::ProcessPurchaseOrder;
use franchiseops_sales::{Coupon, Order};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    db: Arc<dyn Database>,
    mode: InvariantMode,
    orders: RecordWriter<Order>,
    inventory: RecordWriter<InventoryRecord>,
    shipments: RecordWriter<Shipment>,
    purchase_orders: PurchaseOrderProcessor<Arc<dyn Database>>,
}

impl AppServices {
    pub fn new(db: Arc<dyn Database>, mode: InvariantMode) -> Self {
        Self {
            purchase_orders: PurchaseOrderProcessor::new(Arc::clone(&db), mode),
            db,
            mode,
            orders: RecordWriter::orders(),
            inventory: RecordWriter::inventory(),
            shipments: RecordWriter::shipments(),
        }
    }

    /// Committed-state reads.
    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn mode(&self) -> InvariantMode {
        self.mode
    }

    fn write_context(&self) -> WriteContext {
        WriteContext::now(self.mode)
    }

    pub async fn create_coupon(&self, coupon: &Coupon) -> Result<(), StoreError> {
        let mut uow = self.db.begin().await?;
        uow.insert_coupon(coupon).await?;
        uow.commit().await
    }

    pub async fn create_material(&self, material: &RawMaterial) -> Result<(), StoreError> {
        let mut uow = self.db.begin().await?;
        uow.insert_material(material).await?;
        uow.commit().await
    }

    pub async fn place_order(&self, order: Order) -> Result<Order, WriteError> {
        self.orders
            .write(self.db.as_ref(), order, &self.write_context())
            .await
    }

    pub async fn save_inventory(
        &self,
        record: InventoryRecord,
    ) -> Result<InventoryRecord, WriteError> {
        self.inventory
            .write(self.db.as_ref(), record, &self.write_context())
            .await
    }

    pub async fn ship(&self, shipment: Shipment) -> Result<Shipment, WriteError> {
        self.shipments
            .write(self.db.as_ref(), shipment, &self.write_context())
            .await
    }

    pub async fn process_purchase_order(
        &self,
        request: &ProcessPurchaseOrder,
    ) -> Result<PurchaseOrderReceipt, PurchaseOrderError> {
        self.purchase_orders.process(request).await
    }
}
