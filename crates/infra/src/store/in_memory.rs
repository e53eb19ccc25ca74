use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use franchiseops_core::FranchiseId;
use franchiseops_inventory::{
    InventoryItemId, InventoryKey, InventoryRecord, MaterialId, RawMaterial, Shipment,
};
use franchiseops_purchasing::{PoNumber, PurchaseOrder};
use franchiseops_reporting::{
    Agreement, Employee, Feedback, Franchise, OperatingCost, Owner, ReportingDataset, Shift,
};
use franchiseops_sales::{Coupon, CouponCode, Order, OrderId};

use super::{Database, StoreError, StoreResult, UnitOfWork};

/// Reporting-only reference rows (maintained outside the rule units).
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub owners: Vec<Owner>,
    pub franchises: Vec<Franchise>,
    pub employees: Vec<Employee>,
    pub shifts: Vec<Shift>,
    pub feedback: Vec<Feedback>,
    pub agreements: Vec<Agreement>,
    pub operating_costs: Vec<OperatingCost>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    coupons: HashMap<CouponCode, Coupon>,
    materials: HashMap<MaterialId, RawMaterial>,
    orders: HashMap<OrderId, Order>,
    inventory: HashMap<InventoryKey, InventoryRecord>,
    shipments: Vec<Shipment>,
    purchase_orders: HashMap<PoNumber, PurchaseOrder>,
}

/// In-memory record store.
///
/// Intended for tests/dev. A unit of work holds the store lock for its whole
/// lifetime and stages its changes on a private copy of the tables, so
/// transactions are fully serialised and an abandoned one leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
    reference: RwLock<ReferenceData>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reporting reference rows.
    pub fn set_reference_data(&self, data: ReferenceData) -> StoreResult<()> {
        let mut reference = self
            .reference
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        *reference = data;
        Ok(())
    }
}

struct InMemoryUnitOfWork<'a> {
    guard: Option<MutexGuard<'a, Tables>>,
    staged: Tables,
}

impl InMemoryUnitOfWork<'_> {
    fn staged(&mut self) -> StoreResult<&mut Tables> {
        if self.guard.is_none() {
            return Err(StoreError::Finished);
        }
        Ok(&mut self.staged)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork<'_> {
    async fn find_coupon(&mut self, code: &CouponCode) -> StoreResult<Option<Coupon>> {
        Ok(self.staged()?.coupons.get(code).cloned())
    }

    async fn insert_coupon(&mut self, coupon: &Coupon) -> StoreResult<()> {
        let tables = self.staged()?;
        if tables.coupons.contains_key(&coupon.code) {
            return Err(StoreError::Duplicate {
                table: "coupons",
                key: coupon.code.to_string(),
            });
        }
        tables.coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn lock_material(&mut self, id: &MaterialId) -> StoreResult<Option<RawMaterial>> {
        // The store-wide lock already covers the row.
        Ok(self.staged()?.materials.get(id).cloned())
    }

    async fn insert_material(&mut self, material: &RawMaterial) -> StoreResult<()> {
        let tables = self.staged()?;
        if tables.materials.contains_key(&material.id) {
            return Err(StoreError::Duplicate {
                table: "raw_materials",
                key: material.id.to_string(),
            });
        }
        tables.materials.insert(material.id.clone(), material.clone());
        Ok(())
    }

    async fn update_material_quantity(
        &mut self,
        id: &MaterialId,
        quantity: i64,
    ) -> StoreResult<()> {
        let material = self
            .staged()?
            .materials
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing {
                table: "raw_materials",
                key: id.to_string(),
            })?;
        material.quantity = quantity;
        Ok(())
    }

    async fn save_order(&mut self, order: &Order) -> StoreResult<()> {
        self.staged()?.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn save_inventory_record(&mut self, record: &InventoryRecord) -> StoreResult<()> {
        self.staged()?
            .inventory
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn insert_shipment(&mut self, shipment: &Shipment) -> StoreResult<()> {
        let tables = self.staged()?;
        if tables.shipments.iter().any(|s| s.id == shipment.id) {
            return Err(StoreError::Duplicate {
                table: "shipments",
                key: shipment.id.to_string(),
            });
        }
        tables.shipments.push(shipment.clone());
        Ok(())
    }

    async fn insert_purchase_order(&mut self, order: &PurchaseOrder) -> StoreResult<()> {
        let tables = self.staged()?;
        if tables.purchase_orders.contains_key(&order.po_number) {
            return Err(StoreError::Duplicate {
                table: "purchase_orders",
                key: order.po_number.to_string(),
            });
        }
        tables
            .purchase_orders
            .insert(order.po_number.clone(), order.clone());
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut guard = self.guard.take().ok_or(StoreError::Finished)?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        self.guard.take().ok_or(StoreError::Finished)?;
        self.staged = Tables::default();
        Ok(())
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let guard = self.tables.lock().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            guard: Some(guard),
            staged,
        }))
    }

    async fn coupon(&self, code: &CouponCode) -> StoreResult<Option<Coupon>> {
        Ok(self.tables.lock().await.coupons.get(code).cloned())
    }

    async fn material(&self, id: &MaterialId) -> StoreResult<Option<RawMaterial>> {
        Ok(self.tables.lock().await.materials.get(id).cloned())
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn inventory_record(
        &self,
        franchise_id: &FranchiseId,
        item_id: &InventoryItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        let key = InventoryKey::new(franchise_id.clone(), item_id.clone());
        Ok(self.tables.lock().await.inventory.get(&key).cloned())
    }

    async fn purchase_order(&self, po_number: &PoNumber) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self
            .tables
            .lock()
            .await
            .purchase_orders
            .get(po_number)
            .cloned())
    }

    async fn shipments_for_material(&self, id: &MaterialId) -> StoreResult<Vec<Shipment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .shipments
            .iter()
            .filter(|s| &s.material_id == id)
            .cloned()
            .collect())
    }

    async fn reporting_dataset(&self) -> StoreResult<ReportingDataset> {
        let (orders, inventory) = {
            let tables = self.tables.lock().await;
            (
                tables.orders.values().cloned().collect(),
                tables.inventory.values().cloned().collect(),
            )
        };
        let reference = self
            .reference
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?
            .clone();

        Ok(ReportingDataset {
            owners: reference.owners,
            franchises: reference.franchises,
            employees: reference.employees,
            shifts: reference.shifts,
            feedback: reference.feedback,
            agreements: reference.agreements,
            operating_costs: reference.operating_costs,
            orders,
            inventory,
        })
    }
}
