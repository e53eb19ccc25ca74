//! Transactional record store.
//!
//! Every rule unit works against a [`UnitOfWork`]: one all-or-nothing
//! transaction over the relational model, begun from a [`Database`]. Rules
//! never commit on their own; whoever begins the unit of work owns the
//! commit/rollback decision.
//!
//! ## Isolation
//!
//! [`UnitOfWork::lock_material`] reads a material and holds a write lock on its
//! row until the unit of work ends, so a read-check-decrement sequence on one
//! material cannot interleave with another on the same material.
//!
//! ## Implementations
//!
//! - [`InMemoryDatabase`]: tests/dev, fully serialised.
//! - [`PostgresDatabase`]: sqlx, one database transaction per unit of work,
//!   `SELECT ... FOR UPDATE` row locks.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use franchiseops_core::FranchiseId;
use franchiseops_inventory::{InventoryItemId, InventoryRecord, MaterialId, RawMaterial, Shipment};
use franchiseops_purchasing::{PoNumber, PurchaseOrder};
use franchiseops_reporting::ReportingDataset;
use franchiseops_sales::{Coupon, CouponCode, Order, OrderId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryDatabase, ReferenceData};
pub use postgres::PostgresDatabase;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors (missing
/// references, stock rules), which the rule units raise themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert collided with an existing key.
    #[error("duplicate {table} key: {key}")]
    Duplicate { table: &'static str, key: String },

    /// Update targeted a row that does not exist.
    #[error("no {table} row with key: {key}")]
    Missing { table: &'static str, key: String },

    /// The unit of work was already committed or rolled back.
    #[error("unit of work already finished")]
    Finished,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// One transaction against the record store.
///
/// Dropping a unit of work without calling [`commit`](UnitOfWork::commit)
/// discards every change made through it.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_coupon(&mut self, code: &CouponCode) -> StoreResult<Option<Coupon>>;

    async fn insert_coupon(&mut self, coupon: &Coupon) -> StoreResult<()>;

    /// Read a material and lock it against other units of work until this one ends.
    async fn lock_material(&mut self, id: &MaterialId) -> StoreResult<Option<RawMaterial>>;

    async fn insert_material(&mut self, material: &RawMaterial) -> StoreResult<()>;

    /// Fails with [`StoreError::Missing`] when the material does not exist.
    async fn update_material_quantity(&mut self, id: &MaterialId, quantity: i64)
    -> StoreResult<()>;

    /// Insert or replace.
    async fn save_order(&mut self, order: &Order) -> StoreResult<()>;

    /// Insert or replace, keyed by franchise and item.
    async fn save_inventory_record(&mut self, record: &InventoryRecord) -> StoreResult<()>;

    async fn insert_shipment(&mut self, shipment: &Shipment) -> StoreResult<()>;

    /// Fails with [`StoreError::Duplicate`] when the PO number is taken.
    async fn insert_purchase_order(&mut self, order: &PurchaseOrder) -> StoreResult<()>;

    async fn commit(&mut self) -> StoreResult<()>;

    async fn rollback(&mut self) -> StoreResult<()>;
}

/// Entry point to the record store: begins units of work and serves reads of
/// committed state.
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>>;

    async fn coupon(&self, code: &CouponCode) -> StoreResult<Option<Coupon>>;

    async fn material(&self, id: &MaterialId) -> StoreResult<Option<RawMaterial>>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn inventory_record(
        &self,
        franchise_id: &FranchiseId,
        item_id: &InventoryItemId,
    ) -> StoreResult<Option<InventoryRecord>>;

    async fn purchase_order(&self, po_number: &PoNumber) -> StoreResult<Option<PurchaseOrder>>;

    async fn shipments_for_material(&self, id: &MaterialId) -> StoreResult<Vec<Shipment>>;

    /// Snapshot of everything the reports read.
    async fn reporting_dataset(&self) -> StoreResult<ReportingDataset>;
}

#[async_trait]
impl<D> Database for Arc<D>
where
    D: Database + ?Sized,
{
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        (**self).begin().await
    }

    async fn coupon(&self, code: &CouponCode) -> StoreResult<Option<Coupon>> {
        (**self).coupon(code).await
    }

    async fn material(&self, id: &MaterialId) -> StoreResult<Option<RawMaterial>> {
        (**self).material(id).await
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        (**self).order(id).await
    }

    async fn inventory_record(
        &self,
        franchise_id: &FranchiseId,
        item_id: &InventoryItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        (**self).inventory_record(franchise_id, item_id).await
    }

    async fn purchase_order(&self, po_number: &PoNumber) -> StoreResult<Option<PurchaseOrder>> {
        (**self).purchase_order(po_number).await
    }

    async fn shipments_for_material(&self, id: &MaterialId) -> StoreResult<Vec<Shipment>> {
        (**self).shipments_for_material(id).await
    }

    async fn reporting_dataset(&self) -> StoreResult<ReportingDataset> {
        (**self).reporting_dataset().await
    }
}
