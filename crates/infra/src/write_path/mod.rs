//! Record write pipeline.
//!
//! Every order, inventory record and shipment reaches the store through a
//! [`RecordWriter`], which runs the record's before-write hooks inside the same
//! unit of work that persists it:
//!
//! ```text
//! record
//!   ↓
//! 1. begin unit of work
//!   ↓
//! 2. run hooks in registration order (may mutate the record or veto the write)
//!   ↓
//! 3. persist the record
//!   ↓
//! 4. commit (any error above rolls back instead)
//! ```
//!
//! Hooks see the transactional context, so reads and writes they make (coupon
//! lookup, material lock and decrement) commit or roll back together with the
//! record itself.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use franchiseops_core::{DomainError, Entity, InvariantMode};
use franchiseops_inventory::{InventoryRecord, Shipment};
use franchiseops_sales::Order;

use crate::store::{Database, StoreError, StoreResult, UnitOfWork};

pub mod hooks;

pub use hooks::{OrderPricingHook, ShipmentStockGuard, StockStatusHook};

/// Write-path failure: a rule vetoed the record or the store failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inputs the hooks need besides the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteContext {
    /// Calendar date coupons are checked against.
    pub today: NaiveDate,
    pub mode: InvariantMode,
}

impl WriteContext {
    pub fn new(today: NaiveDate, mode: InvariantMode) -> Self {
        Self { today, mode }
    }

    /// Context dated today (UTC).
    pub fn now(mode: InvariantMode) -> Self {
        Self::new(Utc::now().date_naive(), mode)
    }
}

/// Runs before a record of type `R` is persisted.
///
/// A hook may mutate the record or read/write other rows through `uow`.
/// Returning an error aborts the whole write.
#[async_trait]
pub trait BeforeWrite<R: Send>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn before_write(
        &self,
        uow: &mut dyn UnitOfWork,
        record: &mut R,
        ctx: &WriteContext,
    ) -> Result<(), WriteError>;
}

/// How a record type is stored once its hooks have run.
#[async_trait]
pub trait Persist: Entity + Send + Sync {
    async fn persist(&self, uow: &mut dyn UnitOfWork) -> StoreResult<()>;
}

#[async_trait]
impl Persist for Order {
    async fn persist(&self, uow: &mut dyn UnitOfWork) -> StoreResult<()> {
        uow.save_order(self).await
    }
}

#[async_trait]
impl Persist for InventoryRecord {
    async fn persist(&self, uow: &mut dyn UnitOfWork) -> StoreResult<()> {
        uow.save_inventory_record(self).await
    }
}

#[async_trait]
impl Persist for Shipment {
    async fn persist(&self, uow: &mut dyn UnitOfWork) -> StoreResult<()> {
        uow.insert_shipment(self).await
    }
}

/// Ordered hook chain plus persistence for one record type.
pub struct RecordWriter<R: Send> {
    hooks: Vec<Box<dyn BeforeWrite<R>>>,
}

impl<R: Persist> Default for RecordWriter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Persist> RecordWriter<R> {
    /// Writer with no hooks: records are persisted as given.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a hook; hooks run in the order they were added.
    pub fn with_hook(mut self, hook: impl BeforeWrite<R> + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run hooks and persist `record` in its own unit of work.
    ///
    /// Returns the record as stored (hooks may have changed it).
    pub async fn write<D>(&self, db: &D, mut record: R, ctx: &WriteContext) -> Result<R, WriteError>
    where
        D: Database + ?Sized,
    {
        let mut uow = db.begin().await?;
        match self.apply(uow.as_mut(), &mut record, ctx).await {
            Ok(()) => {
                uow.commit().await?;
                Ok(record)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(kind = R::KIND, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Run hooks and persist `record` inside a unit of work owned by the caller.
    pub async fn apply(
        &self,
        uow: &mut dyn UnitOfWork,
        record: &mut R,
        ctx: &WriteContext,
    ) -> Result<(), WriteError> {
        for hook in &self.hooks {
            debug!(
                hook = hook.name(),
                kind = R::KIND,
                key = %record.id(),
                "running before-write hook"
            );
            if let Err(err) = hook.before_write(uow, record, ctx).await {
                warn!(
                    hook = hook.name(),
                    kind = R::KIND,
                    key = %record.id(),
                    error = %err,
                    "write rejected"
                );
                return Err(err);
            }
        }
        record.persist(uow).await?;
        Ok(())
    }
}

impl RecordWriter<Order> {
    /// Orders are priced before every write.
    pub fn orders() -> Self {
        Self::new().with_hook(OrderPricingHook)
    }
}

impl RecordWriter<InventoryRecord> {
    /// Inventory records get their stock status recomputed before every write.
    pub fn inventory() -> Self {
        Self::new().with_hook(StockStatusHook)
    }
}

impl RecordWriter<Shipment> {
    /// Shipments reserve one unit of their material or are rejected.
    pub fn shipments() -> Self {
        Self::new().with_hook(ShipmentStockGuard)
    }
}
