//! Purchase order processing.
//!
//! Records a purchase order and raises its material's quantity as one
//! all-or-nothing transaction:
//!
//! ```text
//! Started
//!   ↓ lock material            (absent → MaterialNotFound, -20001)
//! MaterialValidated
//!   ↓ insert purchase order
//! OrderInserted
//!   ↓ quantity += purchase quantity
//! StockUpdated
//!   ↓ commit
//! Committed
//! ```
//!
//! Any failure after the material lookup rolls everything back and surfaces
//! as `Unexpected` (-20002) with the original cause attached. Every failure
//! inside the transaction ends in `RolledBack`; the receipt of a successful
//! run carries `Committed`. Requests refused by strict input validation never
//! open a transaction (-20003).

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use franchiseops_core::{DomainError, InvariantMode};
use franchiseops_inventory::MaterialId;
use franchiseops_purchasing::{PoNumber, ProcessPurchaseOrder, PurchaseOrderState};

use crate::store::{Database, StoreError, UnitOfWork};

/// Error code raised when the purchase order names an unknown material.
pub const MATERIAL_NOT_FOUND_CODE: i32 = -20001;
/// Error code for any other failure inside the transaction.
pub const UNEXPECTED_ERROR_CODE: i32 = -20002;
/// Error code for requests rejected before the transaction starts.
pub const REJECTED_CODE: i32 = -20003;

/// Underlying failure wrapped by [`PurchaseOrderError::Unexpected`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurchaseOrderError {
    #[error("material not found: {material_id}")]
    MaterialNotFound {
        material_id: MaterialId,
        /// Last state reached before the lookup failed.
        failed_at: PurchaseOrderState,
    },

    #[error("purchase order rejected: {0}")]
    Rejected(#[source] DomainError),

    #[error("unexpected error processing purchase order (after {failed_at}): {cause}")]
    Unexpected {
        /// Last state reached before the failure.
        failed_at: PurchaseOrderState,
        #[source]
        cause: TransactionCause,
    },
}

impl PurchaseOrderError {
    pub fn code(&self) -> i32 {
        match self {
            PurchaseOrderError::MaterialNotFound { .. } => MATERIAL_NOT_FOUND_CODE,
            PurchaseOrderError::Rejected(_) => REJECTED_CODE,
            PurchaseOrderError::Unexpected { .. } => UNEXPECTED_ERROR_CODE,
        }
    }

    /// Last state the transaction reached, `Started` for rejected requests.
    pub fn failed_at(&self) -> PurchaseOrderState {
        match self {
            PurchaseOrderError::MaterialNotFound { failed_at, .. }
            | PurchaseOrderError::Unexpected { failed_at, .. } => *failed_at,
            PurchaseOrderError::Rejected(_) => PurchaseOrderState::Started,
        }
    }

    /// Terminal state of the failed run. Nothing is ever applied, so this is
    /// always `RolledBack`.
    pub fn final_state(&self) -> PurchaseOrderState {
        PurchaseOrderState::RolledBack
    }

    fn unexpected(failed_at: PurchaseOrderState, cause: impl Into<TransactionCause>) -> Self {
        PurchaseOrderError::Unexpected {
            failed_at,
            cause: cause.into(),
        }
    }
}

/// Outcome of a committed purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOrderReceipt {
    pub po_number: PoNumber,
    pub material_id: MaterialId,
    pub updated_quantity: i64,
    /// `Committed` from [`PurchaseOrderProcessor::process`], `StockUpdated`
    /// from [`PurchaseOrderProcessor::execute_in`].
    pub state: PurchaseOrderState,
}

pub struct PurchaseOrderProcessor<D> {
    db: D,
    mode: InvariantMode,
}

impl<D: Database> PurchaseOrderProcessor<D> {
    pub fn new(db: D, mode: InvariantMode) -> Self {
        Self { db, mode }
    }

    /// Run the purchase order in its own transaction and commit it.
    pub async fn process(
        &self,
        request: &ProcessPurchaseOrder,
    ) -> Result<PurchaseOrderReceipt, PurchaseOrderError> {
        self.check(request)?;

        let mut uow = self
            .db
            .begin()
            .await
            .map_err(|e| PurchaseOrderError::unexpected(PurchaseOrderState::Started, e))?;

        let mut receipt = match self.execute_in(uow.as_mut(), request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    error!(
                        po_number = %request.po_number,
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                let state = advance(err.failed_at(), PurchaseOrderState::RolledBack)?;
                warn!(
                    po_number = %request.po_number,
                    failed_at = %err.failed_at(),
                    %state,
                    code = err.code(),
                    error = %err,
                    "purchase order rolled back"
                );
                return Err(err);
            }
        };

        if let Err(commit_err) = uow.commit().await {
            let err = PurchaseOrderError::unexpected(receipt.state, commit_err);
            let state = advance(receipt.state, PurchaseOrderState::RolledBack)?;
            error!(
                po_number = %request.po_number,
                %state,
                code = err.code(),
                error = %err,
                "purchase order commit failed"
            );
            return Err(err);
        }
        receipt.state = advance(receipt.state, PurchaseOrderState::Committed)?;

        info!(po_number = %receipt.po_number, state = %receipt.state, "purchase order recorded");
        info!(
            material_id = %receipt.material_id,
            updated_quantity = receipt.updated_quantity,
            "material stock updated"
        );
        Ok(receipt)
    }

    /// Apply the purchase order steps on a unit of work owned by the caller.
    ///
    /// Nothing is committed here; on error the caller must roll back (or drop
    /// the unit of work).
    pub async fn execute_in(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &ProcessPurchaseOrder,
    ) -> Result<PurchaseOrderReceipt, PurchaseOrderError> {
        self.check(request)?;

        let mut state = PurchaseOrderState::Started;

        let material = uow
            .lock_material(&request.material_id)
            .await
            .map_err(|e| PurchaseOrderError::unexpected(state, e))?
            .ok_or_else(|| PurchaseOrderError::MaterialNotFound {
                material_id: request.material_id.clone(),
                failed_at: state,
            })?;
        state = advance(state, PurchaseOrderState::MaterialValidated)?;

        let updated_quantity = request
            .restocked_quantity(material.quantity)
            .map_err(|e| PurchaseOrderError::unexpected(state, e))?;

        uow.insert_purchase_order(&request.to_record())
            .await
            .map_err(|e| PurchaseOrderError::unexpected(state, e))?;
        state = advance(state, PurchaseOrderState::OrderInserted)?;

        uow.update_material_quantity(&material.id, updated_quantity)
            .await
            .map_err(|e| PurchaseOrderError::unexpected(state, e))?;
        state = advance(state, PurchaseOrderState::StockUpdated)?;

        debug!(po_number = %request.po_number, %state, "purchase order steps applied");
        Ok(PurchaseOrderReceipt {
            po_number: request.po_number.clone(),
            material_id: material.id,
            updated_quantity,
            state,
        })
    }

    fn check(&self, request: &ProcessPurchaseOrder) -> Result<(), PurchaseOrderError> {
        request
            .validate(self.mode)
            .map_err(PurchaseOrderError::Rejected)
    }
}

fn advance(
    from: PurchaseOrderState,
    to: PurchaseOrderState,
) -> Result<PurchaseOrderState, PurchaseOrderError> {
    from.transition(to)
        .map_err(|e| PurchaseOrderError::unexpected(from, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use franchiseops_inventory::RawMaterial;

    use crate::store::InMemoryDatabase;

    fn request(po: &str, material: &str, quantity: i64) -> ProcessPurchaseOrder {
        ProcessPurchaseOrder {
            po_number: PoNumber::new(po).unwrap(),
            material_id: MaterialId::new(material).unwrap(),
            quantity,
            ordered_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    async fn processor_with_material(
        quantity: i64,
        mode: InvariantMode,
    ) -> (Arc<InMemoryDatabase>, PurchaseOrderProcessor<Arc<InMemoryDatabase>>) {
        let db = Arc::new(InMemoryDatabase::new());
        let mut uow = db.begin().await.unwrap();
        uow.insert_material(
            &RawMaterial::new(MaterialId::new("RM-1").unwrap(), "Tomatoes", quantity).unwrap(),
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();
        drop(uow);

        let processor = PurchaseOrderProcessor::new(Arc::clone(&db), mode);
        (db, processor)
    }

    async fn quantity(db: &InMemoryDatabase) -> i64 {
        db.material(&MaterialId::new("RM-1").unwrap())
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[test]
    fn error_codes() {
        let not_found = PurchaseOrderError::MaterialNotFound {
            material_id: MaterialId::new("RM-9").unwrap(),
            failed_at: PurchaseOrderState::Started,
        };
        assert_eq!(not_found.code(), -20001);

        let unexpected = PurchaseOrderError::unexpected(
            PurchaseOrderState::MaterialValidated,
            StoreError::Backend("boom".to_string()),
        );
        assert_eq!(unexpected.code(), -20002);

        let rejected = PurchaseOrderError::Rejected(DomainError::validation("bad"));
        assert_eq!(rejected.code(), -20003);
    }

    #[tokio::test]
    async fn restock_adds_quantity_and_records_the_order() {
        let (db, processor) = processor_with_material(100, InvariantMode::Strict).await;

        let receipt = processor.process(&request("PO-1", "RM-1", 500)).await.unwrap();
        assert_eq!(
            receipt,
            PurchaseOrderReceipt {
                po_number: PoNumber::new("PO-1").unwrap(),
                material_id: MaterialId::new("RM-1").unwrap(),
                updated_quantity: 600,
                state: PurchaseOrderState::Committed,
            }
        );
        assert_eq!(quantity(&db).await, 600);

        let po = db
            .purchase_order(&PoNumber::new("PO-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(po.quantity, 500);
    }

    #[tokio::test]
    async fn missing_material_raises_specific_error_and_creates_nothing() {
        let (db, processor) = processor_with_material(100, InvariantMode::Strict).await;

        let err = processor
            .process(&request("PO-1", "RM-404", 5))
            .await
            .unwrap_err();
        assert_eq!(err.code(), MATERIAL_NOT_FOUND_CODE);
        assert_eq!(
            err,
            PurchaseOrderError::MaterialNotFound {
                material_id: MaterialId::new("RM-404").unwrap(),
                failed_at: PurchaseOrderState::Started,
            }
        );
        assert_eq!(err.final_state(), PurchaseOrderState::RolledBack);
        assert!(
            db.purchase_order(&PoNumber::new("PO-1").unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_po_number_rolls_back_stock() {
        let (db, processor) = processor_with_material(100, InvariantMode::Strict).await;
        processor.process(&request("PO-1", "RM-1", 500)).await.unwrap();

        let err = processor
            .process(&request("PO-1", "RM-1", 50))
            .await
            .unwrap_err();
        assert_eq!(err.code(), UNEXPECTED_ERROR_CODE);
        assert_eq!(err.final_state(), PurchaseOrderState::RolledBack);
        match err {
            PurchaseOrderError::Unexpected { failed_at, cause } => {
                assert_eq!(failed_at, PurchaseOrderState::MaterialValidated);
                assert!(matches!(
                    cause,
                    TransactionCause::Store(StoreError::Duplicate { .. })
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(quantity(&db).await, 600);

        let po = db
            .purchase_order(&PoNumber::new("PO-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(po.quantity, 500);
    }

    #[tokio::test]
    async fn strict_mode_rejects_non_positive_quantity_before_the_transaction() {
        let (db, processor) = processor_with_material(100, InvariantMode::Strict).await;

        let err = processor
            .process(&request("PO-1", "RM-1", 0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), REJECTED_CODE);
        assert_eq!(quantity(&db).await, 100);
    }

    #[tokio::test]
    async fn compatible_mode_lets_negative_quantity_through() {
        let (db, processor) = processor_with_material(100, InvariantMode::Compatible).await;

        let receipt = processor.process(&request("PO-1", "RM-1", -5)).await.unwrap();
        assert_eq!(receipt.updated_quantity, 95);
        assert_eq!(quantity(&db).await, 95);
    }

    #[tokio::test]
    async fn execute_in_leaves_commit_to_the_caller() {
        let (db, processor) = processor_with_material(10, InvariantMode::Strict).await;

        {
            let mut uow = db.begin().await.unwrap();
            let receipt = processor
                .execute_in(uow.as_mut(), &request("PO-1", "RM-1", 5))
                .await
                .unwrap();
            assert_eq!(receipt.updated_quantity, 15);
            assert_eq!(receipt.state, PurchaseOrderState::StockUpdated);
            // Dropped without commit.
        }
        assert_eq!(quantity(&db).await, 10);
        assert!(
            db.purchase_order(&PoNumber::new("PO-1").unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn failures_roll_back_from_the_last_reached_state() {
        for failed_at in [
            PurchaseOrderState::Started,
            PurchaseOrderState::MaterialValidated,
            PurchaseOrderState::OrderInserted,
            PurchaseOrderState::StockUpdated,
        ] {
            let err = PurchaseOrderError::unexpected(failed_at, StoreError::Finished);
            assert_eq!(err.failed_at(), failed_at);
            assert_eq!(
                advance(err.failed_at(), PurchaseOrderState::RolledBack).unwrap(),
                err.final_state()
            );
        }
        assert!(advance(PurchaseOrderState::Committed, PurchaseOrderState::RolledBack).is_err());
    }
}
