use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use franchiseops_core::{DomainError, DomainResult, Entity, InvariantMode, string_id};
use franchiseops_inventory::MaterialId;

string_id!(
    /// Purchase order number, chosen by the buyer (e.g. `"PO-2024-001"`).
    PoNumber,
    "PoNumber"
);

/// Record of an incoming material restock. Immutable after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_number: PoNumber,
    pub material_id: MaterialId,
    pub quantity: i64,
    pub ordered_on: NaiveDate,
}

impl Entity for PurchaseOrder {
    type Id = PoNumber;
    const KIND: &'static str = "purchase order";

    fn id(&self) -> &Self::Id {
        &self.po_number
    }
}

/// Request to record a purchase order and restock its material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessPurchaseOrder {
    pub po_number: PoNumber,
    pub material_id: MaterialId,
    pub quantity: i64,
    pub ordered_on: NaiveDate,
}

impl ProcessPurchaseOrder {
    /// Input checks that run before any transaction is opened.
    pub fn validate(&self, mode: InvariantMode) -> DomainResult<()> {
        if mode.is_strict() && self.quantity <= 0 {
            return Err(DomainError::validation("purchase quantity must be positive"));
        }
        Ok(())
    }

    /// Quantity on hand once this order is received.
    pub fn restocked_quantity(&self, current: i64) -> DomainResult<i64> {
        current
            .checked_add(self.quantity)
            .ok_or_else(|| DomainError::invariant("material quantity overflow"))
    }

    pub fn to_record(&self) -> PurchaseOrder {
        PurchaseOrder {
            po_number: self.po_number.clone(),
            material_id: self.material_id.clone(),
            quantity: self.quantity,
            ordered_on: self.ordered_on,
        }
    }
}

/// Progress of one purchase-order transaction.
///
/// ```text
/// Started ─► MaterialValidated ─► OrderInserted ─► StockUpdated ─► Committed
///    │               │                  │                │
///    └───────────────┴──────────────────┴────────────────┴──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PurchaseOrderState {
    #[default]
    Started,
    MaterialValidated,
    OrderInserted,
    StockUpdated,
    /// Terminal: all steps applied.
    Committed,
    /// Terminal: nothing applied.
    RolledBack,
}

impl PurchaseOrderState {
    /// The state that follows this one on the success path.
    pub fn next(self) -> Option<Self> {
        match self {
            PurchaseOrderState::Started => Some(PurchaseOrderState::MaterialValidated),
            PurchaseOrderState::MaterialValidated => Some(PurchaseOrderState::OrderInserted),
            PurchaseOrderState::OrderInserted => Some(PurchaseOrderState::StockUpdated),
            PurchaseOrderState::StockUpdated => Some(PurchaseOrderState::Committed),
            PurchaseOrderState::Committed | PurchaseOrderState::RolledBack => None,
        }
    }

    /// Move to `to`, rejecting skipped steps and moves out of a terminal state.
    pub fn transition(self, to: Self) -> DomainResult<Self> {
        let allowed = match to {
            PurchaseOrderState::RolledBack => !self.is_terminal(),
            _ => self.next() == Some(to),
        };
        if allowed {
            Ok(to)
        } else {
            Err(DomainError::invariant(format!(
                "invalid purchase order transition {self} -> {to}"
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchaseOrderState::Committed | PurchaseOrderState::RolledBack
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseOrderState::Started => "Started",
            PurchaseOrderState::MaterialValidated => "MaterialValidated",
            PurchaseOrderState::OrderInserted => "OrderInserted",
            PurchaseOrderState::StockUpdated => "StockUpdated",
            PurchaseOrderState::Committed => "Committed",
            PurchaseOrderState::RolledBack => "RolledBack",
        }
    }
}

impl core::fmt::Display for PurchaseOrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(quantity: i64) -> ProcessPurchaseOrder {
        ProcessPurchaseOrder {
            po_number: PoNumber::new("PO-1").unwrap(),
            material_id: MaterialId::new("RM-1").unwrap(),
            quantity,
            ordered_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn restock_adds_purchase_quantity() {
        assert_eq!(request(500).restocked_quantity(100).unwrap(), 600);
    }

    #[test]
    fn restock_overflow_is_an_invariant_violation() {
        let err = request(1).restocked_quantity(i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn non_positive_quantity_rejected_only_when_strict() {
        assert!(request(0).validate(InvariantMode::Strict).is_err());
        assert!(request(-5).validate(InvariantMode::Strict).is_err());
        assert!(request(0).validate(InvariantMode::Compatible).is_ok());
        assert!(request(1).validate(InvariantMode::Strict).is_ok());
    }

    #[test]
    fn record_copies_request_fields() {
        let req = request(7);
        let po = req.to_record();
        assert_eq!(po.po_number, req.po_number);
        assert_eq!(po.material_id, req.material_id);
        assert_eq!(po.quantity, 7);
        assert_eq!(po.ordered_on, req.ordered_on);
    }

    #[test]
    fn success_path_walks_every_state() {
        let mut state = PurchaseOrderState::default();
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = state.transition(next).unwrap();
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                PurchaseOrderState::Started,
                PurchaseOrderState::MaterialValidated,
                PurchaseOrderState::OrderInserted,
                PurchaseOrderState::StockUpdated,
                PurchaseOrderState::Committed,
            ]
        );
    }

    #[test]
    fn cannot_skip_steps() {
        let err = PurchaseOrderState::Started
            .transition(PurchaseOrderState::StockUpdated)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvariantViolation(msg) if msg.contains("Started -> StockUpdated")
        ));
    }

    #[test]
    fn any_open_state_can_roll_back() {
        for s in [
            PurchaseOrderState::Started,
            PurchaseOrderState::MaterialValidated,
            PurchaseOrderState::OrderInserted,
            PurchaseOrderState::StockUpdated,
        ] {
            assert_eq!(
                s.transition(PurchaseOrderState::RolledBack).unwrap(),
                PurchaseOrderState::RolledBack
            );
        }
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(PurchaseOrderState::Committed
            .transition(PurchaseOrderState::RolledBack)
            .is_err());
        assert!(PurchaseOrderState::RolledBack
            .transition(PurchaseOrderState::RolledBack)
            .is_err());
        assert_eq!(PurchaseOrderState::Committed.next(), None);
    }
}
