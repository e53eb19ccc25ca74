use serde::{Deserialize, Serialize};

use franchiseops_core::{DomainError, DomainResult, Entity, FranchiseId, string_id};

string_id!(
    /// Identifier of a stocked item at a franchise (e.g. a SKU).
    InventoryItemId,
    "InventoryItemId"
);

/// Derived stock-health label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    Low,
    Decent,
    High,
}

impl StockStatus {
    /// Classify quantity-on-hand against the reorder level.
    ///
    /// - `qoh <= reorder` → `Low`
    /// - `reorder < qoh <= 2 * reorder` → `Decent`
    /// - `qoh > 2 * reorder` → `High`
    pub fn classify(quantity_on_hand: i64, reorder_level: i64) -> DomainResult<Self> {
        if reorder_level < 0 {
            return Err(DomainError::validation("reorder_level cannot be negative"));
        }
        let double = reorder_level
            .checked_mul(2)
            .ok_or_else(|| DomainError::validation("reorder_level out of range"))?;

        Ok(if quantity_on_hand <= reorder_level {
            StockStatus::Low
        } else if quantity_on_hand <= double {
            StockStatus::Decent
        } else {
            StockStatus::High
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Low => "Low",
            StockStatus::Decent => "Decent",
            StockStatus::High => "High",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(StockStatus::Low),
            "Decent" => Ok(StockStatus::Decent),
            "High" => Ok(StockStatus::High),
            other => Err(DomainError::validation(format!("unknown stock status: {other}"))),
        }
    }
}

/// Identity of an inventory record: one item at one franchise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryKey {
    pub franchise_id: FranchiseId,
    pub item_id: InventoryItemId,
}

impl InventoryKey {
    pub fn new(franchise_id: FranchiseId, item_id: InventoryItemId) -> Self {
        Self {
            franchise_id,
            item_id,
        }
    }
}

impl core::fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.franchise_id, self.item_id)
    }
}

/// Stock level of one item at one franchise.
///
/// `status` is a pure function of the other two quantities and is recomputed
/// on every write through [`InventoryRecord::refresh_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(flatten)]
    pub key: InventoryKey,
    pub quantity_on_hand: i64,
    pub reorder_level: i64,
    pub status: StockStatus,
}

impl InventoryRecord {
    pub fn new(
        item_id: InventoryItemId,
        franchise_id: FranchiseId,
        quantity_on_hand: i64,
        reorder_level: i64,
    ) -> DomainResult<Self> {
        let status = StockStatus::classify(quantity_on_hand, reorder_level)?;
        Ok(Self {
            key: InventoryKey::new(franchise_id, item_id),
            quantity_on_hand,
            reorder_level,
            status,
        })
    }

    pub fn refresh_status(&mut self) -> DomainResult<StockStatus> {
        self.status = StockStatus::classify(self.quantity_on_hand, self.reorder_level)?;
        Ok(self.status)
    }
}

impl Entity for InventoryRecord {
    type Id = InventoryKey;
    const KIND: &'static str = "inventory record";

    fn id(&self) -> &Self::Id {
        &self.key
    }
}
