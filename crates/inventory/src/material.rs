use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use franchiseops_core::{DomainError, DomainResult, Entity, FranchiseId, RecordId, string_id};

string_id!(
    /// Identifier of a raw material (e.g. `"RM-FLOUR"`).
    MaterialId,
    "MaterialId"
);

/// Units reserved from a material for every accepted shipment.
///
/// Fixed at one regardless of the shipment's own `quantity`; see DESIGN.md.
pub const SHIPMENT_RESERVATION_UNITS: i64 = 1;

/// A raw material and the quantity currently available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: MaterialId,
    pub name: String,
    pub quantity: i64,
}

impl RawMaterial {
    pub fn new(id: MaterialId, name: impl Into<String>, quantity: i64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self { id, name, quantity })
    }
}

impl Entity for RawMaterial {
    type Id = MaterialId;
    const KIND: &'static str = "material";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Shipment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(pub RecordId);

impl ShipmentId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(RecordId::new())
    }
}

impl core::fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Dispatch of a raw material. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub material_id: MaterialId,
    pub franchise_id: Option<FranchiseId>,
    /// Requested quantity; informational only.
    pub quantity: i64,
    pub shipped_on: NaiveDate,
}

impl Entity for Shipment {
    type Id = ShipmentId;
    const KIND: &'static str = "shipment";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Shipment reservation rule.
///
/// Returns the material's quantity after reserving one unit, or
/// `InsufficientStock` when nothing is available. Does not mutate; the caller
/// writes the new quantity in the same unit of work as the shipment.
pub fn reserve_for_shipment(material: &RawMaterial) -> DomainResult<i64> {
    if material.quantity <= 0 {
        return Err(DomainError::insufficient_stock(
            &material.id,
            material.quantity,
        ));
    }
    Ok(material.quantity - SHIPMENT_RESERVATION_UNITS)
}
