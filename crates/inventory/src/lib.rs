//! Inventory domain module.
//!
//! Two concerns live here, both as deterministic domain logic (no IO, no
//! storage):
//! - franchise stock levels and their derived [`StockStatus`];
//! - raw materials and the one-unit reservation taken by each shipment.

pub mod material;
pub mod stock;

pub use material::{
    MaterialId, RawMaterial, SHIPMENT_RESERVATION_UNITS, Shipment, ShipmentId,
    reserve_for_shipment,
};
pub use stock::{InventoryItemId, InventoryKey, InventoryRecord, StockStatus};
