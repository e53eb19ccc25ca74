//! Purchasing domain module: purchase orders that restock raw materials.
//!
//! Pure domain logic. The transaction that records a purchase order and raises
//! the material quantity is orchestrated in the infrastructure layer, which
//! tracks its progress with [`PurchaseOrderState`].

pub mod order;

pub use order::{PoNumber, ProcessPurchaseOrder, PurchaseOrder, PurchaseOrderState};
