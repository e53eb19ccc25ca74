//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every persisted record type (order, material, shipment, purchase order,
/// inventory record) is an entity keyed by its own identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Record type name used in logs and error messages (e.g. `"order"`).
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
