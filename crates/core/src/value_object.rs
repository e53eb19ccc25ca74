//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two amounts of
/// 180.00 are the same amount, while two orders with the same subtotal are
/// still two orders (see [`Entity`](crate::Entity)).
///
/// To "modify" a value object, create a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
