//! `franchiseops-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{FranchiseId, RecordId};
pub use money::Money;
pub use value_object::ValueObject;

/// How strictly the optional record invariants are enforced.
///
/// `Strict` rejects negative order totals and non-positive purchase
/// quantities. `Compatible` lets them through unchanged so results can be
/// compared row for row against the legacy database.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantMode {
    #[default]
    Strict,
    Compatible,
}

impl InvariantMode {
    pub fn is_strict(self) -> bool {
        matches!(self, InvariantMode::Strict)
    }
}
