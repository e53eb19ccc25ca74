//! Strongly-typed identifiers used across the domain.
//!
//! Two flavours exist:
//! - [`RecordId`]: a generated UUIDv7 for records the system creates itself
//!   (orders, shipments).
//! - string keys declared with [`string_id!`](crate::string_id) for identifiers
//!   chosen by people (material codes, PO numbers, coupon codes, franchise codes).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a system-generated record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<RecordId> for Uuid {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("RecordId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Upper bound for human-chosen keys (matches the `VARCHAR(64)` key columns).
pub const MAX_KEY_LEN: usize = 64;

/// Validate a human-chosen key: trimmed, non-empty, bounded.
pub fn validate_key(kind: &str, raw: &str) -> Result<String, DomainError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(DomainError::invalid_id(format!("{kind}: cannot be empty")));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(DomainError::invalid_id(format!(
            "{kind}: longer than {MAX_KEY_LEN} characters"
        )));
    }
    Ok(key.to_string())
}

/// Declare a string-keyed identifier newtype.
///
/// The generated type validates through [`validate_key`] on construction and
/// serializes transparently as a string.
#[macro_export]
macro_rules! string_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(String);

        impl $t {
            pub fn new(raw: impl AsRef<str>) -> Result<Self, $crate::DomainError> {
                $crate::id::validate_key($name, raw.as_ref()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

string_id!(
    /// Identifier of a franchise location (e.g. `"FR-042"`).
    FranchiseId,
    "FranchiseId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_are_trimmed() {
        let id = FranchiseId::new("  FR-1 ").unwrap();
        assert_eq!(id.as_str(), "FR-1");
    }

    #[test]
    fn empty_string_id_is_rejected() {
        let err = FranchiseId::new("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.contains("FranchiseId")));
    }

    #[test]
    fn overlong_string_id_is_rejected() {
        let raw = "x".repeat(MAX_KEY_LEN + 1);
        assert!(FranchiseId::new(raw).is_err());
    }

    #[test]
    fn string_id_deserialization_validates() {
        let ok: FranchiseId = serde_json::from_str("\"FR-9\"").unwrap();
        assert_eq!(ok.to_string(), "FR-9");
        assert!(serde_json::from_str::<FranchiseId>("\"\"").is_err());
    }

    #[test]
    fn record_id_round_trips_through_display() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }
}
