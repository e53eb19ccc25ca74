use std::str::FromStr;

use franchiseops_core::DomainError;

use crate::app::errors;

/// Parse a path segment into a typed key, or produce the 400 response.
pub fn parse_key<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
