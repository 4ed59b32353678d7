//! HTTP route handlers.

pub mod categories;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod products;
pub mod sales;

use crate::error::ApiError;

/// Parses a store-assigned integer key from a path segment.
fn parse_key<T: From<i64>>(entity: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse::<i64>()
        .map(T::from)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {entity} id: {raw}")))
}
