//! Domain error types for the catalog and customer services.

use store::StoreError;
use thiserror::Error;

use crate::validation::{FieldError, ValidationErrors};

/// Errors that can occur in catalog and customer operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input failed field validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The addressed record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The write conflicts with existing data (duplicate name or email,
    /// protected deletion).
    #[error("{0}")]
    Conflict(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CatalogError::NotFound { entity, id },
            err @ (StoreError::Protected { .. } | StoreError::Constraint(_)) => {
                CatalogError::Conflict(err.to_string())
            }
            err => CatalogError::Store(err),
        }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::Validation(errors)
    }
}

impl From<FieldError> for CatalogError {
    fn from(error: FieldError) -> Self {
        CatalogError::Validation(error.into())
    }
}
