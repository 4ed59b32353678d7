use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Deletion refused because other records still reference this one.
    #[error("{entity} {id} cannot be deleted while {dependents} reference it")]
    Protected {
        entity: &'static str,
        id: String,
        dependents: &'static str,
    },

    /// A uniqueness or check constraint was violated.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// A stored value could not be decoded into its domain type.
    #[error("Invalid stored value: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn protected(entity: &'static str, id: impl ToString, dependents: &'static str) -> Self {
        StoreError::Protected {
            entity,
            id: id.to_string(),
            dependents,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
