//! Sale creation workflow and related types.

mod commands;
mod payment;
mod service;
mod validation;

pub use commands::{CartLine, CreateSale, LineItemRequest, ValidatedCart};
pub use payment::{AssumePaid, PaymentConfirmation, PaymentIntent, PaymentRejected};
pub use service::SaleService;
pub use validation::{
    ValidationContext, validate_cart, validate_customer, validate_line_items_present,
    validate_payment_method, validate_product, validate_quantity,
};

use common::ProductId;
use store::StoreError;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur while creating a sale.
///
/// Every variant raised after validation leaves the store untouched: the unit
/// of work is dropped, and thereby rolled back, before the error is returned.
#[derive(Debug, Error)]
pub enum SaleError {
    /// The cart was rejected before any write.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A record passed validation but vanished before it was used.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A line item asks for more units than the product has.
    #[error("Insufficient stock for product: {product_name}")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: i64,
        available: i64,
    },

    /// The payment confirmation collaborator refused the payment.
    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl SaleError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        SaleError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            SaleError::Validation(_) => "validation",
            SaleError::NotFound { .. } => "not_found",
            SaleError::InsufficientStock { .. } => "insufficient_stock",
            SaleError::PaymentRejected(_) => "payment_rejected",
            SaleError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for SaleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => SaleError::NotFound { entity, id },
            err => SaleError::Store(err),
        }
    }
}

impl From<ValidationErrors> for SaleError {
    fn from(errors: ValidationErrors) -> Self {
        SaleError::Validation(errors)
    }
}
