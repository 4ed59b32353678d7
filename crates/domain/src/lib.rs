//! Domain layer for the storefront backend.
//!
//! This crate provides:
//! - the sale creation workflow ([`SaleService`]) with its validation rules
//!   and payment confirmation seam
//! - catalog and customer services wrapping the store with input checks

pub mod catalog;
pub mod customers;
pub mod error;
pub mod sale;
pub mod validation;

pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use error::CatalogError;
pub use sale::{
    AssumePaid, CartLine, CreateSale, LineItemRequest, PaymentConfirmation, PaymentIntent,
    PaymentRejected, SaleError, SaleService, ValidatedCart,
};
pub use validation::{FieldError, ValidationErrors};
