//! Value types shared by every storefront crate: typed identifiers,
//! fixed-point money and the sale enumerations.

pub mod money;
pub mod status;
pub mod types;

pub use money::Money;
pub use status::{ParseEnumError, PaymentMethod, SaleStatus};
pub use types::{CategoryId, CustomerId, ProductId, SaleId};
