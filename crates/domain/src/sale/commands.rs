//! Sale commands.

use common::{CustomerId, PaymentMethod, ProductId};

/// One requested line of a cart, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    /// Signed so that zero and negative quantities reach validation.
    pub quantity: i64,
}

impl LineItemRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to create a sale from a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSale {
    /// The customer placing the order.
    pub customer_id: CustomerId,

    /// Payment method as submitted; parsed during validation.
    pub payment_method: String,

    /// Requested lines, processed in this order.
    pub line_items: Vec<LineItemRequest>,
}

impl CreateSale {
    /// Creates a new CreateSale command.
    pub fn new(
        customer_id: impl Into<CustomerId>,
        payment_method: impl Into<String>,
        line_items: Vec<LineItemRequest>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            payment_method: payment_method.into(),
            line_items,
        }
    }
}

/// A cart line that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A cart that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub line_items: Vec<CartLine>,
}
