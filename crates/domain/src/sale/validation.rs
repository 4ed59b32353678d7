//! Cart validation rules.
//!
//! Each rule is pure: existence facts are looked up beforehand and handed in
//! through a [`ValidationContext`].

use std::collections::HashSet;

use common::{CustomerId, PaymentMethod, ProductId};

use super::{CartLine, CreateSale, LineItemRequest, ValidatedCart};
use crate::validation::{FieldError, ValidationErrors};

/// Existence facts gathered from the store before validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub customer_exists: bool,
    pub existing_products: HashSet<ProductId>,
}

impl ValidationContext {
    pub fn new(customer_exists: bool, existing_products: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            customer_exists,
            existing_products: existing_products.into_iter().collect(),
        }
    }
}

pub fn validate_payment_method(raw: &str) -> Result<PaymentMethod, FieldError> {
    raw.parse()
        .map_err(|_| FieldError::new("payment_method", "invalid payment method"))
}

pub fn validate_customer(id: CustomerId, exists: bool) -> Result<CustomerId, FieldError> {
    if exists {
        Ok(id)
    } else {
        Err(FieldError::new("customer_id", "customer not found"))
    }
}

pub fn validate_line_items_present(items: &[LineItemRequest]) -> Result<(), FieldError> {
    if items.is_empty() {
        Err(FieldError::new("line_items", "empty cart"))
    } else {
        Ok(())
    }
}

pub fn validate_product(index: usize, id: ProductId, exists: bool) -> Result<ProductId, FieldError> {
    if exists {
        Ok(id)
    } else {
        Err(FieldError::new(
            format!("line_items[{index}].product_id"),
            "product not found",
        ))
    }
}

pub fn validate_quantity(index: usize, quantity: i64) -> Result<i64, FieldError> {
    if quantity >= 1 {
        Ok(quantity)
    } else {
        Err(FieldError::new(
            format!("line_items[{index}].quantity"),
            "quantity must be at least 1",
        ))
    }
}

/// Runs every rule against `cmd` and returns the cart only if all pass.
pub fn validate_cart(
    cmd: &CreateSale,
    ctx: &ValidationContext,
) -> Result<ValidatedCart, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let payment_method = errors.check(validate_payment_method(&cmd.payment_method));
    let customer_id = errors.check(validate_customer(cmd.customer_id, ctx.customer_exists));
    errors.check(validate_line_items_present(&cmd.line_items));

    let mut line_items = Vec::with_capacity(cmd.line_items.len());
    for (index, item) in cmd.line_items.iter().enumerate() {
        let exists = ctx.existing_products.contains(&item.product_id);
        let product_id = errors.check(validate_product(index, item.product_id, exists));
        let quantity = errors.check(validate_quantity(index, item.quantity));
        if let (Some(product_id), Some(quantity)) = (product_id, quantity) {
            line_items.push(CartLine {
                product_id,
                quantity,
            });
        }
    }

    match (payment_method, customer_id) {
        (Some(payment_method), Some(customer_id)) if errors.is_empty() => Ok(ValidatedCart {
            customer_id,
            payment_method,
            line_items,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(items: Vec<LineItemRequest>) -> CreateSale {
        CreateSale::new(1, "PAYPAL", items)
    }

    fn ctx_with(products: &[i64]) -> ValidationContext {
        ValidationContext::new(true, products.iter().copied().map(ProductId::new))
    }

    #[test]
    fn test_valid_cart_keeps_submitted_order() {
        let cmd = cart(vec![LineItemRequest::new(2, 1), LineItemRequest::new(1, 4)]);
        let validated = validate_cart(&cmd, &ctx_with(&[1, 2])).unwrap();

        assert_eq!(validated.payment_method, PaymentMethod::PayPal);
        assert_eq!(validated.line_items[0].product_id, ProductId::new(2));
        assert_eq!(validated.line_items[1].quantity, 4);
    }

    #[test]
    fn test_invalid_payment_method() {
        let mut cmd = cart(vec![LineItemRequest::new(1, 1)]);
        cmd.payment_method = "CASH".into();
        let errors = validate_cart(&cmd, &ctx_with(&[1])).unwrap_err();
        assert_eq!(
            errors.field("payment_method").unwrap(),
            ["invalid payment method"]
        );
    }

    #[test]
    fn test_unknown_customer() {
        let cmd = cart(vec![LineItemRequest::new(1, 1)]);
        let ctx = ValidationContext::new(false, [ProductId::new(1)]);
        let errors = validate_cart(&cmd, &ctx).unwrap_err();
        assert_eq!(errors.field("customer_id").unwrap(), ["customer not found"]);
    }

    #[test]
    fn test_empty_cart() {
        let errors = validate_cart(&cart(vec![]), &ctx_with(&[])).unwrap_err();
        assert_eq!(errors.field("line_items").unwrap(), ["empty cart"]);
    }

    #[test]
    fn test_line_item_errors_are_indexed() {
        let cmd = cart(vec![
            LineItemRequest::new(1, 1),
            LineItemRequest::new(99, 1),
            LineItemRequest::new(1, 0),
        ]);
        let errors = validate_cart(&cmd, &ctx_with(&[1])).unwrap_err();

        assert_eq!(
            errors.field("line_items[1].product_id").unwrap(),
            ["product not found"]
        );
        assert_eq!(
            errors.field("line_items[2].quantity").unwrap(),
            ["quantity must be at least 1"]
        );
        assert!(errors.field("line_items[0].product_id").is_none());
    }

    #[test]
    fn test_all_failures_are_reported_together() {
        let cmd = CreateSale::new(5, "GOLD", vec![LineItemRequest::new(3, -2)]);
        let ctx = ValidationContext::new(false, []);
        let errors = validate_cart(&cmd, &ctx).unwrap_err();

        assert!(errors.field("payment_method").is_some());
        assert!(errors.field("customer_id").is_some());
        assert!(errors.field("line_items[0].product_id").is_some());
        assert!(errors.field("line_items[0].quantity").is_some());
    }
}
