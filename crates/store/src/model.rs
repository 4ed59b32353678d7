//! Records persisted by the store.

use chrono::{DateTime, Utc};
use common::{CategoryId, CustomerId, Money, PaymentMethod, ProductId, SaleId, SaleStatus};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Image shown for products created without one.
pub const DEFAULT_IMAGE_URL: &str =
    "https://placehold.co/300x300/EBF4FF/6366F1?text=Producto&font=Inter";

/// A product category. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "ensure this field has no more than 100 characters")
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Units on hand, never negative.
    pub stock: i64,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

/// A product together with the name of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category: String,
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "ensure this field has no more than 200 characters")
    )]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "storable_price"))]
    pub price: Money,
    #[serde(default)]
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: i64,
    pub category_id: CategoryId,
    #[serde(default)]
    #[validate(
        url(message = "enter a valid URL"),
        length(max = 500, message = "ensure this field has no more than 500 characters")
    )]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Creates product fields with an empty description and the default image.
    pub fn new(name: impl Into<String>, price: Money, stock: i64, category_id: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            stock,
            category_id,
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Image URL to persist: the given one, or the placeholder.
    pub fn image_url_or_default(&self) -> String {
        self.image_url
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())
    }
}

/// A registered customer. Emails are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// Set by the store on insert and never changed afterwards.
    pub registered_at: DateTime<Utc>,
}

/// Fields for creating or updating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "ensure this field has no more than 200 characters")
    )]
    pub name: String,
    #[validate(
        email(message = "enter a valid email address"),
        length(max = 254, message = "ensure this field has no more than 254 characters")
    )]
    pub email: String,
}

impl NewCustomer {
    /// Strips surrounding whitespace from name and email.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("this field may not be blank".into()));
    }
    Ok(())
}

fn storable_price(price: &Money) -> Result<(), ValidationError> {
    if price.is_negative() {
        return Err(
            ValidationError::new("negative").with_message("price cannot be negative".into())
        );
    }
    if !price.is_storable() {
        return Err(ValidationError::new("max_digits").with_message(
            "ensure there are no more than 10 digits in total".into(),
        ));
    }
    Ok(())
}

/// Header of a sale, without its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// Cleared when the customer is deleted.
    pub customer_id: Option<CustomerId>,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
}

/// Fields for inserting a sale header. The total always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub id: SaleId,
    pub customer_id: CustomerId,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
}

/// One product line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineItem {
    pub id: i64,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Product price at the time of sale.
    pub unit_price: Money,
}

impl SaleLineItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Fields for inserting a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A line item with its product expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDetail {
    pub product: ProductView,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl LineItemDetail {
    pub fn new(product: ProductView, quantity: i64, unit_price: Money) -> Self {
        Self {
            product,
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// A fully materialized sale: header, customer and expanded line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetail {
    pub id: SaleId,
    pub customer: Option<Customer>,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub line_items: Vec<LineItemDetail>,
}
