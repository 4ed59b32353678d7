//! Sale service: the order creation workflow and sale queries.

use std::collections::HashSet;
use std::time::Instant;

use common::{Money, SaleId};
use store::{NewLineItem, NewSale, SaleDetail, Store, UnitOfWork};

use crate::validation::{FieldError, ValidationErrors};

use super::{
    AssumePaid, CreateSale, PaymentConfirmation, PaymentIntent, SaleError, ValidatedCart,
    ValidationContext, validate_cart,
};

/// Creates and reads sales.
///
/// A sale is created in two phases. Validation reads existence facts from the
/// store and runs every rule, reporting all failures at once. The
/// transactional phase then re-reads and locks what it touches inside one unit
/// of work, so a sale is either written completely or not at all.
pub struct SaleService<S: Store, P: PaymentConfirmation = AssumePaid> {
    store: S,
    payments: P,
}

impl<S: Store> SaleService<S> {
    /// Creates a sale service that treats every sale as paid.
    pub fn new(store: S) -> Self {
        Self::with_payments(store, AssumePaid)
    }
}

impl<S: Store, P: PaymentConfirmation> SaleService<S, P> {
    pub fn with_payments(store: S, payments: P) -> Self {
        Self { store, payments }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates a cart and records it as a sale, decrementing stock.
    #[tracing::instrument(
        skip(self, cmd),
        fields(customer_id = %cmd.customer_id, line_items = cmd.line_items.len())
    )]
    pub async fn create_sale(&self, cmd: CreateSale) -> Result<SaleDetail, SaleError> {
        let started = Instant::now();
        let result = self.try_create_sale(&cmd).await;
        metrics::histogram!("sale_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(sale) => {
                metrics::counter!("sales_created_total").increment(1);
                metrics::counter!("sale_line_items_total").increment(sale.line_items.len() as u64);
                tracing::info!(
                    sale_id = %sale.id,
                    total = %sale.total,
                    payment_method = sale.payment_method.label(),
                    status = %sale.status,
                    "sale created"
                );
            }
            Err(err) => {
                metrics::counter!("sales_failed_total", "reason" => err.reason()).increment(1);
                match err {
                    SaleError::Store(_) => tracing::error!(error = %err, "sale creation failed"),
                    _ => tracing::warn!(reason = err.reason(), error = %err, "sale rejected"),
                }
            }
        }
        result
    }

    async fn try_create_sale(&self, cmd: &CreateSale) -> Result<SaleDetail, SaleError> {
        let ctx = self.validation_context(cmd).await?;
        let cart = validate_cart(cmd, &ctx)?;
        self.execute(cart).await
    }

    async fn validation_context(&self, cmd: &CreateSale) -> Result<ValidationContext, SaleError> {
        let customer_exists = self.store.customer_exists(cmd.customer_id).await?;

        let mut existing_products = HashSet::new();
        let mut seen = HashSet::new();
        for item in &cmd.line_items {
            if seen.insert(item.product_id) && self.store.product_exists(item.product_id).await? {
                existing_products.insert(item.product_id);
            }
        }

        Ok(ValidationContext {
            customer_exists,
            existing_products,
        })
    }

    /// Writes a validated cart. Every early return drops the unit of work,
    /// which discards its writes.
    async fn execute(&self, cart: ValidatedCart) -> Result<SaleDetail, SaleError> {
        let mut tx = self.store.begin().await?;

        let customer = tx
            .find_customer(cart.customer_id)
            .await?
            .ok_or_else(|| SaleError::not_found("customer", cart.customer_id))?;

        let sale_id = SaleId::new();
        let intent = PaymentIntent {
            sale_id,
            customer_id: customer.id,
            payment_method: cart.payment_method,
        };
        let status = self
            .payments
            .confirm(&intent)
            .await
            .map_err(|rejected| SaleError::PaymentRejected(rejected.0))?;
        if status.is_terminal() {
            return Err(SaleError::PaymentRejected(format!(
                "payment confirmation returned {status}"
            )));
        }

        tx.insert_sale(NewSale {
            id: sale_id,
            customer_id: customer.id,
            status,
            payment_method: cart.payment_method,
        })
        .await?;

        let mut total = Money::zero();
        for (index, line) in cart.line_items.iter().enumerate() {
            let product = tx
                .lock_product(line.product_id)
                .await?
                .ok_or_else(|| SaleError::not_found("product", line.product_id))?;

            if product.stock < line.quantity {
                return Err(SaleError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            total = product
                .price
                .checked_mul(line.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .filter(Money::is_storable)
                .ok_or_else(|| {
                    FieldError::new(
                        format!("line_items[{index}].quantity"),
                        format!("sale total cannot exceed {}", Money::MAX),
                    )
                })
                .map_err(ValidationErrors::from)?;

            tx.insert_line_item(NewLineItem {
                sale_id,
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
            })
            .await?;
            tx.set_product_stock(product.id, product.stock - line.quantity)
                .await?;
        }

        tx.set_sale_total(sale_id, total).await?;
        let sale = tx
            .load_sale(sale_id)
            .await?
            .ok_or_else(|| SaleError::not_found("sale", sale_id))?;
        tx.commit().await?;

        Ok(sale)
    }

    /// Lists every sale, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_sales(&self) -> Result<Vec<SaleDetail>, SaleError> {
        Ok(self.store.list_sales().await?)
    }

    /// Retrieves one sale.
    #[tracing::instrument(skip(self))]
    pub async fn get_sale(&self, id: SaleId) -> Result<SaleDetail, SaleError> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| SaleError::not_found("sale", id))
    }
}
