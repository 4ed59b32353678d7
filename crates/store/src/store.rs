use async_trait::async_trait;
use common::{CategoryId, CustomerId, Money, ProductId, SaleId};

use crate::{
    Category, Customer, NewCategory, NewCustomer, NewLineItem, NewProduct, NewSale, Product,
    ProductView, Result, Sale, SaleDetail, SaleLineItem,
};

/// A scoped, all-or-nothing unit of work against the store.
///
/// Writes become visible to other callers only after [`UnitOfWork::commit`].
/// Dropping a unit of work without committing discards every write made
/// through it, so an early return with `?` always rolls back.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads a customer.
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>>;

    /// Reads a product and locks it until the unit of work ends, so that a
    /// stock check followed by a decrement cannot interleave with another
    /// unit of work touching the same product.
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a sale header with a zero total.
    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale>;

    /// Inserts a line item.
    async fn insert_line_item(&mut self, item: NewLineItem) -> Result<SaleLineItem>;

    /// Overwrites a product's stock. Negative stock is rejected.
    async fn set_product_stock(&mut self, id: ProductId, stock: i64) -> Result<()>;

    /// Overwrites a sale's total.
    async fn set_sale_total(&mut self, id: SaleId, total: Money) -> Result<()>;

    /// Loads a sale as seen from inside this unit of work.
    async fn load_sale(&mut self, id: SaleId) -> Result<Option<SaleDetail>>;

    /// Makes every write of this unit of work durable.
    async fn commit(self) -> Result<()>;
}

/// Core trait for store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Deletions follow the
/// referential rules of the data model: categories and products are protected
/// while referenced, deleting a customer clears the customer of their sales.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: UnitOfWork;

    /// Opens a unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Fails with `Constraint` if the name is taken.
    async fn insert_category(&self, category: NewCategory) -> Result<Category>;

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category>;

    /// Fails with `Protected` while products belong to the category.
    async fn delete_category(&self, id: CategoryId) -> Result<()>;

    async fn list_products(&self) -> Result<Vec<ProductView>>;

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>>;

    async fn insert_product(&self, product: NewProduct) -> Result<ProductView>;

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<ProductView>;

    /// Fails with `Protected` while any sale line item references the product.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    async fn list_customers(&self) -> Result<Vec<Customer>>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Fails with `Constraint` if the email is taken.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    /// Updates name and email; the registration timestamp is kept.
    async fn update_customer(&self, id: CustomerId, customer: NewCustomer) -> Result<Customer>;

    async fn delete_customer(&self, id: CustomerId) -> Result<()>;

    /// Lists sales, newest first.
    async fn list_sales(&self) -> Result<Vec<SaleDetail>>;

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleDetail>>;

    async fn customer_exists(&self, id: CustomerId) -> Result<bool> {
        Ok(self.get_customer(id).await?.is_some())
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool> {
        Ok(self.get_product(id).await?.is_some())
    }
}
