use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, CustomerId, Money, ProductId, SaleId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Category, Customer, LineItemDetail, NewCategory, NewCustomer, NewLineItem, NewProduct,
    NewSale, Product, ProductView, Result, Sale, SaleDetail, SaleLineItem, StoreError,
    store::{Store, UnitOfWork},
};

/// Every row held by the in-memory store.
///
/// Comparing two snapshots with `==` tells whether anything at all changed
/// between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    customers: BTreeMap<CustomerId, Customer>,
    // insertion order
    sales: Vec<Sale>,
    line_items: BTreeMap<i64, SaleLineItem>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Sequences {
    category: i64,
    product: i64,
    customer: i64,
    line_item: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

impl Tables {
    /// Number of stored sales.
    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    /// Number of stored line items across all sales.
    pub fn line_item_count(&self) -> usize {
        self.line_items.len()
    }

    /// Returns a stored product.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    fn sale(&self, id: SaleId) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    fn product_view(&self, product: &Product) -> Result<ProductView> {
        let category = self
            .categories
            .get(&product.category_id)
            .ok_or_else(|| StoreError::not_found("category", product.category_id))?;
        Ok(ProductView {
            product: product.clone(),
            category: category.name.clone(),
        })
    }

    fn sale_detail(&self, sale: &Sale) -> Result<SaleDetail> {
        let line_items = self
            .line_items
            .values()
            .filter(|item| item.sale_id == sale.id)
            .map(|item| -> Result<LineItemDetail> {
                let product = self
                    .products
                    .get(&item.product_id)
                    .ok_or_else(|| StoreError::not_found("product", item.product_id))?;
                Ok(LineItemDetail::new(
                    self.product_view(product)?,
                    item.quantity,
                    item.unit_price,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SaleDetail {
            id: sale.id,
            customer: sale
                .customer_id
                .and_then(|id| self.customers.get(&id))
                .cloned(),
            created_at: sale.created_at,
            total: sale.total,
            status: sale.status,
            payment_method: sale.payment_method,
            line_items,
        })
    }

    fn ensure_category_name_free(&self, name: &str, except: Option<CategoryId>) -> Result<()> {
        let taken = self
            .categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except);
        if taken {
            return Err(StoreError::Constraint(format!(
                "category name '{name}' already exists"
            )));
        }
        Ok(())
    }

    fn ensure_email_free(&self, email: &str, except: Option<CustomerId>) -> Result<()> {
        let taken = self
            .customers
            .values()
            .any(|c| c.email == email && Some(c.id) != except);
        if taken {
            return Err(StoreError::Constraint(format!(
                "customer email '{email}' already exists"
            )));
        }
        Ok(())
    }

    fn check_product(&self, product: &NewProduct) -> Result<()> {
        if !self.categories.contains_key(&product.category_id) {
            return Err(StoreError::not_found("category", product.category_id));
        }
        if product.stock < 0 {
            return Err(StoreError::Constraint("product stock cannot be negative".into()));
        }
        if product.price.is_negative() {
            return Err(StoreError::Constraint("product price cannot be negative".into()));
        }
        Ok(())
    }

    fn insert_category(&mut self, new: NewCategory) -> Result<Category> {
        self.ensure_category_name_free(&new.name, None)?;
        let category = Category {
            id: CategoryId::new(next(&mut self.sequences.category)),
            name: new.name,
            description: new.description,
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn update_category(&mut self, id: CategoryId, new: NewCategory) -> Result<Category> {
        self.ensure_category_name_free(&new.name, Some(id))?;
        let category = self
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("category", id))?;
        category.name = new.name;
        category.description = new.description;
        Ok(category.clone())
    }

    fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        if !self.categories.contains_key(&id) {
            return Err(StoreError::not_found("category", id));
        }
        if self.products.values().any(|p| p.category_id == id) {
            return Err(StoreError::protected("category", id, "products"));
        }
        self.categories.remove(&id);
        Ok(())
    }

    fn insert_product(&mut self, new: NewProduct) -> Result<ProductView> {
        self.check_product(&new)?;
        let image_url = new.image_url_or_default();
        let product = Product {
            id: ProductId::new(next(&mut self.sequences.product)),
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            category_id: new.category_id,
            image_url: Some(image_url),
        };
        self.products.insert(product.id, product.clone());
        self.product_view(&product)
    }

    fn update_product(&mut self, id: ProductId, new: NewProduct) -> Result<ProductView> {
        self.check_product(&new)?;
        let image_url = new.image_url_or_default();
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        product.name = new.name;
        product.description = new.description;
        product.price = new.price;
        product.stock = new.stock;
        product.category_id = new.category_id;
        product.image_url = Some(image_url);
        let product = product.clone();
        self.product_view(&product)
    }

    fn delete_product(&mut self, id: ProductId) -> Result<()> {
        if !self.products.contains_key(&id) {
            return Err(StoreError::not_found("product", id));
        }
        if self.line_items.values().any(|item| item.product_id == id) {
            return Err(StoreError::protected("product", id, "sale line items"));
        }
        self.products.remove(&id);
        Ok(())
    }

    fn insert_customer(&mut self, new: NewCustomer) -> Result<Customer> {
        self.ensure_email_free(&new.email, None)?;
        let customer = Customer {
            id: CustomerId::new(next(&mut self.sequences.customer)),
            name: new.name,
            email: new.email,
            registered_at: Utc::now(),
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    fn update_customer(&mut self, id: CustomerId, new: NewCustomer) -> Result<Customer> {
        self.ensure_email_free(&new.email, Some(id))?;
        let customer = self
            .customers
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("customer", id))?;
        customer.name = new.name;
        customer.email = new.email;
        Ok(customer.clone())
    }

    fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        if self.customers.remove(&id).is_none() {
            return Err(StoreError::not_found("customer", id));
        }
        for sale in self.sales.iter_mut().filter(|s| s.customer_id == Some(id)) {
            sale.customer_id = None;
        }
        Ok(())
    }

    fn list_sales(&self) -> Result<Vec<SaleDetail>> {
        let mut sales: Vec<&Sale> = self.sales.iter().rev().collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sales.into_iter().map(|s| self.sale_detail(s)).collect()
    }
}

/// In-memory store implementation for tests and local development.
///
/// A unit of work holds the store's lock for its whole lifetime and writes to
/// a private copy of the tables, which replaces the shared tables on commit.
/// Units of work are therefore fully serialized.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored row.
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryUnitOfWork { guard, working })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.tables.lock().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category> {
        self.tables.lock().await.insert_category(category)
    }

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category> {
        self.tables.lock().await.update_category(id, category)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        self.tables.lock().await.delete_category(id)
    }

    async fn list_products(&self) -> Result<Vec<ProductView>> {
        let tables = self.tables.lock().await;
        tables
            .products
            .values()
            .map(|p| tables.product_view(p))
            .collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>> {
        let tables = self.tables.lock().await;
        tables
            .products
            .get(&id)
            .map(|p| tables.product_view(p))
            .transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductView> {
        self.tables.lock().await.insert_product(product)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<ProductView> {
        self.tables.lock().await.update_product(id, product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.tables.lock().await.delete_product(id)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.tables.lock().await.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.lock().await.customers.get(&id).cloned())
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        self.tables.lock().await.insert_customer(customer)
    }

    async fn update_customer(&self, id: CustomerId, customer: NewCustomer) -> Result<Customer> {
        self.tables.lock().await.update_customer(id, customer)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        self.tables.lock().await.delete_customer(id)
    }

    async fn list_sales(&self) -> Result<Vec<SaleDetail>> {
        self.tables.lock().await.list_sales()
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleDetail>> {
        let tables = self.tables.lock().await;
        tables.sale(id).map(|s| tables.sale_detail(s)).transpose()
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        // the whole store is already held by this unit of work
        Ok(self.working.products.get(&id).cloned())
    }

    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale> {
        if !self.working.customers.contains_key(&sale.customer_id) {
            return Err(StoreError::not_found("customer", sale.customer_id));
        }
        let sale = Sale {
            id: sale.id,
            customer_id: Some(sale.customer_id),
            created_at: Utc::now(),
            total: Money::zero(),
            status: sale.status,
            payment_method: sale.payment_method,
        };
        self.working.sales.push(sale.clone());
        Ok(sale)
    }

    async fn insert_line_item(&mut self, item: NewLineItem) -> Result<SaleLineItem> {
        if self.working.sale(item.sale_id).is_none() {
            return Err(StoreError::not_found("sale", item.sale_id));
        }
        if !self.working.products.contains_key(&item.product_id) {
            return Err(StoreError::not_found("product", item.product_id));
        }
        if item.quantity < 1 {
            return Err(StoreError::Constraint(
                "line item quantity must be at least 1".into(),
            ));
        }
        let line_item = SaleLineItem {
            id: next(&mut self.working.sequences.line_item),
            sale_id: item.sale_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        };
        self.working.line_items.insert(line_item.id, line_item.clone());
        Ok(line_item)
    }

    async fn set_product_stock(&mut self, id: ProductId, stock: i64) -> Result<()> {
        if stock < 0 {
            return Err(StoreError::Constraint("product stock cannot be negative".into()));
        }
        let product = self
            .working
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        product.stock = stock;
        Ok(())
    }

    async fn set_sale_total(&mut self, id: SaleId, total: Money) -> Result<()> {
        let sale = self
            .working
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("sale", id))?;
        sale.total = total;
        Ok(())
    }

    async fn load_sale(&mut self, id: SaleId) -> Result<Option<SaleDetail>> {
        self.working
            .sale(id)
            .map(|s| self.working.sale_detail(s))
            .transpose()
    }

    async fn commit(self) -> Result<()> {
        let InMemoryUnitOfWork { mut guard, working } = self;
        *guard = working;
        tracing::debug!("in-memory unit of work committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{PaymentMethod, SaleStatus};

    use super::*;

    async fn seeded() -> (InMemoryStore, Customer, ProductView) {
        let store = InMemoryStore::new();
        let category = store
            .insert_category(NewCategory {
                name: "Shirts".into(),
                description: None,
            })
            .await
            .unwrap();
        let product = store
            .insert_product(NewProduct::new(
                "Oxford shirt",
                Money::from_cents(2000),
                10,
                category.id,
            ))
            .await
            .unwrap();
        let customer = store
            .insert_customer(NewCustomer {
                name: "Ana Gomez".into(),
                email: "ana@example.com".into(),
            })
            .await
            .unwrap();
        (store, customer, product)
    }

    fn new_sale(customer_id: CustomerId) -> NewSale {
        NewSale {
            id: SaleId::new(),
            customer_id,
            status: SaleStatus::Paid,
            payment_method: PaymentMethod::Stripe,
        }
    }

    #[tokio::test]
    async fn committed_unit_of_work_is_visible() {
        let (store, customer, product) = seeded().await;
        let product_id = product.product.id;

        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(new_sale(customer.id)).await.unwrap();
        tx.insert_line_item(NewLineItem {
            sale_id: sale.id,
            product_id,
            quantity: 2,
            unit_price: Money::from_cents(2000),
        })
        .await
        .unwrap();
        tx.set_product_stock(product_id, 8).await.unwrap();
        tx.set_sale_total(sale.id, Money::from_cents(4000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let detail = store.get_sale(sale.id).await.unwrap().unwrap();
        assert_eq!(detail.total, Money::from_cents(4000));
        assert_eq!(detail.line_items.len(), 1);
        assert_eq!(detail.line_items[0].subtotal, Money::from_cents(4000));
        assert_eq!(detail.customer.unwrap().id, customer.id);

        let product = store.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.product.stock, 8);
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let (store, customer, product) = seeded().await;
        let before = store.snapshot().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_sale(new_sale(customer.id)).await.unwrap();
            tx.set_product_stock(product.product.id, 0).await.unwrap();
        }

        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn negative_stock_is_rejected() {
        let (store, _, product) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let result = tx.set_product_stock(product.product.id, -1).await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn category_with_products_is_protected() {
        let (store, _, product) = seeded().await;
        let result = store.delete_category(product.product.category_id).await;
        assert!(matches!(result, Err(StoreError::Protected { .. })));
    }

    #[tokio::test]
    async fn sold_product_is_protected() {
        let (store, customer, product) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(new_sale(customer.id)).await.unwrap();
        tx.insert_line_item(NewLineItem {
            sale_id: sale.id,
            product_id: product.product.id,
            quantity: 1,
            unit_price: product.product.price,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let result = store.delete_product(product.product.id).await;
        assert!(matches!(result, Err(StoreError::Protected { .. })));
    }

    #[tokio::test]
    async fn deleting_customer_keeps_sales_without_customer() {
        let (store, customer, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(new_sale(customer.id)).await.unwrap();
        tx.commit().await.unwrap();

        store.delete_customer(customer.id).await.unwrap();

        let detail = store.get_sale(sale.id).await.unwrap().unwrap();
        assert!(detail.customer.is_none());
    }

    #[tokio::test]
    async fn unique_names_and_emails() {
        let (store, _, product) = seeded().await;

        let dup_category = store
            .insert_category(NewCategory {
                name: product.category.clone(),
                description: None,
            })
            .await;
        assert!(matches!(dup_category, Err(StoreError::Constraint(_))));

        let dup_customer = store
            .insert_customer(NewCustomer {
                name: "Someone Else".into(),
                email: "ana@example.com".into(),
            })
            .await;
        assert!(matches!(dup_customer, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn customer_update_keeps_registration_time() {
        let (store, customer, _) = seeded().await;
        let updated = store
            .update_customer(
                customer.id,
                NewCustomer {
                    name: "Ana G.".into(),
                    email: "ana.g@example.com".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.registered_at, customer.registered_at);
        assert_eq!(updated.email, "ana.g@example.com");
    }

    #[tokio::test]
    async fn sales_are_listed_newest_first() {
        let (store, customer, _) = seeded().await;
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut tx = store.begin().await.unwrap();
            ids.push(tx.insert_sale(new_sale(customer.id)).await.unwrap().id);
            tx.commit().await.unwrap();
        }

        let listed: Vec<SaleId> = store
            .list_sales()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
