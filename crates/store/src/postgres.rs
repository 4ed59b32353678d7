use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, CustomerId, Money, ProductId, SaleId};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Category, Customer, LineItemDetail, NewCategory, NewCustomer, NewLineItem, NewProduct,
    NewSale, Product, ProductView, Result, Sale, SaleDetail, SaleLineItem, StoreError,
    store::{Store, UnitOfWork},
};

const PRODUCT_VIEW_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.stock, \
     p.category_id, p.image_url, c.name AS category_name";

const SALE_COLUMNS: &str = "id, customer_id, created_at, total, status, payment_method";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn parse<T>(value: String) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::Decode(e.to_string()))
}

fn money(row: &PgRow, column: &str) -> Result<Money> {
    Ok(Money::new(row.try_get::<Decimal, _>(column)?))
}

fn row_to_category(row: &PgRow) -> Result<Category> {
    Ok(Category {
        id: CategoryId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: money(row, "price")?,
        stock: row.try_get("stock")?,
        category_id: CategoryId::new(row.try_get("category_id")?),
        image_url: row.try_get("image_url")?,
    })
}

fn row_to_product_view(row: &PgRow) -> Result<ProductView> {
    Ok(ProductView {
        product: row_to_product(row)?,
        category: row.try_get("category_name")?,
    })
}

fn row_to_customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        registered_at: row.try_get::<DateTime<Utc>, _>("registered_at")?,
    })
}

fn row_to_sale(row: &PgRow) -> Result<Sale> {
    Ok(Sale {
        id: SaleId::from_uuid(row.try_get::<Uuid, _>("id")?),
        customer_id: row.try_get::<Option<i64>, _>("customer_id")?.map(CustomerId::new),
        created_at: row.try_get("created_at")?,
        total: money(row, "total")?,
        status: parse(row.try_get("status")?)?,
        payment_method: parse(row.try_get("payment_method")?)?,
    })
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Maps unique and check violations to [`StoreError::Constraint`].
fn constraint_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && (db_err.is_unique_violation() || db_err.is_check_violation())
    {
        let message = match db_err.constraint() {
            Some(constraint) => format!("{constraint}: {}", db_err.message()),
            None => db_err.message().to_string(),
        };
        return StoreError::Constraint(message);
    }
    StoreError::Database(err)
}

/// Loads sales with their customers and line items, newest first.
///
/// With `only` set, at most that one sale is returned.
async fn fetch_sales(conn: &mut PgConnection, only: Option<SaleId>) -> Result<Vec<SaleDetail>> {
    let header_rows = sqlx::query(
        r#"
        SELECT s.id, s.customer_id, s.created_at, s.total, s.status, s.payment_method,
               cu.name AS customer_name, cu.email AS customer_email,
               cu.registered_at AS customer_registered_at
        FROM sales s
        LEFT JOIN customers cu ON cu.id = s.customer_id
        WHERE ($1::uuid IS NULL OR s.id = $1)
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(only.map(|id| id.as_uuid()))
    .fetch_all(&mut *conn)
    .await?;

    if header_rows.is_empty() {
        return Ok(Vec::new());
    }

    let sale_ids: Vec<Uuid> = header_rows
        .iter()
        .map(|row| row.try_get::<Uuid, _>("id"))
        .collect::<std::result::Result<_, _>>()?;

    let item_rows = sqlx::query(&format!(
        r#"
        SELECT li.sale_id, li.quantity, li.unit_price, {PRODUCT_VIEW_COLUMNS}
        FROM sale_line_items li
        JOIN products p ON p.id = li.product_id
        JOIN categories c ON c.id = p.category_id
        WHERE li.sale_id = ANY($1)
        ORDER BY li.id ASC
        "#
    ))
    .bind(sale_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items_by_sale: HashMap<Uuid, Vec<LineItemDetail>> = HashMap::new();
    for row in &item_rows {
        let detail = LineItemDetail::new(
            row_to_product_view(row)?,
            row.try_get("quantity")?,
            money(row, "unit_price")?,
        );
        items_by_sale
            .entry(row.try_get("sale_id")?)
            .or_default()
            .push(detail);
    }

    header_rows
        .iter()
        .map(|row| -> Result<SaleDetail> {
            let sale = row_to_sale(row)?;
            let customer = match sale.customer_id {
                Some(id) => Some(Customer {
                    id,
                    name: row.try_get("customer_name")?,
                    email: row.try_get("customer_email")?,
                    registered_at: row.try_get("customer_registered_at")?,
                }),
                None => None,
            };
            Ok(SaleDetail {
                id: sale.id,
                customer,
                created_at: sale.created_at,
                total: sale.total,
                status: sale.status,
                payment_method: sale.payment_method,
                line_items: items_by_sale.remove(&sale.id.as_uuid()).unwrap_or_default(),
            })
        })
        .collect()
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresUnitOfWork;

    async fn begin(&self) -> Result<PostgresUnitOfWork> {
        Ok(PostgresUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_category).collect()
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_category).transpose()
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category> {
        let row = sqlx::query(
            "INSERT INTO categories (name, description) VALUES ($1, $2) \
             RETURNING id, name, description",
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_violation)?;
        row_to_category(&row)
    }

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category> {
        let row = sqlx::query(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id.as_i64())
        .bind(&category.name)
        .bind(&category.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_violation)?
        .ok_or_else(|| StoreError::not_found("category", id))?;
        row_to_category(&row)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::protected("category", id, "products")
                } else {
                    StoreError::Database(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<ProductView>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_VIEW_COLUMNS} FROM products p \
             JOIN categories c ON c.id = p.category_id ORDER BY p.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product_view).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_VIEW_COLUMNS} FROM products p \
             JOIN categories c ON c.id = p.category_id WHERE p.id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product_view).transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductView> {
        let image_url = product.image_url_or_default();
        let row = sqlx::query(&format!(
            r#"
            WITH p AS (
                INSERT INTO products (name, description, price, stock, category_id, image_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {PRODUCT_VIEW_COLUMNS} FROM p JOIN categories c ON c.id = p.category_id
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.category_id.as_i64())
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found("category", product.category_id)
            } else {
                constraint_violation(e)
            }
        })?;
        row_to_product_view(&row)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<ProductView> {
        let image_url = product.image_url_or_default();
        let row = sqlx::query(&format!(
            r#"
            WITH p AS (
                UPDATE products
                SET name = $2, description = $3, price = $4, stock = $5,
                    category_id = $6, image_url = $7
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_VIEW_COLUMNS} FROM p JOIN categories c ON c.id = p.category_id
            "#
        ))
        .bind(id.as_i64())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.category_id.as_i64())
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found("category", product.category_id)
            } else {
                constraint_violation(e)
            }
        })?
        .ok_or_else(|| StoreError::not_found("product", id))?;
        row_to_product_view(&row)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::protected("product", id, "sale line items")
                } else {
                    StoreError::Database(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows =
            sqlx::query("SELECT id, name, email, registered_at FROM customers ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(row_to_customer).collect()
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, email, registered_at FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query(
            "INSERT INTO customers (name, email) VALUES ($1, $2) \
             RETURNING id, name, email, registered_at",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_violation)?;
        row_to_customer(&row)
    }

    async fn update_customer(&self, id: CustomerId, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query(
            "UPDATE customers SET name = $2, email = $3 WHERE id = $1 \
             RETURNING id, name, email, registered_at",
        )
        .bind(id.as_i64())
        .bind(&customer.name)
        .bind(&customer.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_violation)?
        .ok_or_else(|| StoreError::not_found("customer", id))?;
        row_to_customer(&row)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        // sales.customer_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", id));
        }
        Ok(())
    }

    async fn list_sales(&self) -> Result<Vec<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sales(&mut conn, None).await
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_sales(&mut conn, Some(id)).await?.pop())
    }

    async fn customer_exists(&self, id: CustomerId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

/// Unit of work over a PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, email, registered_at FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, stock, category_id, image_url \
             FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale> {
        let row = sqlx::query(&format!(
            "INSERT INTO sales (id, customer_id, status, payment_method) \
             VALUES ($1, $2, $3, $4) RETURNING {SALE_COLUMNS}"
        ))
        .bind(sale.id.as_uuid())
        .bind(sale.customer_id.as_i64())
        .bind(sale.status.as_str())
        .bind(sale.payment_method.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found("customer", sale.customer_id)
            } else {
                constraint_violation(e)
            }
        })?;
        row_to_sale(&row)
    }

    async fn insert_line_item(&mut self, item: NewLineItem) -> Result<SaleLineItem> {
        let row = sqlx::query(
            "INSERT INTO sale_line_items (sale_id, product_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(item.sale_id.as_uuid())
        .bind(item.product_id.as_i64())
        .bind(item.quantity)
        .bind(item.unit_price.amount())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found("product", item.product_id)
            } else {
                constraint_violation(e)
            }
        })?;

        Ok(SaleLineItem {
            id: row.try_get("id")?,
            sale_id: item.sale_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
    }

    async fn set_product_stock(&mut self, id: ProductId, stock: i64) -> Result<()> {
        let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(stock)
            .execute(&mut *self.tx)
            .await
            .map_err(constraint_violation)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    async fn set_sale_total(&mut self, id: SaleId, total: Money) -> Result<()> {
        let result = sqlx::query("UPDATE sales SET total = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(total.amount())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("sale", id));
        }
        Ok(())
    }

    async fn load_sale(&mut self, id: SaleId) -> Result<Option<SaleDetail>> {
        Ok(fetch_sales(&mut self.tx, Some(id)).await?.pop())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
