//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, PaymentMethod, SaleId, SaleStatus};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    NewCategory, NewCustomer, NewLineItem, NewProduct, NewSale, PostgresStore, Store, StoreError,
    UnitOfWork,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE sale_line_items, sales, products, categories, customers RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

async fn seed(store: &PostgresStore) -> (store::Customer, store::ProductView) {
    let category = store
        .insert_category(NewCategory {
            name: "Jeans".into(),
            description: Some("Denim".into()),
        })
        .await
        .unwrap();
    let product = store
        .insert_product(
            NewProduct::new("Slim jeans", "20.00".parse().unwrap(), 10, category.id)
                .with_description("Dark wash"),
        )
        .await
        .unwrap();
    let customer = store
        .insert_customer(NewCustomer {
            name: "Bruno Diaz".into(),
            email: "bruno@example.com".into(),
        })
        .await
        .unwrap();
    (customer, product)
}

#[tokio::test]
#[serial]
async fn catalog_round_trip() {
    let store = get_test_store().await;
    let (_, product) = seed(&store).await;

    assert_eq!(product.category, "Jeans");
    assert_eq!(product.product.price.to_string(), "20.00");
    assert!(product.product.image_url.is_some());

    let loaded = store.get_product(product.product.id).await.unwrap().unwrap();
    assert_eq!(loaded, product);

    let listed = store.list_products().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[serial]
async fn committed_sale_is_materialized() {
    let store = get_test_store().await;
    let (customer, product) = seed(&store).await;
    let product_id = product.product.id;

    let mut tx = store.begin().await.unwrap();
    let sale = tx
        .insert_sale(NewSale {
            id: SaleId::new(),
            customer_id: customer.id,
            status: SaleStatus::Paid,
            payment_method: PaymentMethod::PayPal,
        })
        .await
        .unwrap();
    assert_eq!(sale.total, Money::zero());

    let locked = tx.lock_product(product_id).await.unwrap().unwrap();
    tx.insert_line_item(NewLineItem {
        sale_id: sale.id,
        product_id,
        quantity: 3,
        unit_price: locked.price,
    })
    .await
    .unwrap();
    tx.set_product_stock(product_id, locked.stock - 3).await.unwrap();
    tx.set_sale_total(sale.id, locked.price.multiply(3))
        .await
        .unwrap();
    let inside = tx.load_sale(sale.id).await.unwrap().unwrap();
    tx.commit().await.unwrap();

    let outside = store.get_sale(sale.id).await.unwrap().unwrap();
    assert_eq!(inside, outside);
    assert_eq!(outside.total, Money::from_cents(6000));
    assert_eq!(outside.status, SaleStatus::Paid);
    assert_eq!(outside.line_items.len(), 1);
    assert_eq!(outside.line_items[0].subtotal, Money::from_cents(6000));

    let product = store.get_product(product_id).await.unwrap().unwrap();
    assert_eq!(product.product.stock, 7);
}

#[tokio::test]
#[serial]
async fn dropped_unit_of_work_rolls_back() {
    let store = get_test_store().await;
    let (customer, product) = seed(&store).await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.insert_sale(NewSale {
            id: SaleId::new(),
            customer_id: customer.id,
            status: SaleStatus::Paid,
            payment_method: PaymentMethod::Stripe,
        })
        .await
        .unwrap();
        tx.set_product_stock(product.product.id, 0).await.unwrap();
    }

    assert!(store.list_sales().await.unwrap().is_empty());
    let product = store.get_product(product.product.id).await.unwrap().unwrap();
    assert_eq!(product.product.stock, 10);
}

#[tokio::test]
#[serial]
async fn stock_check_constraint_rejects_negative_stock() {
    let store = get_test_store().await;
    let (_, product) = seed(&store).await;

    let mut tx = store.begin().await.unwrap();
    let result = tx.set_product_stock(product.product.id, -1).await;
    assert!(matches!(result, Err(StoreError::Constraint(_))));
}

#[tokio::test]
#[serial]
async fn referential_rules() {
    let store = get_test_store().await;
    let (customer, product) = seed(&store).await;

    let result = store.delete_category(product.product.category_id).await;
    assert!(matches!(result, Err(StoreError::Protected { .. })));

    let mut tx = store.begin().await.unwrap();
    let sale = tx
        .insert_sale(NewSale {
            id: SaleId::new(),
            customer_id: customer.id,
            status: SaleStatus::Paid,
            payment_method: PaymentMethod::Stripe,
        })
        .await
        .unwrap();
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

    store.delete_customer(customer.id).await.unwrap();
    let sale = store.get_sale(sale.id).await.unwrap().unwrap();
    assert!(sale.customer.is_none());
    assert_eq!(sale.line_items.len(), 1);
}

#[tokio::test]
#[serial]
async fn unique_constraints_surface_as_constraint_errors() {
    let store = get_test_store().await;
    seed(&store).await;

    let result = store
        .insert_category(NewCategory {
            name: "Jeans".into(),
            description: None,
        })
        .await;
    assert!(matches!(result, Err(StoreError::Constraint(_))));

    let result = store
        .insert_customer(NewCustomer {
            name: "Impostor".into(),
            email: "bruno@example.com".into(),
        })
        .await;
    assert!(matches!(result, Err(StoreError::Constraint(_))));
}
