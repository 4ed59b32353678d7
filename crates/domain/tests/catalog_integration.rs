//! Integration tests for the catalog and customer services.

use common::Money;
use domain::{CatalogError, CatalogService, CreateSale, CustomerService, LineItemRequest, SaleService};
use store::{DEFAULT_IMAGE_URL, InMemoryStore, NewCategory, NewCustomer, NewProduct};

fn category(name: &str) -> NewCategory {
    NewCategory {
        name: name.into(),
        description: Some("Everyday wear".into()),
    }
}

#[tokio::test]
async fn test_product_lifecycle() {
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone());

    let shirts = catalog.create_category(category("Shirts")).await.unwrap();
    let created = catalog
        .create_product(
            NewProduct::new("Linen shirt", Money::from_cents(3990), 12, shirts.id)
                .with_description("Breathable"),
        )
        .await
        .unwrap();
    assert_eq!(created.category, "Shirts");
    assert_eq!(created.product.image_url.as_deref(), Some(DEFAULT_IMAGE_URL));

    let updated = catalog
        .update_product(
            created.product.id,
            NewProduct::new("Linen shirt", Money::from_cents(3490), 8, shirts.id)
                .with_image_url("https://cdn.example.com/linen.png"),
        )
        .await
        .unwrap();
    assert_eq!(updated.product.price, Money::from_cents(3490));
    assert_eq!(updated.product.stock, 8);
    assert_eq!(
        catalog.get_product(created.product.id).await.unwrap(),
        updated
    );

    catalog.delete_product(created.product.id).await.unwrap();
    assert!(matches!(
        catalog.get_product(created.product.id).await,
        Err(CatalogError::NotFound { .. })
    ));
    assert!(catalog.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let catalog = CatalogService::new(InMemoryStore::new());
    catalog.create_category(category("Shirts")).await.unwrap();

    let err = catalog.create_category(category("Shirts")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));
}

#[tokio::test]
async fn test_referenced_records_are_protected() {
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone());
    let customers = CustomerService::new(store.clone());
    let sales = SaleService::new(store.clone());

    let shirts = catalog.create_category(category("Shirts")).await.unwrap();
    let tee = catalog
        .create_product(NewProduct::new("Tee", Money::from_cents(1500), 5, shirts.id))
        .await
        .unwrap();
    let ana = customers
        .create(NewCustomer {
            name: "Ana".into(),
            email: "ana@example.com".into(),
        })
        .await
        .unwrap();
    let sale = sales
        .create_sale(CreateSale::new(
            ana.id,
            "PAYPAL",
            vec![LineItemRequest::new(tee.product.id, 1)],
        ))
        .await
        .unwrap();

    assert!(matches!(
        catalog.delete_category(shirts.id).await,
        Err(CatalogError::Conflict(_))
    ));
    assert!(matches!(
        catalog.delete_product(tee.product.id).await,
        Err(CatalogError::Conflict(_))
    ));

    customers.delete(ana.id).await.unwrap();
    let orphaned = sales.get_sale(sale.id).await.unwrap();
    assert!(orphaned.customer.is_none());
    assert_eq!(orphaned.line_items.len(), 1);
}

#[tokio::test]
async fn test_updating_missing_records_is_not_found() {
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone());
    let customers = CustomerService::new(store);

    let err = catalog
        .update_category(common::CategoryId::new(3), category("Hats"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));

    let err = customers
        .update(
            common::CustomerId::new(3),
            NewCustomer {
                name: "Nobody".into(),
                email: "nobody@example.com".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}
