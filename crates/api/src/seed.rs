//! Demo data for a fresh clothing-store catalog.

use common::Money;
use store::{NewCategory, NewCustomer, NewProduct, Store, StoreError};

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Tops", &["T-Shirts", "Shirts", "Blouses", "Jackets", "Hoodies"]),
    ("Bottoms", &["Trousers", "Jeans", "Shorts", "Skirts"]),
    ("Footwear", &["Sneakers", "Dress Shoes", "Boots", "Sandals"]),
    ("Accessories", &["Hats", "Belts", "Scarves", "Sunglasses"]),
];

const MODELS: &[&str] = &["Alpha", "Beta", "Gamma", "Delta"];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ana Gomez", "ana.gomez@example.com"),
    ("Bruno Diaz", "bruno.diaz@example.com"),
    ("Carla Mora", "carla.mora@example.com"),
    ("Daniel Soto", "daniel.soto@example.com"),
    ("Elena Vargas", "elena.vargas@example.com"),
    ("Felipe Rios", "felipe.rios@example.com"),
];

/// What [`seed_demo_data`] inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub customers: usize,
}

/// Fills an empty store with categories, products and customers.
///
/// Does nothing if any category already exists. Prices and stock levels are
/// derived from the position in the catalog, so every run yields the same data.
#[tracing::instrument(skip(store))]
pub async fn seed_demo_data<S: Store>(store: &S) -> Result<SeedSummary, StoreError> {
    if !store.list_categories().await?.is_empty() {
        tracing::info!("store already has a catalog, skipping demo data");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    for (name, email) in CUSTOMERS {
        store
            .insert_customer(NewCustomer {
                name: (*name).to_string(),
                email: (*email).to_string(),
            })
            .await?;
        summary.customers += 1;
    }

    let mut position: i64 = 0;
    for (department, categories) in CATEGORIES {
        for name in *categories {
            let category = store
                .insert_category(NewCategory {
                    name: (*name).to_string(),
                    description: Some(format!("{department}: {name}")),
                })
                .await?;
            summary.categories += 1;

            for model in MODELS.iter().take(3 + (position as usize % 2)) {
                position += 1;
                let product_name = format!("{name} Model {model} {}", 100 + position * 37 % 900);
                // 19.99 to 149.99
                let price = Money::from_cents(1999 + (position * 2731) % 13001);
                let stock = 10 + (position * 13) % 91;
                store
                    .insert_product(
                        NewProduct::new(&product_name, price, stock, category.id).with_description(
                            format!("A {product_name} made with quality materials."),
                        ),
                    )
                    .await?;
                summary.products += 1;
            }
        }
    }

    tracing::info!(
        categories = summary.categories,
        products = summary.products,
        customers = summary.customers,
        "demo data loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_seeds_empty_store_once() {
        let store = InMemoryStore::new();

        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(first.categories, 17);
        assert_eq!(first.customers, 6);
        assert!(first.products >= 3 * 17);

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), first.products);
        assert!(products.iter().all(|p| {
            let price = p.product.price;
            price >= Money::from_cents(1999) && price <= Money::from_cents(14999)
        }));
        assert!(products.iter().all(|p| (10..=100).contains(&p.product.stock)));

        let second = seed_demo_data(&store).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(store.list_products().await.unwrap().len(), first.products);
    }
}
