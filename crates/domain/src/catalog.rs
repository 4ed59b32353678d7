//! Catalog service: categories and products.

use common::{CategoryId, ProductId};
use store::{Category, NewCategory, NewProduct, ProductView, Store};
use validator::Validate;

use crate::error::CatalogError;
use crate::validation::{FieldError, ValidationErrors};

/// Category and product management on top of a store.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| not_found("category", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, category: NewCategory) -> Result<Category, CatalogError> {
        category.validate().map_err(ValidationErrors::from)?;
        let category = self.store.insert_category(category).await?;
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        category: NewCategory,
    ) -> Result<Category, CatalogError> {
        category.validate().map_err(ValidationErrors::from)?;
        Ok(self.store.update_category(id, category).await?)
    }

    /// Fails with `Conflict` while products belong to the category.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.store.delete_category(id).await?;
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductView>, CatalogError> {
        Ok(self.store.list_products().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, CatalogError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| not_found("product", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, product: NewProduct) -> Result<ProductView, CatalogError> {
        self.validate_product(&product).await?;
        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = %product.product.id, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<ProductView, CatalogError> {
        self.validate_product(&product).await?;
        Ok(self.store.update_product(id, product).await?)
    }

    /// Fails with `Conflict` once the product appears on a sale.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn validate_product(&self, product: &NewProduct) -> Result<(), CatalogError> {
        let mut errors = ValidationErrors::new();
        errors.absorb(product.validate());
        if self.store.get_category(product.category_id).await?.is_none() {
            errors.push(FieldError::new("category_id", "category not found"));
        }
        Ok(errors.finish(|| ())?)
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> CatalogError {
    CatalogError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use common::Money;
    use store::InMemoryStore;

    use super::*;

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_category_name_is_required_and_bounded() {
        let catalog = CatalogService::new(InMemoryStore::new());

        let err = catalog.create_category(category("  ")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = catalog
            .create_category(category(&"x".repeat(101)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        assert!(catalog.create_category(category(&"x".repeat(100))).await.is_ok());
    }

    #[tokio::test]
    async fn test_product_rules_are_reported_together() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let product = NewProduct::new("", Money::from_cents(-1), -3, CategoryId::new(42));

        let Err(CatalogError::Validation(errors)) = catalog.create_product(product).await else {
            panic!("expected validation failure");
        };
        assert!(errors.field("name").is_some());
        assert_eq!(errors.field("price").unwrap(), ["price cannot be negative"]);
        assert_eq!(errors.field("stock").unwrap(), ["stock cannot be negative"]);
        assert_eq!(errors.field("category_id").unwrap(), ["category not found"]);
    }

    #[tokio::test]
    async fn test_price_is_bounded_by_column_precision() {
        let catalog = CatalogService::new(InMemoryStore::new());
        let shirts = catalog.create_category(category("Shirts")).await.unwrap();

        let too_expensive = Money::from_cents(10_000_000_000);
        let Err(CatalogError::Validation(errors)) = catalog
            .create_product(NewProduct::new("Shirt", too_expensive, 100, shirts.id))
            .await
        else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.field("price").unwrap(),
            ["ensure there are no more than 10 digits in total"]
        );

        let product = catalog
            .create_product(NewProduct::new("Shirt", Money::MAX, 100, shirts.id))
            .await
            .unwrap();
        assert_eq!(product.product.price, Money::MAX);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let catalog = CatalogService::new(InMemoryStore::new());
        assert!(matches!(
            catalog.get_category(CategoryId::new(7)).await,
            Err(CatalogError::NotFound { entity: "category", .. })
        ));
        assert!(matches!(
            catalog.get_product(ProductId::new(7)).await,
            Err(CatalogError::NotFound { entity: "product", .. })
        ));
    }
}
