//! Customer service.

use common::CustomerId;
use store::{Customer, NewCustomer, Store};
use validator::Validate;

use crate::error::CatalogError;
use crate::validation::ValidationErrors;

/// Customer registration and maintenance on top of a store.
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Customer>, CatalogError> {
        Ok(self.store.list_customers().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: CustomerId) -> Result<Customer, CatalogError> {
        self.store
            .get_customer(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                entity: "customer",
                id: id.to_string(),
            })
    }

    /// Registers a customer. Fails with `Conflict` if the email is taken.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, customer: NewCustomer) -> Result<Customer, CatalogError> {
        let customer = normalize(customer)?;
        let customer = self.store.insert_customer(customer).await?;
        tracing::info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    /// Replaces name and email. The registration timestamp never changes.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<Customer, CatalogError> {
        let customer = normalize(customer)?;
        Ok(self.store.update_customer(id, customer).await?)
    }

    /// Deletes a customer. Their sales are kept without a customer.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), CatalogError> {
        self.store.delete_customer(id).await?;
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}

fn normalize(customer: NewCustomer) -> Result<NewCustomer, ValidationErrors> {
    let customer = customer.trimmed();
    customer.validate()?;
    Ok(customer)
}
