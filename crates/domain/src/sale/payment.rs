//! Payment confirmation seam.

use async_trait::async_trait;
use common::{CustomerId, PaymentMethod, SaleId, SaleStatus};
use thiserror::Error;

/// What the payment collaborator is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub sale_id: SaleId,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
}

/// The payment was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PaymentRejected(pub String);

/// Decides the initial status of a sale before anything is written.
#[async_trait]
pub trait PaymentConfirmation: Send + Sync {
    async fn confirm(&self, intent: &PaymentIntent) -> Result<SaleStatus, PaymentRejected>;
}

/// Trusts the caller that payment already succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumePaid;

#[async_trait]
impl PaymentConfirmation for AssumePaid {
    async fn confirm(&self, _intent: &PaymentIntent) -> Result<SaleStatus, PaymentRejected> {
        Ok(SaleStatus::Paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assume_paid_confirms_every_method() {
        for payment_method in PaymentMethod::ALL {
            let intent = PaymentIntent {
                sale_id: SaleId::new(),
                customer_id: CustomerId::new(1),
                payment_method,
            };
            assert_eq!(AssumePaid.confirm(&intent).await, Ok(SaleStatus::Paid));
        }
    }
}
