//! Sale status state machine and accepted payment methods.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// The state of a sale in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Paid ──► Shipped
///    │          │
///    └──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Recorded but payment not confirmed.
    #[default]
    Pending,

    /// Payment confirmed.
    Paid,

    /// Handed to the carrier (terminal state).
    Shipped,

    /// Sale was cancelled (terminal state).
    Cancelled,
}

impl SaleStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Pending,
        SaleStatus::Paid,
        SaleStatus::Shipped,
        SaleStatus::Cancelled,
    ];

    /// Returns true if this is a terminal state. A new sale never starts in one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Shipped | SaleStatus::Cancelled)
    }

    /// Returns the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Paid => "PAID",
            SaleStatus::Shipped => "SHIPPED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnumError {
                kind: "sale status",
                value: s.to_string(),
            })
    }
}

/// Payment methods a cart may be settled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "PAYPAL")]
    PayPal,
    #[serde(rename = "STRIPE")]
    Stripe,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::PayPal, PaymentMethod::Stripe];

    /// Returns the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayPal => "PAYPAL",
            PaymentMethod::Stripe => "STRIPE",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::Stripe => "Stripe",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "payment method",
                value: s.to_string(),
            })
    }
}
