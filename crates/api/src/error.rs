//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, SaleError, ValidationErrors};

const INTERNAL_MESSAGE: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request fields that failed to parse, keyed by field path.
    Validation(ValidationErrors),
    /// Sale workflow error.
    Sale(SaleError),
    /// Catalog or customer error.
    Catalog(CatalogError),
    /// Internal server error.
    Internal(String),
}

/// Status, message and optional per-field failures of an error response.
struct Failure {
    status: StatusCode,
    message: String,
    fields: Option<ValidationErrors>,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: None,
        }
    }

    fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "validation failed".to_string(),
            fields: Some(errors),
        }
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal server error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = match self {
            ApiError::NotFound(msg) => Failure::new(StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => Failure::new(StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(errors) => Failure::validation(errors),
            ApiError::Sale(err) => sale_failure(err),
            ApiError::Catalog(err) => catalog_failure(err),
            ApiError::Internal(msg) => Failure::internal(msg),
        };

        let body = match failure.fields {
            Some(fields) => serde_json::json!({ "error": failure.message, "fields": fields }),
            None => serde_json::json!({ "error": failure.message }),
        };
        (failure.status, axum::Json(body)).into_response()
    }
}

fn sale_failure(err: SaleError) -> Failure {
    match err {
        SaleError::Validation(errors) => Failure::validation(errors),
        SaleError::NotFound { .. } => Failure::new(StatusCode::NOT_FOUND, err.to_string()),
        SaleError::InsufficientStock { .. } => {
            Failure::new(StatusCode::BAD_REQUEST, err.to_string())
        }
        SaleError::PaymentRejected(_) => Failure::new(StatusCode::PAYMENT_REQUIRED, err.to_string()),
        SaleError::Store(_) => Failure::internal(err),
    }
}

fn catalog_failure(err: CatalogError) -> Failure {
    match err {
        CatalogError::Validation(errors) => Failure::validation(errors),
        CatalogError::NotFound { .. } => Failure::new(StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::Conflict(_) => Failure::new(StatusCode::CONFLICT, err.to_string()),
        CatalogError::Store(_) => Failure::internal(err),
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        ApiError::Sale(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
