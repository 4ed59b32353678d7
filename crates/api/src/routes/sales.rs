//! Sale endpoints: the order creation workflow and read-only sale queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::SaleId;
use domain::{CreateSale, FieldError, LineItemRequest, ValidationErrors};
use serde::Deserialize;
use serde_json::Value;
use store::{SaleDetail, Store};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /sales`.
///
/// Fields stay untyped until [`CreateSale::try_from`] so that every malformed
/// field is reported at its path instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub customer_id: Value,
    #[serde(default)]
    pub payment_method: Value,
    #[serde(default)]
    pub line_items: Value,
}

const REQUIRED: &str = "this field is required";
const NOT_AN_INTEGER: &str = "a valid integer is required";

impl TryFrom<CreateSaleRequest> for CreateSale {
    type Error = ValidationErrors;

    fn try_from(req: CreateSaleRequest) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();
        let customer_id = errors.check(integer("customer_id", &req.customer_id));
        let payment_method = errors.check(text("payment_method", &req.payment_method));
        let lines = errors.check(raw_lines(&req.line_items)).map(|lines| {
            lines
                .into_iter()
                .filter_map(|(product_id, quantity)| {
                    let product_id = errors.check(product_id);
                    let quantity = errors.check(quantity);
                    Some(LineItemRequest::new(product_id?, quantity?))
                })
                .collect::<Vec<_>>()
        });

        match (customer_id, payment_method, lines) {
            (Some(customer_id), Some(payment_method), Some(lines)) if errors.is_empty() => {
                Ok(CreateSale::new(customer_id, payment_method, lines))
            }
            _ => Err(errors),
        }
    }
}

type RawLine = (Result<i64, FieldError>, Result<i64, FieldError>);

const NULL: &Value = &Value::Null;

/// Splits the cart into per-line fields. A missing cart is an empty one.
fn raw_lines(value: &Value) -> Result<Vec<RawLine>, FieldError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => return Err(FieldError::new("line_items", "expected a list of items")),
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            (
                integer(
                    &format!("line_items[{i}].product_id"),
                    item.get("product_id").unwrap_or(NULL),
                ),
                integer(
                    &format!("line_items[{i}].quantity"),
                    item.get("quantity").unwrap_or(NULL),
                ),
            )
        })
        .collect())
}

/// Accepts a JSON integer or a string holding one.
fn integer(field: &str, value: &Value) -> Result<i64, FieldError> {
    match value {
        Value::Null => Err(FieldError::new(field, REQUIRED)),
        Value::Number(n) => n.as_i64().ok_or_else(|| FieldError::new(field, NOT_AN_INTEGER)),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| FieldError::new(field, NOT_AN_INTEGER)),
        _ => Err(FieldError::new(field, NOT_AN_INTEGER)),
    }
}

fn text(field: &str, value: &Value) -> Result<String, FieldError> {
    match value {
        Value::Null => Err(FieldError::new(field, REQUIRED)),
        Value::String(s) => Ok(s.clone()),
        _ => Err(FieldError::new(field, "a valid string is required")),
    }
}

// -- Handlers --

/// GET /sales — newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<SaleDetail>>, ApiError> {
    Ok(Json(state.sales.list_sales().await?))
}

/// GET /sales/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    let id: SaleId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid sale id: {e}")))?;
    Ok(Json(state.sales.get_sale(id).await?))
}

/// POST /sales — validates the cart and records the sale.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleDetail>), ApiError> {
    let Json(req) = body?;
    let cmd = CreateSale::try_from(req)?;
    let sale = state.sales.create_sale(cmd).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
