//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use store::{Customer, NewCustomer, Store};

use super::parse_key;
use crate::AppState;
use crate::error::ApiError;

/// GET /customers
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.customers.list().await?))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_key("customer", &id)?;
    Ok(Json(state.customers.get(id).await?))
}

/// POST /customers — registers a customer; `registered_at` is set here.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(customer) = body?;
    let customer = state.customers.create(customer).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /customers/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_key("customer", &id)?;
    let Json(customer) = body?;
    Ok(Json(state.customers.update(id, customer).await?))
}

/// DELETE /customers/{id} — their sales remain, without a customer.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_key("customer", &id)?;
    state.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
