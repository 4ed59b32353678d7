//! Category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use store::{Category, NewCategory, Store};

use super::parse_key;
use crate::AppState;
use crate::error::ApiError;

/// GET /categories
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.catalog.list_categories().await?))
}

/// GET /categories/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_key("category", &id)?;
    Ok(Json(state.catalog.get_category(id).await?))
}

/// POST /categories
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<NewCategory>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(category) = body?;
    let category = state.catalog.create_category(category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /categories/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<NewCategory>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_key("category", &id)?;
    let Json(category) = body?;
    Ok(Json(state.catalog.update_category(id, category).await?))
}

/// DELETE /categories/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_key("category", &id)?;
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
