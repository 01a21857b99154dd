use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::ProductInput;
use crate::error::ApiError;
use crate::filter::Projection;
use crate::middleware::{AdminOnly, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::{present, NOT_FOUND};

/// GET /api/products/:id - single product with its category populated
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let mut product = state
        .store
        .find_by_id(Collection::Products, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let projection = Projection::default();
    projection.apply(&mut product);
    let product = present::populate(&state, vec![product], &projection)
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(json!({ "product": product })))
}

/// PUT /api/products/:id - complete replacement
pub async fn put(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Value> {
    let replacement = input.into_document()?;
    let product = state
        .store
        .update_by_id(Collection::Products, &id, replacement)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, product = %id, "product replaced");

    Ok(ApiResponse::success(json!({ "product": present::present(product) })))
}

/// PATCH /api/products/:id - partial update of the supplied fields
pub async fn patch(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Value> {
    let changes = input.into_changes()?;
    let product = state
        .store
        .update_by_id(Collection::Products, &id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, product = %id, "product updated");

    Ok(ApiResponse::success(json!({ "product": present::present(product) })))
}

/// DELETE /api/products/:id - 204 with an empty body
pub async fn delete(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state
        .store
        .delete_by_id(Collection::Products, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, product = %id, "product deleted");

    Ok(ApiResponse::no_content())
}

/// HEAD /api/products/:id - existence check
pub async fn head(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    if state.store.exists(Collection::Products, &id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
