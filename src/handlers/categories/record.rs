use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::database::models::CategoryInput;
use crate::error::ApiError;
use crate::filter::{FilterSet, Projection, QueryPlan};
use crate::handlers::products::present;
use crate::middleware::{AdminOnly, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::NOT_FOUND;

/// GET /api/categories/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let mut category = state
        .store
        .find_by_id(Collection::Categories, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Projection::default().apply(&mut category);

    Ok(ApiResponse::success(json!({ "category": category })))
}

/// PUT /api/categories/:id - admin only, validates the supplied fields
pub async fn put(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Value> {
    let changes = input.into_changes()?;
    let mut category = state
        .store
        .update_by_id(Collection::Categories, &id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Projection::default().apply(&mut category);
    info!(admin = %admin.id, category = %id, "category updated");

    Ok(ApiResponse::success(json!({ "category": category })))
}

/// DELETE /api/categories/:id - refused while any product references it
pub async fn delete(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    if !state.store.exists(Collection::Categories, &id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let in_use = state
        .store
        .count(Collection::Products, &FilterSet::eq("category", &id))
        .await?;
    if in_use > 0 {
        warn!(category = %id, products = in_use, "refusing to delete category in use");
        return Err(ApiError::bad_request(format!(
            "Cannot delete category that is used by {} products",
            in_use
        )));
    }

    state
        .store
        .delete_by_id(Collection::Categories, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, category = %id, "category deleted");

    Ok(ApiResponse::no_content())
}

/// GET /api/categories/:id/products
pub async fn products(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    if !state.store.exists(Collection::Categories, &id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let plan = QueryPlan::insertion_order().with_filter(FilterSet::eq("category", &id));
    let products: Vec<_> = state
        .store
        .find(Collection::Products, &plan)
        .await?
        .into_iter()
        .map(present::present)
        .collect();
    let results = products.len();

    Ok(ApiResponse::success(json!({ "products": products })).with_results(results))
}
