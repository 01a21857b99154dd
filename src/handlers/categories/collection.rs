use axum::extract::State;
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::CategoryInput;
use crate::filter::{Projection, QueryPlan};
use crate::middleware::{AdminOnly, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let categories = state
        .store
        .find(Collection::Categories, &QueryPlan::insertion_order())
        .await?;
    let results = categories.len();

    Ok(ApiResponse::success(json!({ "categories": categories })).with_results(results))
}

/// POST /api/categories - admin only
pub async fn post(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Value> {
    let mut category = state
        .store
        .insert(Collection::Categories, input.into_document()?)
        .await?;
    Projection::default().apply(&mut category);
    info!(admin = %admin.id, category = ?category.get("_id"), "category created");

    Ok(ApiResponse::created(json!({ "category": category })))
}
