use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::user::public_view;
use crate::database::models::UserUpdate;
use crate::error::ApiError;
use crate::filter::QueryPlan;
use crate::middleware::{AdminOnly, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::{NOT_FOR_PASSWORDS, NOT_FOUND};

/// GET /api/users
pub async fn list(_admin: AdminOnly, State(state): State<AppState>) -> ApiResult<Value> {
    let users: Vec<_> = state
        .store
        .find(Collection::Users, &QueryPlan::insertion_order())
        .await?
        .into_iter()
        .map(public_view)
        .collect();
    let results = users.len();

    Ok(ApiResponse::success(json!({ "users": users })).with_results(results))
}

/// GET /api/users/:id
pub async fn get(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let user = state
        .store
        .find_by_id(Collection::Users, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(json!({ "user": public_view(user) })))
}

/// PATCH /api/users/:id - may change name, email and role
pub async fn patch(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<Value> {
    if input.wants_password_change() {
        return Err(ApiError::bad_request(NOT_FOR_PASSWORDS));
    }

    let changes = input.into_changes(true)?;
    let user = state
        .store
        .update_by_id(Collection::Users, &id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, user = %id, "user updated");

    Ok(ApiResponse::success(json!({ "user": public_view(user) })))
}

/// DELETE /api/users/:id
pub async fn delete(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state
        .store
        .delete_by_id(Collection::Users, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(admin = %admin.id, user = %id, "user deleted");

    Ok(ApiResponse::no_content())
}
