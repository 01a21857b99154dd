use axum::extract::State;
use serde_json::{json, Value};

use crate::database::models::user::public_view;
use crate::database::models::UserUpdate;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Authenticated};
use crate::state::AppState;
use crate::types::Collection;

use super::{NOT_FOR_PASSWORDS, NOT_FOUND};

/// GET /api/users/me
pub async fn get(Authenticated(identity): Authenticated) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "user": identity.user })))
}

/// PATCH /api/users/updateMe - only `name` and `email` are applied
pub async fn update(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<Value> {
    if input.wants_password_change() {
        return Err(ApiError::bad_request(NOT_FOR_PASSWORDS));
    }

    let changes = input.into_changes(false)?;
    let user = state
        .store
        .update_by_id(Collection::Users, &identity.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(json!({ "user": public_view(user) })))
}
