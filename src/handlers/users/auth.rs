use axum::extract::State;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::password::{hash_password_async, verify_password_async};
use crate::auth::sign_token;
use crate::database::models::user::public_view;
use crate::database::models::{LoginInput, RegisterInput};
use crate::error::ApiError;
use crate::filter::FilterSet;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

const EMAIL_IN_USE: &str = "Email already in use";
const MISSING_CREDENTIALS: &str = "Please provide email and password";
const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// POST /api/users/register - always creates a plain `user`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<Value> {
    let new_user = input.validate()?;

    let taken = state
        .store
        .find_one(Collection::Users, &FilterSet::eq("email", &new_user.email))
        .await?;
    if taken.is_some() {
        return Err(ApiError::conflict(EMAIL_IN_USE));
    }

    let password_hash = hash_password_async(new_user.password.clone()).await?;
    let user = state
        .store
        .insert(Collection::Users, new_user.into_document(password_hash))
        .await?;

    let id = user_id(&user)?;
    let token = sign_token(&id, &state.config.security)?;
    info!(user = %id, "user registered");

    Ok(ApiResponse::created(json!({ "user": public_view(user) })).with_token(token))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<Value> {
    let (email, password) = input
        .credentials()
        .ok_or_else(|| ApiError::bad_request(MISSING_CREDENTIALS))?;

    let user = state
        .store
        .find_one(Collection::Users, &FilterSet::eq("email", &email))
        .await?;

    let stored_hash = user
        .as_ref()
        .and_then(|u| u.get("password"))
        .and_then(Value::as_str);
    let verified = match stored_hash {
        Some(hash) => verify_password_async(password, hash.to_string()).await?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!("Failed login attempt for {}", email);
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
    };

    let id = user_id(&user)?;
    let token = sign_token(&id, &state.config.security)?;
    info!(user = %id, "user logged in");

    Ok(ApiResponse::success(json!({ "user": public_view(user) })).with_token(token))
}

fn user_id(user: &crate::database::Document) -> Result<String, ApiError> {
    user.get("_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::internal_server_error("stored user has no _id"))
}
