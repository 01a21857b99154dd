use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::verify_token;
use crate::database::models::user::public_view;
use crate::database::Document;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Collection, Role};

pub const NOT_LOGGED_IN: &str = "You are not logged in. Please log in to get access";
pub const USER_GONE: &str = "The user belonging to this token no longer exists";
pub const NO_PERMISSION: &str = "You do not have permission to perform this action";

/// The user a request is acting as, resolved from its bearer token
#[derive(Clone, Debug)]
pub struct Identity {
    pub id: String,
    pub role: Role,
    /// Stored user document without password or version
    pub user: Document,
}

impl Identity {
    fn from_document(id: &str, document: Document) -> Self {
        let role = document
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse().ok())
            .unwrap_or_default();
        Self {
            id: id.to_string(),
            role,
            user: public_view(document),
        }
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Extract the bearer token: the header must start with `Bearer` and the
/// token is the second space-separated part
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
    if !auth_str.starts_with("Bearer") {
        return None;
    }
    auth_str.split(' ').nth(1).filter(|token| !token.is_empty())
}

/// Verify the token and load the user it names
pub async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = extract_jwt_from_headers(headers).ok_or_else(|| ApiError::unauthorized(NOT_LOGGED_IN))?;

    let claims = verify_token(token, &state.config.security).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    let user = state
        .store
        .find_by_id(Collection::Users, &claims.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized(USER_GONE))?;

    let identity = Identity::from_document(&claims.id, user);
    debug!(user_id = %identity.id, role = %identity.role, "resolved identity");
    Ok(identity)
}

/// Any logged-in user
#[derive(Clone, Debug)]
pub struct Authenticated(pub Identity);

/// Logged-in user holding the admin role
#[derive(Clone, Debug)]
pub struct AdminOnly(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_identity(state, &parts.headers).await.map(Authenticated)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;
        if !identity.has_role(&[Role::Admin]) {
            debug!(user_id = %identity.id, "admin capability denied");
            return Err(ApiError::forbidden(NO_PERMISSION));
        }
        Ok(AdminOnly(identity))
    }
}
