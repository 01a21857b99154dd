use axum::{extract::State, http::Uri, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "status": "success",
        "data": {
            "name": "Catalog API",
            "version": version,
            "description": "Product catalog REST API with JWT authentication",
            "endpoints": {
                "health": "/health (public)",
                "products": "/api/products[/:id] (public reads, admin writes)",
                "categories": "/api/categories[/:id][/products] (public reads, admin writes)",
                "users": "/api/users/register, /api/users/login (public)",
                "me": "/api/users/me, /api/users/updateMe (authenticated)",
                "admin": "/api/users[/:id] (admin)",
            }
        }
    }))
}

/// GET /health - document store connectivity
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "store": "ok"
        }))),
        Err(e) => {
            warn!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Document store unavailable"))
        }
    }
}

/// Anything no route matched
pub async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Can't find {} on this server", uri.path()))
}
