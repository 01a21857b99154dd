use axum::{
    extract::{Query, State},
    http::{header::ALLOW, StatusCode},
    response::IntoResponse,
};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::ProductInput;
use crate::filter::Filter;
use crate::middleware::{AdminOnly, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::{present, ALLOWED_METHODS};

/// GET /api/products - filtered, sorted, projected and paged listing
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Value> {
    let plan = Filter::translate(&params, &state.config.query)?;
    let products = state.store.find(Collection::Products, &plan).await?;
    let products = present::populate(&state, products, &plan.projection).await?;
    let results = products.len();

    Ok(ApiResponse::success(json!({ "products": products })).with_results(results))
}

/// POST /api/products - admin only
pub async fn post(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Value> {
    let document = input.into_document()?;
    let product = state.store.insert(Collection::Products, document).await?;
    info!(admin = %admin.id, product = ?product.get("_id"), "product created");

    Ok(ApiResponse::created(json!({ "product": present::present(product) })))
}

/// OPTIONS /api/products[/:id] - advertise the supported methods
pub async fn options() -> impl IntoResponse {
    (StatusCode::OK, [(ALLOW, ALLOWED_METHODS)])
}
