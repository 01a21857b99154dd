use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::ErrorStack;

/// Adds the `stack` field to error envelopes. Installed by the router only
/// when the app is not configured for production.
pub async fn error_stack_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let Some(ErrorStack { mut body, stack }) = response.extensions_mut().remove::<ErrorStack>() else {
        return response;
    };
    body["stack"] = Value::String(stack);
    (response.status(), Json(body)).into_response()
}
