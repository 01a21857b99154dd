use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Wrapper for API responses that adds the `success` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub results: Option<usize>,
    pub token: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            results: None,
            token: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Report the number of items in a listing
    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

impl ApiResponse<()> {
    /// 204 No Content with an empty body
    pub fn no_content() -> Self {
        Self::success(()).with_status(StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "error",
                        "message": "Failed to serialize response data",
                        "data": null
                    })),
                )
                    .into_response();
            }
        };

        let mut envelope = json!({ "status": "success" });
        if let Some(results) = self.results {
            envelope["results"] = Value::from(results);
        }
        if let Some(token) = self.token {
            envelope["token"] = Value::String(token);
        }
        envelope["data"] = data_value;

        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
