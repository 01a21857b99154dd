pub mod auth;
pub mod json;
pub mod response;
pub mod stack;

pub use auth::{AdminOnly, Authenticated, Identity};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
pub use stack::error_stack_middleware;
