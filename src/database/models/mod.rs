pub mod category;
pub mod product;
pub mod user;

pub use category::CategoryInput;
pub use product::ProductInput;
pub use user::{LoginInput, RegisterInput, UserUpdate};

use thiserror::Error;

/// One or more field-level validation failures
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid input data. {}", .0.join(". "))]
pub struct ValidationError(pub Vec<String>);

/// Collects failures while a model is being checked
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<String>);

impl Violations {
    pub(crate) fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub(crate) fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.push(message);
        }
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError(self.0))
        }
    }
}

/// Trim a string field, treating blank as absent
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
