use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Unsupported filter operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Malformed filter key: {0}")]
    MalformedKey(String),

    #[error("Projection cannot mix included and excluded fields")]
    MixedProjection,
}
