use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChurnError {
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Store unreachable or credentials rejected
    #[error("connection failed: {0}")]
    Connection(String),

    /// Query or row decoding failed against a relation
    #[error("query on {relation} failed: {message}")]
    Query { relation: String, message: String },

    /// No unified records left to anchor the cutoff on
    #[error("no activity records to classify")]
    EmptyDataset,

    #[error("inactivity window must be at least one day, got {0}")]
    InvalidWindow(u32),
}

impl ChurnError {
    pub fn query(relation: &str, message: impl Into<String>) -> Self {
        ChurnError::Query {
            relation: relation.to_owned(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;
