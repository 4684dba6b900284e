use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyError {
    #[error("failed to parse policy: {0}")]
    ParseError(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unauthorized: {action} on {entity_id}")]
    Unauthorized { entity_id: String, action: String },
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}
