//! Error types for the agent bridge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<::config::ConfigError> for BridgeError {
    fn from(err: ::config::ConfigError) -> Self {
        BridgeError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
