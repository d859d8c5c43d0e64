//! Error types of the deployer.

use std::path::PathBuf;
use thiserror::Error;

pub type DeployResult<T> = Result<T, DeployError>;

/// Every failure is terminal; the variants only tell the user where it happened.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Reading a script binary or a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON-RPC payload or molecule (de)serialization
    #[error("codec error: {0}")]
    Codec(String),

    /// Config file could not be decoded
    #[error("decode {} error: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// Collected live cells can't fund the transaction
    #[error("insufficient capacity: {available} < {required}")]
    InsufficientCapacity { available: u64, required: u64 },

    #[error("capacity overflow")]
    CapacityOverflow,

    /// RPC or indexer failure
    #[error("network error: {0}")]
    Network(String),

    /// Private key import or signature failure
    #[error("signing error: {0}")]
    Signing(String),
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Codec(format!("malformed rpc payload: {}", err))
    }
}
