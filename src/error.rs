//! Error types shared by the library modules

use thiserror::Error;

/// Failures of the project key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize project list: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    #[error("project store lock poisoned")]
    Poisoned,
}

/// Failures talking to the remote catalog API
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("catalog API returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
