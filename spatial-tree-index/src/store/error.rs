use std::io;
use thiserror::Error;

use crate::errors::{ErrorKind, IndexError};

/// Errors raised by the range-tree store and its maps.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store file is corrupted: {0}")]
    Corrupted(String),

    #[error("Store or map is closed: {0}")]
    Closed(String),

    #[error("Key has NaN, out of range or reversed bounds: {0}")]
    InvalidKey(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for IndexError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(io_err) => io_err.into(),
            StoreError::Serialization(msg) => IndexError::new(
                &format!("Spatial store encoding error: {}", msg),
                ErrorKind::EncodingError,
            ),
            StoreError::Corrupted(msg) => IndexError::new(
                &format!("Spatial store file corrupted: {}", msg),
                ErrorKind::FileCorrupted,
            ),
            StoreError::Closed(name) => IndexError::new(
                &format!("Spatial store {} is closed", name),
                ErrorKind::StoreAlreadyClosed,
            ),
            StoreError::InvalidKey(key) => IndexError::new(
                &format!("Invalid spatial key {}", key),
                ErrorKind::InvalidDataType,
            ),
        }
    }
}
