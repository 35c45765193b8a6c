//! Error types for Stand-up Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
