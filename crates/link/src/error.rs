//! Link error types

/// Link result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while handling page addresses
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed address: {0}")]
    Malformed(String),

    #[error("No addressable location")]
    NoLocation,
}
