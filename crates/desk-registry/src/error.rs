//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Watch-list push rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
