//! Portfolio error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;
