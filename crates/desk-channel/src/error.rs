//! Push-channel error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ChannelResult<T> = Result<T, ChannelError>;
