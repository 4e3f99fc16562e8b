//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Series length mismatch: {labels} labels vs {rows} rows")]
    SeriesMismatch { labels: usize, rows: usize },
}

pub type FeedResult<T> = Result<T, FeedError>;
