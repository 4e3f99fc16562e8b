//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(#[from] desk_channel::ChannelError),

    #[error("Registry error: {0}")]
    Registry(#[from] desk_registry::RegistryError),

    #[error("Feed error: {0}")]
    Feed(#[from] desk_feed::FeedError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] desk_portfolio::PortfolioError),

    #[error("Symbol error: {0}")]
    Symbol(#[from] desk_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
