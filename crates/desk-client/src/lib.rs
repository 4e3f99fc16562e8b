//! Dashboard application wiring.
//!
//! Binds the push channel, watch-list registry, market-data cache and
//! portfolio view into one owned lifecycle with a single shutdown path.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
