//! Core domain types for the desk dashboard client.
//!
//! This crate provides the fundamental types shared by the synchronization
//! core:
//! - `Symbol`: normalized uppercase ticker
//! - `OhlcBar`: per-label OHLC record with optional indicator columns
//! - `Position`, `AssetInfo`, `HistoryPoint`: portfolio read-model types

pub mod error;
pub mod symbol;
pub mod types;

pub use error::{CoreError, Result};
pub use symbol::Symbol;
pub use types::{AssetInfo, HistoryPoint, OhlcBar, Position};
