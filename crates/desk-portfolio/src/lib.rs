//! Pull-based portfolio state and order issuance.
//!
//! Intentionally simple: `PositionsView` combines independent REST pulls with
//! per-field failure isolation, `OrderGateway` fires buy/sell commands and
//! reports their outcome. Neither participates in the streaming core;
//! settlement is server-authoritative and observed only by re-pulling.

pub mod client;
pub mod error;
pub mod orders;
pub mod view;

pub use client::PortfolioClient;
pub use error::{PortfolioError, PortfolioResult};
pub use orders::{OrderGateway, OrderOutcome, OrderRecord, OrderSide};
pub use view::{FieldState, PortfolioSnapshot, PositionsView};
