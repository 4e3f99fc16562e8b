//! Market-data cache for the desk dashboard.
//!
//! Projects inbound push events into per-symbol state:
//! - `market_data` events replace the symbol's OHLC snapshot (last writer wins)
//! - `chart_data` events carry precomputed indicator overlays
//! - `series()` derives parallel label/value arrays for chart consumers
//!
//! The cache is decoupled from both the transport and any chart library.

pub mod cache;
pub mod decode;
pub mod error;
pub mod series;

pub use cache::MarketDataCache;
pub use decode::{decode_chart_data, decode_market_data, decode_update, UpdatePayload};
pub use error::{FeedError, FeedResult};
pub use series::{ChartSeries, IndicatorRow, IndicatorSeries, MarketSnapshot, SeriesLine};
