//! Push-payload decoding.
//!
//! The server serializes dataframes to JSON strings before emitting them, so
//! `market_data` carries a string-encoded label→OHLC object and `chart_data`
//! may arrive either as a string-encoded or a plain JSON object. Every decode
//! failure is contained as `FeedError::MalformedPayload`; a bad event must
//! never disturb previously cached state.

use crate::error::{FeedError, FeedResult};
use crate::series::{IndicatorRow, IndicatorSeries, MarketSnapshot};
use desk_core::{OhlcBar, Symbol};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Raw `market_data` envelope: `{symbol, data: "<encoded label→OHLC map>"}`.
#[derive(Debug, Deserialize)]
struct RawMarketData {
    symbol: String,
    data: String,
}

/// Raw `chart_data` body: `{index: [...], data: [{sma_50, ...}, ...]}`.
#[derive(Debug, Deserialize)]
struct RawChartData {
    #[serde(default)]
    symbol: Option<String>,
    index: Vec<Value>,
    data: Vec<IndicatorRow>,
}

/// Raw `update` envelope: `{chartData, symbols}`.
#[derive(Debug, Deserialize)]
struct RawUpdate {
    #[serde(rename = "chartData", default)]
    chart_data: Option<Value>,
    #[serde(default)]
    symbols: Vec<String>,
}

/// Decoded `update` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePayload {
    pub chart: Option<IndicatorSeries>,
    /// Server-side symbol list, for display only; never written back into
    /// the watch-list registry.
    pub symbols: Vec<Symbol>,
}

fn malformed(context: &str, e: impl std::fmt::Display) -> FeedError {
    FeedError::MalformedPayload(format!("{context}: {e}"))
}

/// Decode a `market_data` payload into a symbol and its snapshot.
pub fn decode_market_data(value: &Value) -> FeedResult<(Symbol, MarketSnapshot)> {
    let raw: RawMarketData =
        serde_json::from_value(value.clone()).map_err(|e| malformed("market_data envelope", e))?;
    let symbol = Symbol::new(&raw.symbol).map_err(|e| malformed("market_data symbol", e))?;

    // preserve_order keeps the encoded label order; the snapshot stores bars
    // in exactly that order.
    let map: serde_json::Map<String, Value> =
        serde_json::from_str(&raw.data).map_err(|e| malformed("market_data body", e))?;

    let mut bars = Vec::with_capacity(map.len());
    for (label, entry) in map {
        let bar: OhlcBar = serde_json::from_value(entry)
            .map_err(|e| malformed(&format!("market_data bar at {label}"), e))?;
        bars.push((label, bar));
    }

    Ok((symbol, MarketSnapshot::new(bars)))
}

/// Decode a `chart_data` payload (string-encoded or plain object) into an
/// optional explicit symbol and the indicator series.
pub fn decode_chart_data(value: &Value) -> FeedResult<(Option<Symbol>, IndicatorSeries)> {
    let raw: RawChartData = match value {
        Value::String(encoded) => {
            serde_json::from_str(encoded).map_err(|e| malformed("chart_data body", e))?
        }
        other => {
            serde_json::from_value(other.clone()).map_err(|e| malformed("chart_data body", e))?
        }
    };

    if raw.index.len() != raw.data.len() {
        return Err(FeedError::SeriesMismatch {
            labels: raw.index.len(),
            rows: raw.data.len(),
        });
    }

    let symbol = match raw.symbol {
        Some(s) => Some(Symbol::new(&s).map_err(|e| malformed("chart_data symbol", e))?),
        None => None,
    };

    let labels = raw.index.iter().map(index_label).collect();
    Ok((
        symbol,
        IndicatorSeries {
            labels,
            rows: raw.data,
        },
    ))
}

/// Decode an `update` payload. Invalid symbols in the display list are
/// skipped with a diagnostic rather than poisoning the whole event.
pub fn decode_update(value: &Value) -> FeedResult<UpdatePayload> {
    let raw: RawUpdate =
        serde_json::from_value(value.clone()).map_err(|e| malformed("update envelope", e))?;

    let chart = match &raw.chart_data {
        Some(chart_value) => Some(decode_chart_data(chart_value)?.1),
        None => None,
    };

    let mut symbols = Vec::with_capacity(raw.symbols.len());
    for s in &raw.symbols {
        match Symbol::new(s) {
            Ok(symbol) => symbols.push(symbol),
            Err(e) => warn!(symbol = %s, error = %e, "Skipping invalid symbol in update"),
        }
    }

    Ok(UpdatePayload { chart, symbols })
}

/// Index entries are timestamps: sometimes strings, sometimes epoch numbers.
fn index_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
