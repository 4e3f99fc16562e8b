//! Portfolio and market-data record types.

use crate::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One OHLC record for a single timestamp label.
///
/// Snapshot payloads carry extra indicator columns alongside OHLC; those are
/// captured in `indicators` (values may be null for warm-up rows, e.g. the
/// first 49 rows of a 50-period moving average).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(flatten)]
    pub indicators: BTreeMap<String, Option<Decimal>>,
}

/// A portfolio position as reported by the server.
///
/// The client holds an immutable snapshot; the server owns settlement. Only
/// `refresh` replaces these, never order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub shares: Decimal,
    pub buy_price: Decimal,
    pub current_price: Decimal,
    /// Unrealized profit/loss as reported by the server.
    pub pl: Decimal,
}

impl Position {
    /// Current market value: shares * current price.
    pub fn market_value(&self) -> Decimal {
        self.shares * self.current_price
    }
}

/// Static asset metadata from `get_asset_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub symbol: Symbol,
    pub name: String,
    pub exchange: String,
    pub asset_class: String,
    pub status: String,
    pub tradable: bool,
}

/// One point of price history from `get_history/{symbol}`.
///
/// Dates stay as opaque labels; they are display keys, not arithmetic inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: String,
    pub close: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ohlc_bar_decodes_indicator_columns() {
        let raw = r#"{"open": 10.0, "high": 12.5, "low": 9.5, "close": 11.0, "sma_50": 10.2, "rsi": null}"#;
        let bar: OhlcBar = serde_json::from_str(raw).unwrap();
        assert_eq!(bar.close, dec!(11.0));
        assert_eq!(bar.indicators.get("sma_50"), Some(&Some(dec!(10.2))));
        assert_eq!(bar.indicators.get("rsi"), Some(&None));
    }

    #[test]
    fn test_ohlc_bar_rejects_missing_close() {
        let raw = r#"{"open": 10.0, "high": 12.5, "low": 9.5}"#;
        assert!(serde_json::from_str::<OhlcBar>(raw).is_err());
    }

    #[test]
    fn test_position_market_value() {
        let pos = Position {
            symbol: Symbol::new("TSLA").unwrap(),
            shares: dec!(3),
            buy_price: dec!(200),
            current_price: dec!(250.5),
            pl: dec!(151.5),
        };
        assert_eq!(pos.market_value(), dec!(751.5));
    }

    #[test]
    fn test_history_point_ignores_extra_fields() {
        let raw = r#"{"date": "2024-05-01", "close": 182.4, "volume": 1000}"#;
        let point: HistoryPoint = serde_json::from_str(raw).unwrap();
        assert_eq!(point.date, "2024-05-01");
        assert_eq!(point.close, dec!(182.4));
    }
}
