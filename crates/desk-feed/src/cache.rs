//! Per-symbol market-data cache.
//!
//! Updated only from push events; consumers read derived series. Two
//! snapshots for the same symbol resolve by last writer wins in arrival
//! order at the cache; no reordering on embedded timestamps.

use crate::decode::{decode_chart_data, decode_market_data, decode_update, UpdatePayload};
use crate::error::FeedResult;
use crate::series::{ChartSeries, IndicatorSeries, MarketSnapshot};
use dashmap::DashMap;
use desk_core::Symbol;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

/// Keyed store of latest snapshot and indicator overlay per symbol.
#[derive(Default)]
pub struct MarketDataCache {
    snapshots: DashMap<Symbol, MarketSnapshot>,
    overlays: DashMap<Symbol, IndicatorSeries>,
    /// Overlay for `chart_data` events that carry no symbol field.
    default_overlay: RwLock<Option<IndicatorSeries>>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a `market_data` payload: decode and replace (not merge) the
    /// symbol's snapshot. On decode failure the cache is unchanged.
    pub fn apply_market_data(&self, payload: &Value) -> FeedResult<Symbol> {
        let (symbol, snapshot) = decode_market_data(payload)?;
        debug!(symbol = %symbol, bars = snapshot.len(), "Snapshot replaced");
        self.snapshots.insert(symbol.clone(), snapshot);
        Ok(symbol)
    }

    /// Ingest a `chart_data` payload into the symbol's overlay, or the
    /// default overlay slot when the payload names no symbol.
    pub fn apply_chart_data(&self, payload: &Value) -> FeedResult<Option<Symbol>> {
        let (symbol, series) = decode_chart_data(payload)?;
        match &symbol {
            Some(symbol) => {
                self.overlays.insert(symbol.clone(), series);
            }
            None => {
                *self.default_overlay.write() = Some(series);
            }
        }
        Ok(symbol)
    }

    /// Ingest an `update` payload. Chart data feeds the default overlay; the
    /// server's symbol list is returned for display and never written into
    /// the watch-list.
    pub fn apply_update(&self, payload: &Value) -> FeedResult<UpdatePayload> {
        let update = decode_update(payload)?;
        if let Some(chart) = &update.chart {
            *self.default_overlay.write() = Some(chart.clone());
        }
        Ok(update)
    }

    /// Latest chart series for a symbol, derived from the cached snapshot:
    /// the close line, plus indicator lines when an overlay of matching
    /// length exists (symbol-keyed first, then the default slot).
    ///
    /// Returns `None` when no snapshot is cached; an evicted symbol never
    /// serves stale data.
    pub fn series(&self, symbol: &Symbol) -> Option<ChartSeries> {
        let snapshot = self.snapshots.get(symbol)?;
        let mut series = ChartSeries::from_snapshot(&snapshot);

        let overlay = self
            .overlays
            .get(symbol)
            .map(|o| o.clone())
            .or_else(|| self.default_overlay.read().clone());
        if let Some(overlay) = overlay {
            if overlay.rows.len() == series.labels.len() {
                series.lines.extend(overlay.lines());
            } else {
                debug!(
                    symbol = %symbol,
                    snapshot_len = series.labels.len(),
                    overlay_len = overlay.rows.len(),
                    "Overlay length mismatch, returning close line only"
                );
            }
        }
        Some(series)
    }

    /// Indicator-only series from a `chart_data` overlay, independent of any
    /// snapshot. `None` symbol reads the default slot.
    pub fn overlay_series(&self, symbol: Option<&Symbol>) -> Option<ChartSeries> {
        let overlay = match symbol {
            Some(symbol) => self.overlays.get(symbol).map(|o| o.clone()),
            None => self.default_overlay.read().clone(),
        }?;
        Some(ChartSeries::from_overlay(&overlay))
    }

    /// Latest raw snapshot for a symbol.
    pub fn snapshot(&self, symbol: &Symbol) -> Option<MarketSnapshot> {
        self.snapshots.get(symbol).map(|s| s.clone())
    }

    /// Drop all cached state for a symbol that left the watch-list.
    pub fn evict(&self, symbol: &Symbol) {
        self.snapshots.remove(symbol);
        self.overlays.remove(symbol);
        debug!(symbol = %symbol, "Evicted from market-data cache");
    }

    /// Symbols currently holding a snapshot.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.snapshots.iter().map(|e| e.key().clone()).collect()
    }
}
