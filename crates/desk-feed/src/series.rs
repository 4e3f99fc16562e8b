//! Snapshot and chart-series types.
//!
//! `MarketSnapshot` is the stored truth (one per symbol, replaced wholesale
//! on every event); `ChartSeries` is a throwaway projection recomputed on
//! read. Label order is arrival order of the encoded payload; the cache never
//! reorders.

use desk_core::OhlcBar;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Latest decoded OHLC snapshot for one symbol: ordered (label, bar) pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketSnapshot {
    bars: Vec<(String, OhlcBar)>,
}

impl MarketSnapshot {
    pub fn new(bars: Vec<(String, OhlcBar)>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, OhlcBar)> {
        self.bars.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bars.iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn closes(&self) -> Vec<Option<Decimal>> {
        self.bars.iter().map(|(_, bar)| Some(bar.close)).collect()
    }
}

/// One row of precomputed chart indicators, as sent on `chart_data`.
/// Values are null during indicator warm-up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorRow {
    #[serde(default)]
    pub sma_50: Option<Decimal>,
    #[serde(default)]
    pub sma_200: Option<Decimal>,
    #[serde(default)]
    pub upper_bb: Option<Decimal>,
    #[serde(default)]
    pub middle_bb: Option<Decimal>,
    #[serde(default)]
    pub lower_bb: Option<Decimal>,
}

/// A decoded `chart_data` payload: parallel index labels and indicator rows.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub labels: Vec<String>,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorSeries {
    /// Project the rows into named indicator lines.
    pub fn lines(&self) -> Vec<SeriesLine> {
        let pick = |f: fn(&IndicatorRow) -> Option<Decimal>| -> Vec<Option<Decimal>> {
            self.rows.iter().map(f).collect()
        };
        vec![
            SeriesLine::new("sma_50", pick(|r| r.sma_50)),
            SeriesLine::new("sma_200", pick(|r| r.sma_200)),
            SeriesLine::new("upper_bb", pick(|r| r.upper_bb)),
            SeriesLine::new("middle_bb", pick(|r| r.middle_bb)),
            SeriesLine::new("lower_bb", pick(|r| r.lower_bb)),
        ]
    }
}

/// One named value series, parallel to its chart's labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLine {
    pub name: String,
    pub points: Vec<Option<Decimal>>,
}

impl SeriesLine {
    pub fn new(name: impl Into<String>, points: Vec<Option<Decimal>>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Parallel label/value arrays ready for a chart consumer.
///
/// A view, not a source of truth: recomputed from cached state on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub lines: Vec<SeriesLine>,
}

impl ChartSeries {
    /// Close-price series derived from a snapshot.
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            labels: snapshot.labels(),
            lines: vec![SeriesLine::new("close", snapshot.closes())],
        }
    }

    /// Indicator series derived from a chart-data overlay.
    pub fn from_overlay(overlay: &IndicatorSeries) -> Self {
        Self {
            labels: overlay.labels.clone(),
            lines: overlay.lines(),
        }
    }

    pub fn line(&self, name: &str) -> Option<&SeriesLine> {
        self.lines.iter().find(|l| l.name == name)
    }
}
