//! Pull-based positions read model.
//!
//! Each field refreshes independently so one failing endpoint never blanks
//! the others. A failed pull keeps the last good value and records the error
//! alongside it. Once deactivated, in-flight pull results are discarded.

use crate::client::PortfolioClient;
use crate::error::PortfolioError;
use desk_core::Position;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One independently refreshed field of the portfolio snapshot.
#[derive(Debug, Clone, Default)]
pub struct FieldState<T> {
    /// Last successfully pulled value, if any.
    pub value: Option<T>,
    /// Error from the most recent pull attempt, cleared on success.
    pub error: Option<String>,
    /// When the value was last successfully refreshed.
    pub refreshed_at: Option<Instant>,
}

impl<T> FieldState<T> {
    fn apply(&mut self, result: Result<T, PortfolioError>) {
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                self.refreshed_at = Some(Instant::now());
            }
            Err(e) => {
                // Value is kept; staleness is visible via refreshed_at.
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Point-in-time copy of the portfolio read model.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    pub positions: FieldState<Vec<Position>>,
    pub total_value: FieldState<Decimal>,
    pub cash: FieldState<Decimal>,
}

/// Periodically refreshed view over positions, total value and cash.
pub struct PositionsView {
    client: Arc<PortfolioClient>,
    state: RwLock<PortfolioSnapshot>,
    active: CancellationToken,
}

impl PositionsView {
    pub fn new(client: Arc<PortfolioClient>) -> Self {
        Self {
            client,
            state: RwLock::new(PortfolioSnapshot::default()),
            active: CancellationToken::new(),
        }
    }

    /// Current snapshot; cheap clone of the cached fields.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.state.read().clone()
    }

    /// Stop applying pull results. In-flight pulls finish but their results
    /// are dropped, so a torn-down view never mutates stale state.
    pub fn deactivate(&self) {
        self.active.cancel();
    }

    /// Refresh all fields concurrently.
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.refresh_positions(),
            self.refresh_total_value(),
            self.refresh_cash(),
        );
    }

    pub async fn refresh_positions(&self) {
        let result = self.client.positions().await;
        self.store_positions(result);
    }

    pub async fn refresh_total_value(&self) {
        let result = self.client.total_value().await;
        self.store_total_value(result);
    }

    pub async fn refresh_cash(&self) {
        let result = self.client.cash().await;
        self.store_cash(result);
    }

    fn store_positions(&self, result: Result<Vec<Position>, PortfolioError>) {
        if self.active.is_cancelled() {
            return;
        }
        if let Err(e) = &result {
            warn!(error = %e, "Positions pull failed");
        }
        self.state.write().positions.apply(result);
    }

    fn store_total_value(&self, result: Result<Decimal, PortfolioError>) {
        if self.active.is_cancelled() {
            return;
        }
        if let Err(e) = &result {
            warn!(error = %e, "Total value pull failed");
        }
        self.state.write().total_value.apply(result);
    }

    fn store_cash(&self, result: Result<Decimal, PortfolioError>) {
        if self.active.is_cancelled() {
            return;
        }
        if let Err(e) = &result {
            warn!(error = %e, "Cash pull failed");
        }
        self.state.write().cash.apply(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_core::Symbol;
    use rust_decimal_macros::dec;

    fn view() -> PositionsView {
        PositionsView::new(Arc::new(PortfolioClient::new("http://localhost:0").unwrap()))
    }

    fn position(symbol: &str) -> Position {
        Position {
            symbol: Symbol::new(symbol).unwrap(),
            shares: dec!(1),
            buy_price: dec!(100),
            current_price: dec!(110),
            pl: dec!(10),
        }
    }

    #[test]
    fn test_successful_pull_updates_field() {
        let view = view();
        view.store_positions(Ok(vec![position("AAPL")]));

        let snap = view.snapshot();
        assert_eq!(snap.positions.value.unwrap().len(), 1);
        assert!(snap.positions.error.is_none());
        assert!(snap.positions.refreshed_at.is_some());
    }

    #[test]
    fn test_failed_pull_keeps_last_good_value() {
        let view = view();
        view.store_cash(Ok(dec!(5000)));
        view.store_cash(Err(PortfolioError::Transport("connection reset".into())));

        let snap = view.snapshot();
        assert_eq!(snap.cash.value, Some(dec!(5000)));
        assert!(snap.cash.error.as_deref().unwrap().contains("connection reset"));
    }

    #[test]
    fn test_success_clears_previous_error() {
        let view = view();
        view.store_total_value(Err(PortfolioError::Transport("timeout".into())));
        view.store_total_value(Ok(dec!(10250.75)));

        let snap = view.snapshot();
        assert_eq!(snap.total_value.value, Some(dec!(10250.75)));
        assert!(snap.total_value.error.is_none());
    }

    #[test]
    fn test_fields_fail_independently() {
        let view = view();
        view.store_positions(Ok(vec![position("MSFT")]));
        view.store_cash(Err(PortfolioError::Status {
            status: 500,
            body: "oops".into(),
        }));

        let snap = view.snapshot();
        assert!(snap.positions.error.is_none());
        assert!(snap.cash.error.is_some());
    }

    #[test]
    fn test_deactivated_view_discards_results() {
        let view = view();
        view.store_cash(Ok(dec!(5000)));
        view.deactivate();
        view.store_cash(Ok(dec!(9999)));
        view.store_positions(Ok(vec![position("AAPL")]));

        let snap = view.snapshot();
        assert_eq!(snap.cash.value, Some(dec!(5000)));
        assert!(snap.positions.value.is_none());
    }
}
