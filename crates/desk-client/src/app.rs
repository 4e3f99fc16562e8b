//! Application wiring and lifecycle.

use crate::config::AppConfig;
use crate::error::AppResult;
use desk_channel::{EventChannel, Topic};
use desk_core::Symbol;
use desk_feed::MarketDataCache;
use desk_portfolio::{OrderGateway, PortfolioClient, PortfolioSnapshot, PositionsView};
use desk_registry::{RegistryEvent, RestSymbolStore, SymbolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Owns every long-lived component and their shared shutdown path.
///
/// Push events flow channel -> cache; watch-list edits flow registry ->
/// server; portfolio state is pulled on an interval and re-pulled on
/// reconnect so a dropped connection never leaves the view stale.
pub struct Application {
    config: AppConfig,
    channel: Arc<EventChannel>,
    registry: Arc<SymbolRegistry>,
    cache: Arc<MarketDataCache>,
    positions: Arc<PositionsView>,
    orders: OrderGateway,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let channel = Arc::new(EventChannel::new(config.channel_config()));

        let store = Arc::new(RestSymbolStore::new(&config.server.base_url)?);
        let registry = Arc::new(SymbolRegistry::new(store, config.registry_config()));

        let cache = Arc::new(MarketDataCache::new());

        let portfolio_client = Arc::new(PortfolioClient::new(&config.server.base_url)?);
        let positions = Arc::new(PositionsView::new(portfolio_client.clone()));
        let orders = OrderGateway::new(portfolio_client);

        let app = Self {
            config,
            channel,
            registry,
            cache,
            positions,
            orders,
        };
        app.wire_handlers();
        Ok(app)
    }

    /// Route push topics into the cache and hook reconnect recovery.
    fn wire_handlers(&self) {
        let cache = self.cache.clone();
        self.channel.on(Topic::MarketData, move |event| {
            match cache.apply_market_data(&event.data) {
                Ok(symbol) => tracing::debug!(%symbol, "Market data applied"),
                Err(e) => warn!(error = %e, "Dropping malformed market_data event"),
            }
        });

        let cache = self.cache.clone();
        self.channel.on(Topic::ChartData, move |event| {
            if let Err(e) = cache.apply_chart_data(&event.data) {
                warn!(error = %e, "Dropping malformed chart_data event");
            }
        });

        let cache = self.cache.clone();
        self.channel.on(Topic::Update, move |event| {
            if let Err(e) = cache.apply_update(&event.data) {
                warn!(error = %e, "Dropping malformed update event");
            }
        });

        // Push frames missed while disconnected are gone; on (re)connect the
        // authoritative state is re-pulled instead of replayed.
        let registry = self.registry.clone();
        let positions = self.positions.clone();
        self.channel.on(Topic::Connected, move |_event| {
            let registry = registry.clone();
            let positions = positions.clone();
            tokio::spawn(async move {
                if let Err(e) = registry.refresh().await {
                    warn!(error = %e, "Watch-list refresh after connect failed");
                }
                positions.refresh_all().await;
            });
        });
    }

    /// Add a symbol to the watch-list. Returns whether it was newly added.
    pub fn add_symbol(&self, symbol: &str) -> AppResult<bool> {
        Ok(self.registry.add(symbol)?)
    }

    /// Remove a symbol from the watch-list and drop its cached market data,
    /// so a re-added symbol starts from fresh server state.
    pub fn remove_symbol(&self, symbol: &str) -> AppResult<bool> {
        let symbol = Symbol::new(symbol)?;
        let removed = self.registry.delete(&symbol);
        if removed {
            self.cache.evict(&symbol);
        }
        Ok(removed)
    }

    /// Current watch-list snapshot.
    pub fn watch_list(&self) -> Vec<Symbol> {
        self.registry.list()
    }

    /// Subscribe to watch-list synchronization outcomes.
    pub fn registry_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.registry.subscribe()
    }

    /// Current portfolio snapshot.
    pub fn portfolio(&self) -> PortfolioSnapshot {
        self.positions.snapshot()
    }

    pub fn cache(&self) -> &Arc<MarketDataCache> {
        &self.cache
    }

    pub async fn buy(&self, symbol: &str) -> AppResult<()> {
        let symbol = Symbol::new(symbol)?;
        Ok(self.orders.buy(&symbol).await?)
    }

    pub async fn sell(&self, symbol: &str) -> AppResult<()> {
        let symbol = Symbol::new(symbol)?;
        Ok(self.orders.sell(&symbol).await?)
    }

    /// Run until Ctrl-C.
    pub async fn run(&self) -> AppResult<()> {
        self.channel.connect();

        let registry = self.registry.clone();
        let worker = tokio::spawn(async move { registry.run().await });

        let poll_interval = Duration::from_millis(self.config.portfolio.poll_interval_ms);
        let mut ticker = tokio::time::interval(poll_interval);

        info!(
            poll_interval_ms = self.config.portfolio.poll_interval_ms,
            "Application running"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.positions.refresh_all().await;
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Ctrl-C handler failed, shutting down");
                    } else {
                        info!("Shutdown requested");
                    }
                    break;
                }
            }
        }

        self.shutdown().await;
        let _ = worker.await;
        Ok(())
    }

    /// Tear everything down. After this returns no handler fires, no sync
    /// push is scheduled and no portfolio pull result is applied.
    pub async fn shutdown(&self) {
        self.registry.shutdown();
        self.positions.deactivate();
        self.channel.disconnect().await;
        info!("Application stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn app() -> Application {
        Application::new(AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_watch_list_edits_apply_locally() {
        let app = app();
        assert!(app.add_symbol("aapl").unwrap());
        assert!(!app.add_symbol("AAPL").unwrap());
        assert_eq!(app.watch_list().len(), 1);
        assert_eq!(app.watch_list()[0].as_str(), "AAPL");

        assert!(app.remove_symbol("AAPL").unwrap());
        assert!(!app.remove_symbol("AAPL").unwrap());
        assert!(app.watch_list().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_rejected() {
        let app = app();
        assert!(matches!(app.add_symbol(""), Err(AppError::Symbol(_))));
        assert!(matches!(app.add_symbol("A B"), Err(AppError::Symbol(_))));
        assert!(app.watch_list().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let app = app();
        app.shutdown().await;
        app.shutdown().await;
    }
}
