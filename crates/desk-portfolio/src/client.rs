//! HTTP client for the portfolio REST surface.
//!
//! Transport errors are retried once; server-side failures are not (the
//! caller decides whether to surface or re-pull). All requests share one
//! conservative timeout so a hung pull degrades to a per-field error instead
//! of a stuck view.

use crate::error::{PortfolioError, PortfolioResult};
use desk_core::{AssetInfo, HistoryPoint, Position, Symbol};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for REST requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `{"total_value": ...}` response body.
#[derive(Debug, Deserialize)]
struct TotalValueBody {
    total_value: Decimal,
}

/// `{"cash": ...}` response body (both cash endpoints use it).
#[derive(Debug, Deserialize)]
struct CashBody {
    cash: Decimal,
}

/// `{"history": [...]}` response body.
#[derive(Debug, Deserialize)]
struct HistoryBody {
    history: Vec<HistoryPoint>,
}

/// Per-symbol position entry; the wire keys the map by symbol.
#[derive(Debug, Deserialize)]
struct RawPosition {
    shares: Decimal,
    buy_price: Decimal,
    #[serde(default)]
    current_price: Decimal,
    #[serde(default)]
    pl: Decimal,
}

/// Client for the portfolio REST endpoints.
pub struct PortfolioClient {
    client: Client,
    base_url: String,
}

impl PortfolioClient {
    /// Create a client for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> PortfolioResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| PortfolioError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET `path` and decode a JSON body, retrying once on transport errors.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> PortfolioResult<T> {
        match self.get_json_once(path).await {
            Err(PortfolioError::Transport(e)) => {
                warn!(path, error = %e, "Portfolio pull failed, retrying once");
                self.get_json_once(path).await
            }
            other => other,
        }
    }

    async fn get_json_once<T: serde::de::DeserializeOwned>(&self, path: &str) -> PortfolioResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| PortfolioError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortfolioError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PortfolioError::MalformedResponse(e.to_string()))
    }

    /// List positions. The wire shape is a map `symbol -> entry`; returned
    /// sorted by symbol for stable display.
    pub async fn positions(&self) -> PortfolioResult<Vec<Position>> {
        let raw: HashMap<String, RawPosition> = self.get_json("/portfolio/positions").await?;

        let mut positions = Vec::with_capacity(raw.len());
        for (name, entry) in raw {
            let symbol = Symbol::new(&name)
                .map_err(|e| PortfolioError::MalformedResponse(format!("position key: {e}")))?;
            positions.push(Position {
                symbol,
                shares: entry.shares,
                buy_price: entry.buy_price,
                current_price: entry.current_price,
                pl: entry.pl,
            });
        }
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    /// Total portfolio value.
    pub async fn total_value(&self) -> PortfolioResult<Decimal> {
        let body: TotalValueBody = self.get_json("/portfolio/get_total_value").await?;
        Ok(body.total_value)
    }

    /// Available cash. Falls back to the `get_buying_power` spelling when the
    /// server does not expose `get_cash`.
    pub async fn cash(&self) -> PortfolioResult<Decimal> {
        match self.get_json::<CashBody>("/portfolio/get_cash").await {
            Ok(body) => Ok(body.cash),
            Err(PortfolioError::Status { status: 404, .. }) => {
                debug!("get_cash not found, falling back to get_buying_power");
                let body: CashBody = self.get_json("/portfolio/get_buying_power").await?;
                Ok(body.cash)
            }
            Err(e) => Err(e),
        }
    }

    /// Price history for a symbol.
    pub async fn history(&self, symbol: &Symbol) -> PortfolioResult<Vec<HistoryPoint>> {
        let body: HistoryBody = self
            .get_json(&format!("/portfolio/get_history/{symbol}"))
            .await?;
        Ok(body.history)
    }

    /// Static asset metadata for a symbol.
    pub async fn asset_info(&self, symbol: &Symbol) -> PortfolioResult<AssetInfo> {
        self.get_json(&format!("/portfolio/get_asset_info/{symbol}"))
            .await
    }

    /// Issue a buy command. Any non-success response is an order rejection.
    pub async fn buy(&self, symbol: &Symbol) -> PortfolioResult<()> {
        self.command("/portfolio/buy", symbol).await
    }

    /// Issue a sell command. Any non-success response is an order rejection.
    pub async fn sell(&self, symbol: &Symbol) -> PortfolioResult<()> {
        self.command("/portfolio/sell", symbol).await
    }

    async fn command(&self, path: &str, symbol: &Symbol) -> PortfolioResult<()> {
        let response = self
            .client
            .post(self.url(path))
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await
            .map_err(|e| PortfolioError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortfolioError::OrderRejected(rejection_reason(
                status.as_u16(),
                &body,
            )));
        }
        Ok(())
    }
}

/// Human-readable rejection reason from a command response.
fn rejection_reason(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    // Servers that explain themselves do so either as JSON or plain text.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "reason"] {
            if let Some(reason) = value.get(key).and_then(|v| v.as_str()) {
                return reason.to_string();
            }
        }
    }
    body.to_string()
}
