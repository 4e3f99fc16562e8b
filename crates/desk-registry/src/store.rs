//! Remote watch-list store.
//!
//! The registry talks to the server through the `SymbolStore` trait so the
//! synchronization protocol is testable against an in-memory store. The real
//! implementation is a thin reqwest client over `GET/POST /symbols`.

use crate::error::{RegistryError, RegistryResult};
use desk_core::Symbol;
use reqwest::Client;
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;
use tracing::warn;

/// Default timeout for REST requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Remote watch-list store.
pub trait SymbolStore: Send + Sync {
    /// Fetch the authoritative watch-list.
    fn fetch(&self) -> BoxFuture<'_, RegistryResult<Vec<Symbol>>>;

    /// Replace the server's watch-list with `symbols` (full replace, not a
    /// diff; no incremental endpoint exists).
    fn replace(&self, symbols: Vec<Symbol>) -> BoxFuture<'_, RegistryResult<()>>;
}

/// `POST /symbols` request body.
#[derive(Debug, Serialize)]
struct ReplaceBody {
    symbols: Vec<Symbol>,
}

/// REST-backed symbol store.
pub struct RestSymbolStore {
    client: Client,
    base_url: String,
}

impl RestSymbolStore {
    /// Create a store for the given server base URL (e.g.,
    /// "http://localhost:5000").
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn symbols_url(&self) -> String {
        format!("{}/symbols", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_once(&self) -> RegistryResult<Vec<Symbol>> {
        let response = self
            .client
            .get(self.symbols_url())
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Rejected(format!("HTTP {status}: {body}")));
        }

        let names: Vec<String> = response
            .json()
            .await
            .map_err(|e| RegistryError::MalformedResponse(e.to_string()))?;

        // The server is authoritative; an entry it holds that we cannot
        // represent is dropped with a diagnostic, not a hard failure.
        let mut symbols = Vec::with_capacity(names.len());
        for name in &names {
            match Symbol::new(name) {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => warn!(symbol = %name, error = %e, "Skipping invalid server symbol"),
            }
        }
        Ok(symbols)
    }

    async fn replace_once(&self, symbols: &[Symbol]) -> RegistryResult<()> {
        let body = ReplaceBody {
            symbols: symbols.to_vec(),
        };
        let response = self
            .client
            .post(self.symbols_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Rejected(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }
}

impl SymbolStore for RestSymbolStore {
    fn fetch(&self) -> BoxFuture<'_, RegistryResult<Vec<Symbol>>> {
        Box::pin(async move {
            match self.fetch_once().await {
                Err(RegistryError::Transport(e)) => {
                    warn!(error = %e, "Watch-list fetch failed, retrying once");
                    self.fetch_once().await
                }
                other => other,
            }
        })
    }

    fn replace(&self, symbols: Vec<Symbol>) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            match self.replace_once(&symbols).await {
                Err(RegistryError::Transport(e)) => {
                    warn!(error = %e, "Watch-list push failed, retrying once");
                    self.replace_once(&symbols).await
                }
                other => other,
            }
        })
    }
}
