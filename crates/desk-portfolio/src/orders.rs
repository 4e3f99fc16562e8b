//! Order issuance and last-result tracking.

use crate::client::PortfolioClient;
use crate::error::{PortfolioError, PortfolioResult};
use chrono::{DateTime, Utc};
use desk_core::Symbol;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Accepted,
    Rejected { reason: String },
}

/// Record of the most recently submitted order.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub side: OrderSide,
    pub symbol: Symbol,
    pub outcome: OrderOutcome,
    pub at: DateTime<Utc>,
}

/// Submits market orders and remembers the last outcome for display.
pub struct OrderGateway {
    client: Arc<PortfolioClient>,
    last: RwLock<Option<OrderRecord>>,
}

impl OrderGateway {
    pub fn new(client: Arc<PortfolioClient>) -> Self {
        Self {
            client,
            last: RwLock::new(None),
        }
    }

    pub async fn buy(&self, symbol: &Symbol) -> PortfolioResult<()> {
        self.submit(OrderSide::Buy, symbol).await
    }

    pub async fn sell(&self, symbol: &Symbol) -> PortfolioResult<()> {
        self.submit(OrderSide::Sell, symbol).await
    }

    /// Outcome of the most recent submission, if any.
    pub fn last_result(&self) -> Option<OrderRecord> {
        self.last.read().clone()
    }

    async fn submit(&self, side: OrderSide, symbol: &Symbol) -> PortfolioResult<()> {
        let result = match side {
            OrderSide::Buy => self.client.buy(symbol).await,
            OrderSide::Sell => self.client.sell(symbol).await,
        };

        let outcome = match &result {
            Ok(()) => {
                info!(%side, %symbol, "Order accepted");
                OrderOutcome::Accepted
            }
            Err(PortfolioError::OrderRejected(reason)) => {
                warn!(%side, %symbol, reason, "Order rejected");
                OrderOutcome::Rejected {
                    reason: reason.clone(),
                }
            }
            Err(e) => {
                warn!(%side, %symbol, error = %e, "Order submission failed");
                OrderOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        };

        *self.last.write() = Some(OrderRecord {
            side,
            symbol: symbol.clone(),
            outcome,
            at: Utc::now(),
        });

        result
    }
}
