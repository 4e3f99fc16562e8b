//! Watch-list registry and its synchronization worker.
//!
//! Every local edit bumps a version and signals the worker over a `watch`
//! channel. The worker debounces, then pushes the entire current list.
//! Single-flight is structural: one worker, one push at a time. Edits that
//! land during a push advance the version; the worker re-pushes immediately
//! after the in-flight push resolves, so the server always converges on the
//! latest local state without interleaved requests.

use crate::error::RegistryResult;
use crate::store::SymbolStore;
use desk_core::Symbol;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Debounce window for coalescing edit bursts into one push.
    pub debounce_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

/// Synchronization outcome notifications for observers (the UI layer).
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// The server accepted a full-list push of `symbols` entries.
    Synced { symbols: usize },
    /// The server rejected a push. Local state is retained (optimistic UI)
    /// until the next successful push or an explicit `refresh`.
    SyncFailed { reason: String },
}

#[derive(Debug, Default)]
struct WatchState {
    symbols: Vec<Symbol>,
    version: u64,
}

/// Single source of truth for the local watch-list.
pub struct SymbolRegistry {
    store: Arc<dyn SymbolStore>,
    state: RwLock<WatchState>,
    dirty_tx: watch::Sender<u64>,
    events_tx: broadcast::Sender<RegistryEvent>,
    debounce: Duration,
    shutdown: CancellationToken,
    /// Bumped by every `refresh`. A push that overlaps a refresh overwrote
    /// the adopted server state; the worker re-pushes to reconcile.
    refresh_epoch: AtomicU64,
}

impl SymbolRegistry {
    pub fn new(store: Arc<dyn SymbolStore>, config: RegistryConfig) -> Self {
        let (dirty_tx, _) = watch::channel(0u64);
        let (events_tx, _) = broadcast::channel(32);
        Self {
            store,
            state: RwLock::new(WatchState::default()),
            dirty_tx,
            events_tx,
            debounce: Duration::from_millis(config.debounce_ms),
            shutdown: CancellationToken::new(),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    /// Add a symbol. Returns `Ok(true)` if appended (a sync is scheduled),
    /// `Ok(false)` if it was already present (duplicate add is a no-op, not
    /// an error surfaced to the user). Invalid input is an error.
    pub fn add(&self, symbol: &str) -> desk_core::Result<bool> {
        Ok(self.insert(Symbol::new(symbol)?))
    }

    /// Add an already-validated symbol. Returns whether it was newly
    /// appended (a sync is scheduled); duplicates are a logged no-op.
    pub fn insert(&self, symbol: Symbol) -> bool {
        let version = {
            let mut state = self.state.write();
            if state.symbols.contains(&symbol) {
                debug!(symbol = %symbol, "Duplicate add ignored");
                return false;
            }
            state.symbols.push(symbol);
            state.version += 1;
            state.version
        };
        self.dirty_tx.send_replace(version);
        true
    }

    /// Remove a symbol. Returns `Ok(true)` if removed (a sync is scheduled),
    /// `Ok(false)` if it was not present.
    pub fn remove(&self, symbol: &str) -> desk_core::Result<bool> {
        Ok(self.delete(&Symbol::new(symbol)?))
    }

    /// Remove an already-validated symbol. Returns whether it was present.
    pub fn delete(&self, symbol: &Symbol) -> bool {
        let version = {
            let mut state = self.state.write();
            let before = state.symbols.len();
            state.symbols.retain(|s| s != symbol);
            if state.symbols.len() == before {
                debug!(symbol = %symbol, "Remove of absent symbol ignored");
                return false;
            }
            state.version += 1;
            state.version
        };
        self.dirty_tx.send_replace(version);
        true
    }

    /// Snapshot of the current ordered watch-list (copy semantics).
    pub fn list(&self) -> Vec<Symbol> {
        self.state.read().symbols.clone()
    }

    /// Subscribe to synchronization outcome events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events_tx.subscribe()
    }

    /// Pull the authoritative list from the server and replace local state.
    ///
    /// Used at startup and to recover from a rejected push. Does not bump the
    /// version: adopting server state schedules no push back. A push already
    /// in flight when the refresh lands overwrites the server with pre-refresh
    /// state; the worker detects the overlap and re-pushes once to reconcile.
    pub async fn refresh(&self) -> RegistryResult<Vec<Symbol>> {
        let symbols = self.store.fetch().await?;
        info!(count = symbols.len(), "Watch-list refreshed from server");
        self.state.write().symbols = symbols.clone();
        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
        Ok(symbols)
    }

    /// Stop the synchronization worker. A pending debounce never fires after
    /// this; an in-flight push may complete but schedules nothing further.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run the synchronization worker until `shutdown`.
    ///
    /// Intended to be spawned once alongside the owning application.
    pub async fn run(&self) {
        let mut dirty_rx = self.dirty_tx.subscribe();
        // Highest version already pushed. A rejected push also advances this:
        // it is not retried until the next edit or an explicit refresh.
        let mut last_attempted = 0u64;

        loop {
            // Wait for a version we have not pushed yet. Compared by value,
            // not by change notification: edits made before this worker first
            // polls must still trigger a push.
            loop {
                if self.shutdown.is_cancelled() {
                    return;
                }
                if *dirty_rx.borrow_and_update() != last_attempted {
                    break;
                }
                tokio::select! {
                    () = self.shutdown.cancelled() => return,
                    changed = dirty_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            // Debounce: let the burst of edits settle into a single push.
            tokio::select! {
                () = self.shutdown.cancelled() => return,
                () = tokio::time::sleep(self.debounce) => {}
            }

            // Push until converged on the latest local state. Single-flight
            // is structural: this is the only task that pushes.
            loop {
                if self.shutdown.is_cancelled() {
                    return;
                }

                let epoch = self.refresh_epoch.load(Ordering::SeqCst);
                let (version, symbols) = {
                    let state = self.state.read();
                    (state.version, state.symbols.clone())
                };
                last_attempted = version;

                debug!(version, count = symbols.len(), "Pushing watch-list");
                match self.store.replace(symbols.clone()).await {
                    Ok(()) => {
                        let _ = self.events_tx.send(RegistryEvent::Synced {
                            symbols: symbols.len(),
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Watch-list push rejected, keeping local state");
                        let _ = self.events_tx.send(RegistryEvent::SyncFailed {
                            reason: e.to_string(),
                        });
                    }
                }

                // Edits or a refresh captured while the push was in flight:
                // the server no longer matches local state, re-push
                // immediately with the latest state, no debounce.
                if self.state.read().version != version
                    || self.refresh_epoch.load(Ordering::SeqCst) != epoch
                {
                    continue;
                }
                break;
            }
        }
    }
}
