//! Push-channel connection lifecycle.
//!
//! Owns one logical connection: a background task that connects, reads
//! frames, dispatches them, and reconnects with exponential backoff until
//! `disconnect` is called. The channel instance is explicitly owned by the
//! dashboard lifecycle; there is no process-wide singleton.

use crate::dispatcher::{Dispatcher, HandlerId};
use crate::error::ChannelError;
use crate::message::{decode_frame, PushEvent, Topic};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Push-channel URL (e.g., "ws://localhost:5000/stream").
    pub url: String,
    /// Base delay for exponential reconnect backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential reconnect backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// How a session ended.
enum SessionEnd {
    /// `disconnect()` was called; do not reconnect.
    Shutdown,
    /// Connection lost; reconnect.
    Lost(ChannelError),
}

/// Push-channel client.
pub struct EventChannel {
    config: ChannelConfig,
    state: Arc<RwLock<ConnectionState>>,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
    started: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventChannel {
    /// Create a new, not-yet-connected channel.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            dispatcher: Arc::new(Dispatcher::new()),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Subscribe a handler to a topic.
    pub fn on<F>(&self, topic: Topic, handler: F) -> HandlerId
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.dispatcher.on(topic, handler)
    }

    /// Unsubscribe a handler. Unknown ids are a no-op.
    pub fn off(&self, topic: Topic, id: HandlerId) {
        self.dispatcher.off(topic, id);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether `disconnect()` has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Start the connection task.
    ///
    /// Idempotent: the first call spawns the background task, later calls are
    /// no-ops. A channel that has been `disconnect()`ed stays down; create a
    /// new instance to reconnect.
    pub fn connect(&self) {
        if self.is_shutdown() {
            warn!("connect() called on a disconnected channel, ignoring");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("connect() called while already running, ignoring");
            return;
        }

        let config = self.config.clone();
        let state = self.state.clone();
        let dispatcher = self.dispatcher.clone();
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(run_loop(config, state, dispatcher, shutdown));
        *self.task.lock() = Some(handle);
    }

    /// Tear the channel down.
    ///
    /// Cancels the connection task (including one that is mid-backoff) and
    /// waits for it to exit, so no handler receives an event after this
    /// returns.
    pub async fn disconnect(&self) {
        self.shutdown.cancel();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(?e, "Push-channel task panicked during disconnect");
            }
        }
        *self.state.write() = ConnectionState::Disconnected;
        info!("Push channel disconnected");
    }
}

/// Connection loop: connect, read until lost, back off, repeat.
async fn run_loop(
    config: ChannelConfig,
    state: Arc<RwLock<ConnectionState>>,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        *state.write() = if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        };

        match connect_async(&config.url).await {
            Ok((ws, _response)) => {
                attempt = 0;
                *state.write() = ConnectionState::Connected;
                info!(url = %config.url, "Push channel connected");
                emit_unless_cancelled(&dispatcher, &shutdown, Topic::Connected);

                match read_session(ws, &dispatcher, &shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Lost(e) => {
                        warn!(error = %e, "Push channel connection lost");
                        emit_unless_cancelled(&dispatcher, &shutdown, Topic::Disconnected);
                    }
                }
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "Push channel connect failed");
            }
        }

        if shutdown.is_cancelled() {
            break;
        }

        attempt += 1;
        let delay = backoff_delay(
            config.reconnect_base_delay_ms,
            config.reconnect_max_delay_ms,
            attempt,
        );
        warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting push channel");

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = shutdown.cancelled() => break,
        }
    }

    *state.write() = ConnectionState::Disconnected;
}

/// Read frames until the connection drops or shutdown is requested.
async fn read_session(
    mut ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    dispatcher: &Dispatcher,
    shutdown: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                // Best-effort graceful close; the transport is dropped either way.
                let _ = ws.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }

            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(&text, dispatcher, shutdown);
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return SessionEnd::Lost(e.into());
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    return SessionEnd::Lost(ChannelError::ConnectionClosed { code, reason });
                }
                Some(Err(e)) => {
                    return SessionEnd::Lost(e.into());
                }
                None => {
                    return SessionEnd::Lost(ChannelError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
                _ => {}
            }
        }
    }
}

/// Decode and dispatch one frame. Malformed frames are dropped with a
/// diagnostic; they never propagate out of the dispatch path.
fn handle_frame(text: &str, dispatcher: &Dispatcher, shutdown: &CancellationToken) {
    match decode_frame(text) {
        Ok(event) => {
            if !shutdown.is_cancelled() {
                dispatcher.emit(&event);
            }
        }
        Err(e) => {
            warn!(error = %e, "Dropping malformed push frame");
        }
    }
}

fn emit_unless_cancelled(dispatcher: &Dispatcher, shutdown: &CancellationToken, topic: Topic) {
    if !shutdown.is_cancelled() {
        dispatcher.emit(&PushEvent::lifecycle(topic));
    }
}

/// Exponential backoff: base * 2^(attempt-1) plus 0-1000ms jitter, capped so
/// the configured maximum is a true upper bound.
fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent);
    Duration::from_millis(delay.saturating_add(jitter_ms()).min(max_ms))
}

/// Random jitter (0-1000ms) without pulling in an RNG crate.
fn jitter_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}
