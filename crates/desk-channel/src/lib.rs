//! Push-channel client for the desk dashboard.
//!
//! Maintains exactly one logical connection to the server's event stream:
//! - Typed topic subscription (`on`/`off` with handler ids)
//! - Automatic reconnection with exponential backoff and jitter
//! - Cancellation-safe teardown (no events delivered after `disconnect`)
//! - Malformed frames dropped with a diagnostic, never breaking the stream

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod message;

pub use channel::{ChannelConfig, ConnectionState, EventChannel};
pub use dispatcher::{Dispatcher, HandlerId};
pub use error::{ChannelError, ChannelResult};
pub use message::{decode_frame, PushEvent, Topic};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any push-channel connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
