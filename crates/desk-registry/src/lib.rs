//! Watch-list registry for the desk dashboard.
//!
//! Single source of truth for the local watch-list. User edits are applied
//! optimistically and pushed to the server as debounced full-list replaces,
//! with at most one push in flight; edits that arrive mid-push are re-sent
//! with the latest state once the in-flight push resolves.

pub mod error;
pub mod registry;
pub mod store;

pub use error::{RegistryError, RegistryResult};
pub use registry::{RegistryConfig, RegistryEvent, SymbolRegistry};
pub use store::{BoxFuture, RestSymbolStore, SymbolStore};
