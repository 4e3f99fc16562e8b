//! Ticker symbol newtype.
//!
//! Symbols are normalized to uppercase on construction so that "aapl" and
//! "AAPL" compare equal everywhere (watch-list set semantics depend on this).

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized uppercase ticker symbol (e.g., "AAPL", "BRK.B").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, trimming whitespace and uppercasing.
    ///
    /// Rejects empty input and anything that is not a plausible ticker
    /// (ASCII alphanumerics plus `.` and `-`).
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(CoreError::InvalidSymbol(normalized));
        }
        Ok(Self(normalized))
    }

    /// Borrow the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
