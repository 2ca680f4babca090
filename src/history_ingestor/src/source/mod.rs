//! Contract of the trading terminal the engine reads history from.
//!
//! The terminal is a single stateful session: one login, one symbol
//! subscription context, one request in flight at a time. [`TerminalSource`]
//! exposes exactly the calls the engine needs and nothing more. Timestamps on
//! the wire are UTC epoch seconds; translating to and from the caller's local
//! clock is the engine's job, not the source's.
//!
//! Range requests answer with a [`RangeReply`] so that "no rows in range" and
//! "the call failed" stay distinguishable all the way up to the policy that
//! decides what to do with them.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chrono::{DateTime, Utc};
//! use history_ingestor::models::granularity::Granularity;
//! use history_ingestor::session::registry::ConnectionProfile;
//! use history_ingestor::source::{
//!     Diagnostic, RangeReply, RawRate, RawTick, SymbolInfo, TerminalInfo, TerminalSource,
//! };
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl TerminalSource for Offline {
//!     fn name(&self) -> &'static str {
//!         "offline"
//!     }
//!     async fn initialize(&mut self, _p: &ConnectionProfile) -> Result<TerminalInfo, Diagnostic> {
//!         Err(Diagnostic::new(Diagnostic::INTERNAL_FAIL_CONNECT, "no terminal"))
//!     }
//!     async fn shutdown(&mut self) {}
//!     async fn symbol_select(&mut self, _s: &str) -> Result<(), Diagnostic> {
//!         Ok(())
//!     }
//!     async fn copy_rates_range(
//!         &mut self,
//!         _s: &str,
//!         _g: Granularity,
//!         _from: DateTime<Utc>,
//!         _to: DateTime<Utc>,
//!     ) -> RangeReply<RawRate> {
//!         RangeReply::Empty(Diagnostic::ok())
//!     }
//!     async fn copy_ticks_range(
//!         &mut self,
//!         _s: &str,
//!         _from: DateTime<Utc>,
//!         _to: DateTime<Utc>,
//!     ) -> RangeReply<RawTick> {
//!         RangeReply::Empty(Diagnostic::ok())
//!     }
//!     async fn symbols(&mut self) -> Result<Vec<SymbolInfo>, Diagnostic> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod bridge;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{models::granularity::Granularity, session::registry::ConnectionProfile};

/// The terminal's own error report: a numeric result code plus description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: i32,
    pub message: String,
}

impl Diagnostic {
    pub const OK: i32 = 1;
    pub const FAIL: i32 = -1;
    pub const INVALID_PARAMS: i32 = -2;
    pub const NOT_FOUND: i32 = -4;
    pub const AUTH_FAILED: i32 = -6;
    pub const INTERNAL_FAIL_SEND: i32 = -10001;
    pub const INTERNAL_FAIL_RECEIVE: i32 = -10002;
    pub const INTERNAL_FAIL_CONNECT: i32 = -10004;
    pub const INTERNAL_FAIL_TIMEOUT: i32 = -10005;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(Self::OK, "Success")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.code, self.message)
    }
}

/// Outcome of a range request.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeReply<T> {
    /// The request succeeded and produced rows.
    Rows(Vec<T>),
    /// The request succeeded but the range holds no rows.
    Empty(Diagnostic),
    /// The terminal returned its failure sentinel.
    Failed(Diagnostic),
}

/// Session metadata reported by a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalInfo {
    /// Signed offset of the server clock from UTC, in seconds.
    pub timezone_offset_secs: i64,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
}

/// One bar exactly as the terminal reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRate {
    /// Bar open time, UTC epoch seconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    #[serde(default)]
    pub spread: i32,
    #[serde(default)]
    pub real_volume: u64,
}

/// One tick exactly as the terminal reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTick {
    /// UTC epoch seconds.
    pub time: i64,
    pub bid: f64,
    pub ask: f64,
    #[serde(default)]
    pub last: f64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub flags: u32,
}

/// An instrument known to the terminal. `path` is the backslash-separated
/// group path, e.g. `Forex\Majors\EURUSD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(default)]
    pub path: String,
}

impl SymbolInfo {
    /// First segment of `path`, the top-level group.
    pub fn group(&self) -> &str {
        self.path.split('\\').next().unwrap_or("")
    }
}

/// A live connection to a trading terminal.
///
/// Implementations are driven by one caller at a time (`&mut self`) and must
/// never be asked to serve overlapping requests.
#[async_trait]
pub trait TerminalSource: Send {
    /// Human-readable name identifying this source (e.g. `"bridge"`).
    fn name(&self) -> &'static str;

    /// Logs in with `profile` and reports session metadata.
    async fn initialize(&mut self, profile: &ConnectionProfile)
    -> Result<TerminalInfo, Diagnostic>;

    /// Ends the session. Calling it on a closed session does nothing.
    async fn shutdown(&mut self);

    /// Makes `symbol` available for data requests.
    async fn symbol_select(&mut self, symbol: &str) -> Result<(), Diagnostic>;

    /// Bars whose open time lies in `from ..= to`.
    async fn copy_rates_range(
        &mut self,
        symbol: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawRate>;

    /// Ticks whose time lies in `from ..= to`.
    async fn copy_ticks_range(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawTick>;

    /// Every symbol the terminal knows about.
    async fn symbols(&mut self) -> Result<Vec<SymbolInfo>, Diagnostic>;
}
