//! JSON shapes exchanged with the terminal bridge.

use serde::{Deserialize, Serialize};

use crate::source::Diagnostic;

/// Every bridge reply: the call's return value (`null` on failure) plus the
/// terminal's last error as `[code, "message"]`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub last_error: Option<(i32, String)>,
}

impl<T> Envelope<T> {
    pub fn into_parts(self) -> (Option<T>, Diagnostic) {
        let diagnostic = match self.last_error {
            Some((code, message)) => Diagnostic::new(code, message),
            None => Diagnostic::ok(),
        };
        (self.result, diagnostic)
    }
}

#[derive(Debug, Serialize)]
pub struct InitializeRequest<'a> {
    pub login: u64,
    pub password: &'a str,
    pub server: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SymbolSelectRequest<'a> {
    pub symbol: &'a str,
    pub enable: bool,
}

/// `date_from` and `date_to` are UTC epoch seconds.
#[derive(Debug, Serialize)]
pub struct RatesRangeRequest<'a> {
    pub symbol: &'a str,
    pub timeframe: &'static str,
    pub date_from: i64,
    pub date_to: i64,
}

#[derive(Debug, Serialize)]
pub struct TicksRangeRequest<'a> {
    pub symbol: &'a str,
    pub date_from: i64,
    pub date_to: i64,
    pub flags: &'static str,
}
