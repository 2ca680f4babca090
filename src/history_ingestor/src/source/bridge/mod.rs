//! [`TerminalSource`] over HTTP, talking to a bridge process that sits next to
//! the terminal and forwards each call to it.
//!
//! Endpoints (all JSON, all answering with an [`wire::Envelope`]):
//!
//! | call               | method | path                |
//! |--------------------|--------|---------------------|
//! | `initialize`       | POST   | `/initialize`       |
//! | `shutdown`         | POST   | `/shutdown`         |
//! | `symbol_select`    | POST   | `/symbol_select`    |
//! | `copy_rates_range` | POST   | `/copy_rates_range` |
//! | `copy_ticks_range` | POST   | `/copy_ticks_range` |
//! | `symbols`          | GET    | `/symbols`          |
//!
//! Transport problems never surface as HTTP errors: they are mapped onto the
//! terminal's own internal failure codes so callers see a single diagnostic
//! vocabulary.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Url};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use tracing::{debug, warn};

use crate::{
    config::BridgeConfig,
    models::granularity::Granularity,
    session::registry::ConnectionProfile,
    source::{Diagnostic, RangeReply, RawRate, RawTick, SymbolInfo, TerminalInfo, TerminalSource},
};

use self::wire::{
    Envelope, InitializeRequest, RatesRangeRequest, SymbolSelectRequest, TicksRangeRequest,
};

/// Errors that can occur while creating a [`BridgeSource`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BridgeInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The base URL cannot be parsed or cannot carry paths.
    #[snafu(display("Invalid bridge base URL: {url:?}"))]
    InvalidBaseUrl { url: String, backtrace: Backtrace },

    /// No `[bridge]` section was configured.
    #[snafu(display("No bridge configured"))]
    MissingConfig { backtrace: Backtrace },
}

pub struct BridgeSource {
    client: Client,
    base_url: Url,
}

impl BridgeSource {
    /// Creates a bridge source for `base_url`, e.g. `http://127.0.0.1:8222`.
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, BridgeInitError> {
        let mut base = Url::parse(base_url.trim())
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .context(InvalidBaseUrlSnafu { url: base_url })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base,
        })
    }

    pub fn from_config(config: Option<&BridgeConfig>) -> Result<Self, BridgeInitError> {
        let config = config.context(MissingConfigSnafu)?;
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn call<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<(Option<T>, Diagnostic), Diagnostic>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(endpoint).map_err(|e| {
            Diagnostic::new(Diagnostic::INVALID_PARAMS, format!("bad endpoint {endpoint}: {e}"))
        })?;

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown bridge error".to_string());
            return Err(Diagnostic::new(
                Diagnostic::INTERNAL_FAIL_RECEIVE,
                format!("bridge answered {status}: {text}"),
            ));
        }

        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(transport_failure)?;
        Ok(envelope.into_parts())
    }

    async fn range<B, T>(&self, endpoint: &str, body: &B) -> RangeReply<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        match self.call::<B, Vec<T>>(Method::POST, endpoint, Some(body)).await {
            Ok((Some(rows), _)) if !rows.is_empty() => RangeReply::Rows(rows),
            Ok((Some(_), diagnostic)) => RangeReply::Empty(diagnostic),
            Ok((None, diagnostic)) => RangeReply::Failed(or_fail(diagnostic, endpoint)),
            Err(diagnostic) => RangeReply::Failed(diagnostic),
        }
    }
}

fn transport_failure(e: reqwest::Error) -> Diagnostic {
    let code = if e.is_timeout() {
        Diagnostic::INTERNAL_FAIL_TIMEOUT
    } else if e.is_connect() {
        Diagnostic::INTERNAL_FAIL_CONNECT
    } else if e.is_decode() || e.is_body() {
        Diagnostic::INTERNAL_FAIL_RECEIVE
    } else {
        Diagnostic::INTERNAL_FAIL_SEND
    };
    Diagnostic::new(code, e.to_string())
}

/// Failure diagnostic for a `null` result that came without an error code.
fn or_fail(diagnostic: Diagnostic, call: &str) -> Diagnostic {
    if diagnostic.code == Diagnostic::OK {
        Diagnostic::new(Diagnostic::FAIL, format!("{call} returned no result"))
    } else {
        diagnostic
    }
}

#[async_trait]
impl TerminalSource for BridgeSource {
    fn name(&self) -> &'static str {
        "bridge"
    }

    async fn initialize(&mut self, profile: &ConnectionProfile) -> Result<TerminalInfo, Diagnostic> {
        let body = InitializeRequest {
            login: profile.login,
            password: profile.password.expose_secret(),
            server: &profile.server,
            path: profile
                .terminal_path
                .as_ref()
                .map(|p| p.display().to_string()),
        };
        debug!(mode = %profile.mode, server = %profile.server, "initializing terminal");
        match self.call(Method::POST, "initialize", Some(&body)).await? {
            (Some(info), _) => Ok(info),
            (None, diagnostic) => Err(or_fail(diagnostic, "initialize")),
        }
    }

    async fn shutdown(&mut self) {
        let reply = self
            .call::<(), serde_json::Value>(Method::POST, "shutdown", None)
            .await;
        if let Err(diagnostic) = reply {
            warn!(%diagnostic, "terminal shutdown failed");
        }
    }

    async fn symbol_select(&mut self, symbol: &str) -> Result<(), Diagnostic> {
        let body = SymbolSelectRequest {
            symbol,
            enable: true,
        };
        match self.call(Method::POST, "symbol_select", Some(&body)).await? {
            (Some(true), _) => Ok(()),
            (_, diagnostic) => Err(or_fail(diagnostic, "symbol_select")),
        }
    }

    async fn copy_rates_range(
        &mut self,
        symbol: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawRate> {
        let body = RatesRangeRequest {
            symbol,
            timeframe: granularity.code(),
            date_from: from.timestamp(),
            date_to: to.timestamp(),
        };
        self.range("copy_rates_range", &body).await
    }

    async fn copy_ticks_range(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawTick> {
        let body = TicksRangeRequest {
            symbol,
            date_from: from.timestamp(),
            date_to: to.timestamp(),
            flags: "all",
        };
        self.range("copy_ticks_range", &body).await
    }

    async fn symbols(&mut self) -> Result<Vec<SymbolInfo>, Diagnostic> {
        match self.call::<(), _>(Method::GET, "symbols", None).await? {
            (Some(symbols), _) => Ok(symbols),
            (None, diagnostic) => Err(or_fail(diagnostic, "symbols")),
        }
    }
}
