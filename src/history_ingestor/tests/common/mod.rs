#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use history_ingestor::{
    config::FetchSettings,
    models::granularity::Granularity,
    session::registry::{ConnectionProfile, ModeRegistry},
    source::{
        Diagnostic, RangeReply, RawRate, RawTick, SymbolInfo, TerminalInfo, TerminalSource,
    },
    HistoryClient,
};
use secrecy::SecretString;

/// One call observed by the stub, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize(String),
    Shutdown,
    SymbolSelect(String),
    Rates {
        granularity: Granularity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    Ticks {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    Symbols,
}

/// What the stub terminal knows and how it misbehaves.
#[derive(Default)]
pub struct Script {
    /// UTC offset reported per mode.
    pub offsets: HashMap<String, i64>,
    pub init_failures: HashMap<String, Diagnostic>,
    pub rejected_symbols: HashSet<String>,
    /// Bars the terminal holds; range calls return those in `[from, to]`.
    pub rates: Vec<RawRate>,
    pub ticks: Vec<RawTick>,
    pub symbols: Vec<SymbolInfo>,
    /// Zero-based range call (bars and ticks counted separately) -> forced reply.
    pub rate_overrides: HashMap<usize, RangeReply<RawRate>>,
    pub tick_overrides: HashMap<usize, RangeReply<RawTick>>,
    /// Delay before answering any range call.
    pub range_delay: Option<Duration>,
}

/// A scripted in-memory terminal. Clones share state, so a test can keep one
/// handle for inspection after handing another to the client.
#[derive(Clone, Default)]
pub struct StubSource {
    pub script: Arc<Mutex<Script>>,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl StubSource {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn rate_calls(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Rates { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    async fn delay(&self) {
        let delay = self.script.lock().unwrap().range_delay;
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

fn in_window<T>(rows: &[T], time: impl Fn(&T) -> i64, from: i64, to: i64) -> Vec<T>
where
    T: Clone,
{
    rows.iter()
        .filter(|r| (from..=to).contains(&time(r)))
        .cloned()
        .collect()
}

fn reply<T>(rows: Vec<T>) -> RangeReply<T> {
    if rows.is_empty() {
        RangeReply::Empty(Diagnostic::ok())
    } else {
        RangeReply::Rows(rows)
    }
}

#[async_trait]
impl TerminalSource for StubSource {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn initialize(&mut self, profile: &ConnectionProfile) -> Result<TerminalInfo, Diagnostic> {
        self.record(Call::Initialize(profile.mode.clone()));
        let script = self.script.lock().unwrap();
        if let Some(d) = script.init_failures.get(&profile.mode) {
            return Err(d.clone());
        }
        Ok(TerminalInfo {
            timezone_offset_secs: script.offsets.get(&profile.mode).copied().unwrap_or(0),
            company: Some("Stub Markets".into()),
            server: Some(profile.server.clone()),
        })
    }

    async fn shutdown(&mut self) {
        self.record(Call::Shutdown);
    }

    async fn symbol_select(&mut self, symbol: &str) -> Result<(), Diagnostic> {
        self.record(Call::SymbolSelect(symbol.to_string()));
        if self.script.lock().unwrap().rejected_symbols.contains(symbol) {
            return Err(Diagnostic::new(Diagnostic::NOT_FOUND, "Symbol not found"));
        }
        Ok(())
    }

    async fn copy_rates_range(
        &mut self,
        _symbol: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawRate> {
        self.record(Call::Rates {
            granularity,
            from,
            to,
        });
        let n = self.count(|c| matches!(c, Call::Rates { .. })) - 1;
        self.delay().await;
        let script = self.script.lock().unwrap();
        if let Some(forced) = script.rate_overrides.get(&n) {
            return forced.clone();
        }
        reply(in_window(
            &script.rates,
            |r| r.time,
            from.timestamp(),
            to.timestamp(),
        ))
    }

    async fn copy_ticks_range(
        &mut self,
        _symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RangeReply<RawTick> {
        self.record(Call::Ticks { from, to });
        let n = self.count(|c| matches!(c, Call::Ticks { .. })) - 1;
        self.delay().await;
        let script = self.script.lock().unwrap();
        if let Some(forced) = script.tick_overrides.get(&n) {
            return forced.clone();
        }
        reply(in_window(
            &script.ticks,
            |t| t.time,
            from.timestamp(),
            to.timestamp(),
        ))
    }

    async fn symbols(&mut self) -> Result<Vec<SymbolInfo>, Diagnostic> {
        self.record(Call::Symbols);
        Ok(self.script.lock().unwrap().symbols.clone())
    }
}

pub fn profile(mode: &str, login: u64) -> ConnectionProfile {
    ConnectionProfile {
        mode: mode.to_string(),
        server: format!("{mode}-server"),
        login,
        password: SecretString::new("pw".into()),
        terminal_path: None,
    }
}

/// Registry with the two reference modes.
pub fn registry() -> ModeRegistry {
    let mut reg = ModeRegistry::new();
    reg.register(profile("forex", 1)).unwrap();
    reg.register(profile("synthetic", 2)).unwrap();
    reg
}

pub fn client(stub: &StubSource, settings: FetchSettings) -> HistoryClient<StubSource> {
    HistoryClient::new(stub.clone(), registry(), settings)
}

pub fn local(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    local(d, h, m).and_utc()
}

pub fn rate(time: DateTime<Utc>, close: f64) -> RawRate {
    RawRate {
        time: time.timestamp(),
        open: close,
        high: close,
        low: close,
        close,
        tick_volume: 10,
        spread: 2,
        real_volume: 0,
    }
}

/// `count` one-minute bars starting at `first`, closes 1.0, 1.1, 1.2, ...
pub fn minute_rates(first: DateTime<Utc>, count: i64) -> Vec<RawRate> {
    (0..count)
        .map(|i| rate(first + chrono::TimeDelta::minutes(i), 1.0 + i as f64 / 10.0))
        .collect()
}

pub fn raw_tick(time: DateTime<Utc>, bid: f64) -> RawTick {
    RawTick {
        time: time.timestamp(),
        bid,
        ask: bid + 0.0002,
        last: 0.0,
        volume: 0,
        flags: 6,
    }
}
