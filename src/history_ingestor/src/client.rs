//! The engine's public entry point.
//!
//! [`HistoryClient`] wraps one [`Session`] behind a single async mutex. Every
//! public operation holds the lock from start to finish, so a mode switch can
//! never interleave with a fetch and at most one request is in flight against
//! the terminal. Chunks are fetched one after another in time order; the first
//! failing chunk aborts the operation and everything fetched before it is
//! dropped.

use std::collections::BTreeSet;

use chrono::{NaiveDateTime, TimeDelta};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::{
    config::{FetchSettings, IngestorConfig},
    errors::IngestError,
    models::{
        bar::BarSeries,
        granularity::Granularity,
        range::{Chunk, ChunkKind, InvalidRange, TimeRange},
        tick::TickSeries,
    },
    partition::plan_chunks,
    reconcile::{reconcile_bars, reconcile_ticks},
    session::{Session, registry::ModeRegistry, tz::TimezoneResolver},
    source::TerminalSource,
};

pub struct HistoryClient<S> {
    session: Mutex<Session<S>>,
    settings: FetchSettings,
}

impl<S: TerminalSource> HistoryClient<S> {
    /// A client with no mode selected.
    pub fn new(source: S, registry: ModeRegistry, settings: FetchSettings) -> Self {
        Self {
            session: Mutex::new(Session::new(source, registry)),
            settings,
        }
    }

    /// A client built from loaded configuration, with `default_mode` selected
    /// when one is configured. Does not connect.
    pub async fn from_config(source: S, config: IngestorConfig) -> Result<Self, IngestError> {
        let client = Self::new(source, config.registry, config.fetch);
        if let Some(mode) = config.default_mode.as_deref() {
            client.set_mode(mode).await?;
        }
        Ok(client)
    }

    pub fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// Selects the mode for subsequent operations; see [`Session::set_mode`].
    #[instrument(skip(self))]
    pub async fn set_mode(&self, mode: &str) -> Result<(), IngestError> {
        self.session.lock().await.set_mode(mode).await
    }

    pub async fn active_mode(&self) -> Option<String> {
        self.session.lock().await.active_mode().map(str::to_string)
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_connected()
    }

    /// The live session's offset resolver, `None` while disconnected.
    pub async fn timezone(&self) -> Option<TimezoneResolver> {
        self.session.lock().await.timezone()
    }

    /// Bars in `[start, end]` from a single request, with no chunking.
    ///
    /// Suited to ranges known to be small; large ranges are silently capped by
    /// the terminal.
    #[instrument(skip(self))]
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        granularity: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BarSeries, IngestError> {
        let granularity: Granularity = granularity.parse()?;
        let range = TimeRange::new(start, end)?;

        let mut session = self.session.lock().await;
        let mut fetcher = session.fetcher(self.settings).await?;
        let chunk = Chunk {
            index: 0,
            total: 1,
            range,
            kind: ChunkKind::Bars(granularity),
        };
        let rows = fetcher.fetch_bars(symbol, granularity, &chunk).await?;

        Ok(BarSeries {
            symbol: symbol.to_string(),
            granularity,
            bars: reconcile_bars([rows]),
        })
    }

    /// Bars in `[start, end)`, fetched in chunks sized to stay under the
    /// terminal's row cap and reconciled into one series.
    #[instrument(skip(self))]
    pub async fn fetch_bars_chunked(
        &self,
        symbol: &str,
        granularity: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BarSeries, IngestError> {
        let granularity: Granularity = granularity.parse()?;
        let range = self.checked_range(start, end)?;
        let kind = ChunkKind::Bars(granularity);

        let mut session = self.session.lock().await;
        let mut fetcher = session.fetcher(self.settings).await?;
        let plan = plan_chunks(range, kind, self.settings.max_units_per_chunk);
        info!(mode = fetcher.mode(), chunks = plan.len(), "fetching bars");

        let mut results = Vec::with_capacity(plan.len());
        for chunk in &plan {
            results.push(fetcher.fetch_bars(symbol, granularity, chunk).await?);
        }

        let mut bars = reconcile_bars(results);
        bars.retain(|b| b.time < range.end());
        info!(bars = bars.len(), "bars reconciled");

        Ok(BarSeries {
            symbol: symbol.to_string(),
            granularity,
            bars,
        })
    }

    /// Ticks in `[start, end)`, fetched one day at a time.
    #[instrument(skip(self))]
    pub async fn fetch_ticks_chunked(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TickSeries, IngestError> {
        let range = self.checked_range(start, end)?;

        let mut session = self.session.lock().await;
        let mut fetcher = session.fetcher(self.settings).await?;
        let plan = plan_chunks(range, ChunkKind::Ticks, self.settings.max_units_per_chunk);
        info!(mode = fetcher.mode(), chunks = plan.len(), "fetching ticks");

        let mut results = Vec::with_capacity(plan.len());
        for chunk in &plan {
            results.push(fetcher.fetch_ticks(symbol, chunk).await?);
        }

        let ticks = reconcile_ticks(results);
        info!(ticks = ticks.len(), "ticks reconciled");

        Ok(TickSeries {
            symbol: symbol.to_string(),
            ticks,
        })
    }

    /// Sorted, unique symbol names, optionally restricted to one top-level
    /// group (first path segment, compared case-insensitively).
    #[instrument(skip(self))]
    pub async fn list_symbols(&self, group: Option<&str>) -> Result<Vec<String>, IngestError> {
        let mut session = self.session.lock().await;
        let symbols = session
            .connected_source()
            .await?
            .symbols()
            .await
            .map_err(|diagnostic| IngestError::SymbolListing { diagnostic })?;

        let names: BTreeSet<String> = symbols
            .into_iter()
            .filter(|s| group.is_none_or(|g| s.group().eq_ignore_ascii_case(g.trim())))
            .map(|s| s.name)
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Closes the terminal session. The selected mode is kept, so the next
    /// operation reconnects under it.
    pub async fn shutdown(&self) {
        self.session.lock().await.disconnect().await;
    }

    fn checked_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TimeRange, InvalidRange> {
        let range = TimeRange::new(start, end)?;
        if let Some(days) = self.settings.max_range_days {
            if range.duration() > TimeDelta::days(i64::from(days.get())) {
                return Err(InvalidRange {
                    start,
                    end,
                    reason: format!("range is longer than {days} days"),
                });
            }
        }
        Ok(range)
    }
}
