//! One chunk, one request.
//!
//! A [`SeriesFetcher`] borrows a connected session's source together with its
//! timezone resolver. For every chunk it selects the symbol, converts the chunk
//! bounds to UTC, issues exactly one range request, decides what the reply
//! means under the configured [`EmptyChunkPolicy`], and converts the returned
//! timestamps back to the local clock.
//!
//! Bars are re-filtered to `[start, end]` after conversion because the terminal
//! may return rows a rounding step outside the requested window. Ticks are
//! filtered to `[start, end)` so a tick sitting exactly on a daily boundary is
//! only fetched by the chunk that starts there.
//!
//! Chunk bounds that cannot be shifted to UTC fail with
//! [`IngestError::InvalidRange`] before anything is sent. Returned rows whose
//! epoch cannot be represented locally are dropped and counted in the log.

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::{
    config::{EmptyChunkPolicy, FetchSettings},
    errors::{FetchFailure, IngestError},
    models::{
        bar::Bar,
        granularity::Granularity,
        range::{Chunk, InvalidRange},
        tick::Tick,
    },
    session::tz::TimezoneResolver,
    source::{Diagnostic, RangeReply, RawRate, RawTick, TerminalSource},
};

pub struct SeriesFetcher<'s, S> {
    source: &'s mut S,
    tz: TimezoneResolver,
    mode: String,
    settings: FetchSettings,
}

impl<'s, S: TerminalSource> SeriesFetcher<'s, S> {
    pub fn new(
        source: &'s mut S,
        tz: TimezoneResolver,
        mode: String,
        settings: FetchSettings,
    ) -> Self {
        Self {
            source,
            tz,
            mode,
            settings,
        }
    }

    pub fn timezone(&self) -> TimezoneResolver {
        self.tz
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Bars of `granularity` whose local open time lies in `chunk`, inclusive on
    /// both ends.
    pub async fn fetch_bars(
        &mut self,
        symbol: &str,
        granularity: Granularity,
        chunk: &Chunk,
    ) -> Result<Vec<Bar>, IngestError> {
        let (from, to) = self.source_window(chunk)?;
        self.select(symbol).await?;

        let request = self.source.copy_rates_range(symbol, granularity, from, to);
        let reply = bounded(self.settings, request).await;
        let raw = accept(reply, self.settings.empty_chunks)
            .map_err(|(failure, diagnostic)| chunk_error(symbol, chunk, failure, diagnostic))?;

        let received = raw.len();
        let converted: Vec<Bar> = raw.into_iter().filter_map(|r| self.bar_from_raw(r)).collect();
        let unreadable = received - converted.len();
        report_unreadable(symbol, chunk, unreadable);
        let bars: Vec<Bar> = converted
            .into_iter()
            .filter(|b| chunk.range.contains_inclusive(b.time))
            .collect();

        debug!(
            symbol,
            granularity = %granularity,
            chunk = chunk.index + 1,
            of = chunk.total,
            range = %chunk.range,
            received,
            unreadable,
            kept = bars.len(),
            "fetched bar chunk"
        );
        Ok(bars)
    }

    /// Ticks whose local time lies in `[chunk.start, chunk.end)`.
    pub async fn fetch_ticks(
        &mut self,
        symbol: &str,
        chunk: &Chunk,
    ) -> Result<Vec<Tick>, IngestError> {
        let (from, to) = self.source_window(chunk)?;
        self.select(symbol).await?;

        let request = self.source.copy_ticks_range(symbol, from, to);
        let reply = bounded(self.settings, request).await;
        let raw = accept(reply, self.settings.empty_chunks)
            .map_err(|(failure, diagnostic)| chunk_error(symbol, chunk, failure, diagnostic))?;

        let received = raw.len();
        let converted: Vec<Tick> = raw.into_iter().filter_map(|r| self.tick_from_raw(r)).collect();
        let unreadable = received - converted.len();
        report_unreadable(symbol, chunk, unreadable);
        let ticks: Vec<Tick> = converted
            .into_iter()
            .filter(|t| chunk.range.contains_half_open(t.time))
            .collect();

        debug!(
            symbol,
            chunk = chunk.index + 1,
            of = chunk.total,
            range = %chunk.range,
            received,
            unreadable,
            kept = ticks.len(),
            "fetched tick chunk"
        );
        Ok(ticks)
    }

    /// Chunk bounds as UTC instants.
    fn source_window(&self, chunk: &Chunk) -> Result<(DateTime<Utc>, DateTime<Utc>), IngestError> {
        let range = chunk.range;
        let convert = |t: NaiveDateTime| {
            self.tz.to_source_time(t).ok_or_else(|| InvalidRange {
                start: range.start(),
                end: range.end(),
                reason: format!("{t} has no UTC equivalent at offset {}", self.tz.offset()),
            })
        };
        Ok((convert(range.start())?, convert(range.end())?))
    }

    async fn select(&mut self, symbol: &str) -> Result<(), IngestError> {
        self.source
            .symbol_select(symbol)
            .await
            .map_err(|diagnostic| IngestError::SymbolUnavailable {
                symbol: symbol.to_string(),
                mode: self.mode.clone(),
                diagnostic,
            })
    }

    fn bar_from_raw(&self, r: RawRate) -> Option<Bar> {
        Some(Bar {
            time: self.tz.local_from_epoch(r.time)?,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            tick_volume: r.tick_volume,
            spread: r.spread,
            real_volume: r.real_volume,
        })
    }

    fn tick_from_raw(&self, r: RawTick) -> Option<Tick> {
        Some(Tick {
            time: self.tz.local_from_epoch(r.time)?,
            bid: r.bid,
            ask: r.ask,
            last: r.last,
            volume: r.volume,
            flags: r.flags,
        })
    }
}

fn report_unreadable(symbol: &str, chunk: &Chunk, unreadable: usize) {
    if unreadable > 0 {
        warn!(
            symbol,
            chunk = chunk.index + 1,
            of = chunk.total,
            unreadable,
            "dropped rows with timestamps outside the representable range"
        );
    }
}

/// Awaits `request`, giving up after the configured chunk timeout.
async fn bounded<T, F>(settings: FetchSettings, request: F) -> RangeReply<T>
where
    F: Future<Output = RangeReply<T>>,
{
    let Some(limit) = settings.chunk_timeout else {
        return request.await;
    };
    match tokio::time::timeout(limit, request).await {
        Ok(reply) => reply,
        Err(_) => RangeReply::Failed(Diagnostic::new(
            Diagnostic::INTERNAL_FAIL_TIMEOUT,
            format!("no reply within {}s", limit.as_secs_f64()),
        )),
    }
}

/// Applies the empty-chunk policy to a reply.
fn accept<T>(
    reply: RangeReply<T>,
    policy: EmptyChunkPolicy,
) -> Result<Vec<T>, (FetchFailure, Diagnostic)> {
    match reply {
        RangeReply::Rows(rows) if !rows.is_empty() => Ok(rows),
        RangeReply::Rows(_) => accept(RangeReply::Empty(Diagnostic::ok()), policy),
        RangeReply::Empty(diagnostic) => match policy {
            EmptyChunkPolicy::Skip => Ok(Vec::new()),
            EmptyChunkPolicy::Fail => Err((FetchFailure::NoData, diagnostic)),
        },
        RangeReply::Failed(diagnostic) if diagnostic.code == Diagnostic::INTERNAL_FAIL_TIMEOUT => {
            Err((FetchFailure::Timeout, diagnostic))
        }
        RangeReply::Failed(diagnostic) => Err((FetchFailure::Sentinel, diagnostic)),
    }
}

fn chunk_error(
    symbol: &str,
    chunk: &Chunk,
    failure: FetchFailure,
    diagnostic: Diagnostic,
) -> IngestError {
    IngestError::SourceFetch {
        symbol: symbol.to_string(),
        chunk_index: chunk.index,
        chunk_count: chunk.total,
        start: chunk.range.start(),
        end: chunk.range.end(),
        failure,
        diagnostic,
    }
}
