//! Canonical in-memory representation of an OHLC bar.
//!
//! Bars leave the engine with naive timestamps in the session's local clock,
//! the same convention callers use for range boundaries.

use chrono::NaiveDateTime;
use polars::{df, prelude::*};

use crate::models::{Timestamped, granularity::Granularity};

/// A single OHLC observation. Unique by `time` within a reconciled series.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Bar open time, local naive.
    pub time: NaiveDateTime,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Number of ticks observed in the bar.
    pub tick_volume: u64,

    /// Spread in points. Not every server fills this.
    pub spread: i32,

    /// Exchange volume. Zero for OTC instruments.
    pub real_volume: u64,
}

impl Timestamped for Bar {
    fn timestamp(&self) -> NaiveDateTime {
        self.time
    }
}

/// A reconciled, strictly time-ordered run of bars for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g. "EURUSD").
    pub symbol: String,
    /// The period of each bar in the series.
    pub granularity: Granularity,
    /// The bars, oldest first.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Columnar view: `time, open, high, low, close, tick_volume, spread, real_volume`.
    /// Volumes stay unsigned.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let b = &self.bars;
        df!(
            "time" => b.iter().map(|r| r.time).collect::<Vec<_>>(),
            "open" => b.iter().map(|r| r.open).collect::<Vec<_>>(),
            "high" => b.iter().map(|r| r.high).collect::<Vec<_>>(),
            "low" => b.iter().map(|r| r.low).collect::<Vec<_>>(),
            "close" => b.iter().map(|r| r.close).collect::<Vec<_>>(),
            "tick_volume" => b.iter().map(|r| r.tick_volume).collect::<Vec<_>>(),
            "spread" => b.iter().map(|r| r.spread).collect::<Vec<_>>(),
            "real_volume" => b.iter().map(|r| r.real_volume).collect::<Vec<_>>()
        )
    }
}
