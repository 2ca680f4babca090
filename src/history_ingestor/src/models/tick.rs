//! Raw quote/trade events.

use chrono::NaiveDateTime;
use polars::{df, prelude::*};

use crate::models::Timestamped;

/// A single quote or trade event.
///
/// Several ticks may share a `time`; they are distinct events and are never
/// collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub time: NaiveDateTime,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: u64,
    /// Terminal tick flags (which of bid/ask/last/volume changed).
    pub flags: u32,
}

impl Timestamped for Tick {
    fn timestamp(&self) -> NaiveDateTime {
        self.time
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickSeries {
    pub symbol: String,
    /// Ticks in non-decreasing time order.
    pub ticks: Vec<Tick>,
}

impl TickSeries {
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Columnar view: `time, bid, ask, last, volume, flags`. This is the input
    /// shape the tick formatter expects.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let t = &self.ticks;
        df!(
            "time" => t.iter().map(|r| r.time).collect::<Vec<_>>(),
            "bid" => t.iter().map(|r| r.bid).collect::<Vec<_>>(),
            "ask" => t.iter().map(|r| r.ask).collect::<Vec<_>>(),
            "last" => t.iter().map(|r| r.last).collect::<Vec<_>>(),
            "volume" => t.iter().map(|r| r.volume).collect::<Vec<_>>(),
            "flags" => t.iter().map(|r| r.flags).collect::<Vec<_>>()
        )
    }
}
