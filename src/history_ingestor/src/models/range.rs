//! Time ranges and chunks, expressed in the session's local (naive) clock.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::models::granularity::Granularity;

/// A requested range is malformed or exceeds a configured limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid range {start} .. {end}: {reason}")]
pub struct InvalidRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reason: String,
}

/// An ordered pair of naive local timestamps with `start <= end`.
///
/// Whether `end` is inclusive depends on the operation consuming the range:
/// single-request bar fetches treat it as inclusive, the chunked operations
/// treat it as exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange {
                start,
                end,
                reason: "start is after end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// For callers that already hold `start <= end`.
    pub(crate) fn from_ordered(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// `[first 00:00, last + 1 day 00:00)`: every instant of the calendar days
    /// `first..=last`, for use with the end-exclusive chunked operations.
    pub fn whole_days(first: NaiveDate, last: NaiveDate) -> Result<Self, InvalidRange> {
        let start = first.and_time(NaiveTime::MIN);
        let last_midnight = last.and_time(NaiveTime::MIN);
        let end = last_midnight
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| InvalidRange {
                start,
                end: last_midnight,
                reason: "last day has no following day".to_string(),
            })?;
        Self::new(start, end).map_err(|mut e| {
            e.reason = "first day is after last day".to_string();
            e
        })
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `start <= t <= end`
    pub fn contains_inclusive(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// `start <= t < end`
    pub fn contains_half_open(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

/// What a chunk is fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Bars(Granularity),
    Ticks,
}

/// One bounded sub-range of a larger request, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the chunk plan.
    pub index: usize,
    /// Number of chunks in the plan.
    pub total: usize,
    pub range: TimeRange,
    pub kind: ChunkKind,
}
