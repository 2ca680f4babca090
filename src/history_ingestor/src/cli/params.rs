use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::models::range::{InvalidRange, TimeRange};

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("cannot parse {0:?} as a date or datetime")]
    Unparsable(String),

    #[error(transparent)]
    Range(#[from] InvalidRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Day(NaiveDate),
    Instant(NaiveDateTime),
}

fn parse_bound(s: &str) -> Result<Bound, ParamError> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Bound::Day(d));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Bound::Instant)
        .ok_or_else(|| ParamError::Unparsable(s.to_string()))
}

/// Parses command-line range bounds into a local range.
///
/// Two plain dates cover both days completely: `2025-05-01 .. 2025-05-03`
/// becomes `[05-01 00:00, 05-04 00:00)`. A plain date mixed with a datetime
/// stands for midnight.
pub fn parse_range(start: &str, end: &str) -> Result<TimeRange, ParamError> {
    match (parse_bound(start)?, parse_bound(end)?) {
        (Bound::Day(first), Bound::Day(last)) => Ok(TimeRange::whole_days(first, last)?),
        (a, b) => Ok(TimeRange::new(instant(a), instant(b))?),
    }
}

fn instant(b: Bound) -> NaiveDateTime {
    match b {
        Bound::Day(d) => d.and_time(NaiveTime::MIN),
        Bound::Instant(t) => t,
    }
}
