//! Translation between the caller's naive local clock and UTC wire instants.
//!
//! The terminal reports one fixed offset per session. Naive timestamps are read
//! as wall-clock time at that offset. No daylight-saving handling is attempted:
//! the offset is treated as constant until the session is torn down.
//!
//! Examples (offset +03:00):
//! - `to_source_time(2025-05-01 03:00)` -> `2025-05-01T00:00:00Z`
//! - `to_local_time(2025-05-01T00:00:00Z)` -> `2025-05-01 03:00`
//!
//! Both directions return `None` when the shifted instant falls outside
//! chrono's representable range.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneResolver {
    offset: FixedOffset,
}

impl TimezoneResolver {
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// `None` when the offset is a day or more away from UTC.
    pub fn from_offset_secs(secs: i64) -> Option<Self> {
        let secs = i32::try_from(secs).ok()?;
        FixedOffset::east_opt(secs).map(Self::new)
    }

    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn shift(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))
    }

    /// Local naive -> absolute UTC instant for a wire request.
    pub fn to_source_time(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        local.checked_sub_signed(self.shift()).map(|t| t.and_utc())
    }

    /// UTC instant -> local naive, matching the caller's input convention.
    pub fn to_local_time(&self, utc: DateTime<Utc>) -> Option<NaiveDateTime> {
        utc.naive_utc().checked_add_signed(self.shift())
    }

    /// Wire epoch seconds -> local naive.
    pub fn local_from_epoch(&self, secs: i64) -> Option<NaiveDateTime> {
        DateTime::<Utc>::from_timestamp(secs, 0).and_then(|utc| self.to_local_time(utc))
    }
}
