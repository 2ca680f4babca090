pub mod bar;
pub mod granularity;
pub mod range;
pub mod tick;

use chrono::NaiveDateTime;

/// Rows that are keyed and ordered by a local timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}
