//! Bar granularities supported by the terminal.
//!
//! A [`Granularity`] names one of the terminal's fixed bar periods (`"M1"` ..
//! `"MN1"`) and knows its nominal duration in seconds. The duration is what the
//! range partitioner uses to size chunks; for `MN1` it is a flat 30 days, which
//! is only ever used as a sizing unit and never for calendar math.
//!
//! ```
//! use history_ingestor::models::granularity::Granularity;
//!
//! let g: Granularity = "M15".parse().unwrap();
//! assert_eq!(g.seconds(), 900);
//! assert_eq!(g.to_string(), "M15");
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

/// The granularity string is not one of the supported codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown granularity: {value:?}")]
pub struct UnknownGranularity {
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M10,
    M12,
    M15,
    M20,
    M30,
    H1,
    H2,
    H3,
    H4,
    H6,
    H8,
    H12,
    D1,
    W1,
    MN1,
}

impl Granularity {
    /// Every supported granularity, shortest first.
    pub const ALL: [Granularity; 21] = [
        Granularity::M1,
        Granularity::M2,
        Granularity::M3,
        Granularity::M4,
        Granularity::M5,
        Granularity::M6,
        Granularity::M10,
        Granularity::M12,
        Granularity::M15,
        Granularity::M20,
        Granularity::M30,
        Granularity::H1,
        Granularity::H2,
        Granularity::H3,
        Granularity::H4,
        Granularity::H6,
        Granularity::H8,
        Granularity::H12,
        Granularity::D1,
        Granularity::W1,
        Granularity::MN1,
    ];

    /// Nominal bar duration in seconds.
    pub const fn seconds(self) -> i64 {
        const MIN: i64 = 60;
        const HOUR: i64 = 60 * MIN;
        const DAY: i64 = 24 * HOUR;
        match self {
            Granularity::M1 => MIN,
            Granularity::M2 => 2 * MIN,
            Granularity::M3 => 3 * MIN,
            Granularity::M4 => 4 * MIN,
            Granularity::M5 => 5 * MIN,
            Granularity::M6 => 6 * MIN,
            Granularity::M10 => 10 * MIN,
            Granularity::M12 => 12 * MIN,
            Granularity::M15 => 15 * MIN,
            Granularity::M20 => 20 * MIN,
            Granularity::M30 => 30 * MIN,
            Granularity::H1 => HOUR,
            Granularity::H2 => 2 * HOUR,
            Granularity::H3 => 3 * HOUR,
            Granularity::H4 => 4 * HOUR,
            Granularity::H6 => 6 * HOUR,
            Granularity::H8 => 8 * HOUR,
            Granularity::H12 => 12 * HOUR,
            Granularity::D1 => DAY,
            Granularity::W1 => 7 * DAY,
            Granularity::MN1 => 30 * DAY,
        }
    }

    /// The terminal's code for this granularity (`"M1"`, `"H4"`, `"MN1"`, ...).
    pub const fn code(self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M2 => "M2",
            Granularity::M3 => "M3",
            Granularity::M4 => "M4",
            Granularity::M5 => "M5",
            Granularity::M6 => "M6",
            Granularity::M10 => "M10",
            Granularity::M12 => "M12",
            Granularity::M15 => "M15",
            Granularity::M20 => "M20",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H2 => "H2",
            Granularity::H3 => "H3",
            Granularity::H4 => "H4",
            Granularity::H6 => "H6",
            Granularity::H8 => "H8",
            Granularity::H12 => "H12",
            Granularity::D1 => "D1",
            Granularity::W1 => "W1",
            Granularity::MN1 => "MN1",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    /// Codes are matched exactly; `"m1"` is not `"M1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .iter()
            .copied()
            .find(|g| g.code() == s)
            .ok_or_else(|| UnknownGranularity {
                value: s.to_string(),
            })
    }
}
