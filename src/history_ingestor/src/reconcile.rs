//! Reassembly of per-chunk results into one series.
//!
//! Chunk results arrive in fetch order, which is time order. For bars, the
//! first row seen for a timestamp wins, so a row duplicated on a chunk boundary
//! is kept from the earlier chunk. The output is sorted by timestamp.
//!
//! Ticks are never deduplicated: several ticks may legitimately share a
//! timestamp. They are concatenated and stably sorted, so ticks with equal
//! timestamps keep their arrival order.

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::NaiveDateTime;

use crate::models::{Timestamped, bar::Bar, tick::Tick};

/// Merges bar chunks: unique, strictly increasing timestamps.
pub fn reconcile_bars<I>(chunks: I) -> Vec<Bar>
where
    I: IntoIterator<Item = Vec<Bar>>,
{
    first_wins(chunks)
}

/// Merges tick chunks: every tick kept, non-decreasing timestamps.
pub fn reconcile_ticks<I>(chunks: I) -> Vec<Tick>
where
    I: IntoIterator<Item = Vec<Tick>>,
{
    let mut out: Vec<Tick> = chunks.into_iter().flatten().collect();
    out.sort_by_key(|t| t.timestamp());
    out
}

fn first_wins<T, I>(chunks: I) -> Vec<T>
where
    T: Timestamped,
    I: IntoIterator<Item = Vec<T>>,
{
    let mut by_time: BTreeMap<NaiveDateTime, T> = BTreeMap::new();
    for row in chunks.into_iter().flatten() {
        if let Entry::Vacant(v) = by_time.entry(row.timestamp()) {
            v.insert(row);
        }
    }
    by_time.into_values().collect()
}
