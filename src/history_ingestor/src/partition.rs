//! Splitting a time range into request-sized chunks.
//!
//! The terminal silently truncates large range requests, so every range is cut
//! into pieces of at most `max_units` bar periods. Adjacent chunks share their
//! boundary instant (`chunk[i].end == chunk[i + 1].start`); the reconciler
//! removes the duplicate rows this produces.
//!
//! Ticks have no period. Their unit is one day and every chunk covers at most
//! one day, whatever the configured cap.

use std::{cmp::min, num::NonZeroU32};

use chrono::TimeDelta;
use nonzero_ext::nonzero;

use crate::models::range::{Chunk, ChunkKind, TimeRange};

/// Units per chunk that stays clear of the terminal's row cap.
pub const DEFAULT_MAX_UNITS_PER_CHUNK: NonZeroU32 = nonzero!(70_000u32);

/// Sizing unit for tick chunks.
pub const SECS_PER_DAY: i64 = 86_400;

/// Cuts `range` into consecutive sub-ranges of at most `max_units * unit_secs`
/// seconds each.
///
/// - An empty range yields no chunks.
/// - A range shorter than one step yields a single chunk equal to the range.
/// - `unit_secs` below one is treated as one second.
pub fn partition(range: TimeRange, unit_secs: i64, max_units: NonZeroU32) -> Vec<TimeRange> {
    let step_secs = unit_secs.max(1).saturating_mul(i64::from(max_units.get()));
    let step = TimeDelta::try_seconds(step_secs).unwrap_or(TimeDelta::MAX);

    let mut chunks = Vec::new();
    let mut cursor = range.start();
    while cursor < range.end() {
        let next = cursor + min(step, range.end() - cursor);
        chunks.push(TimeRange::from_ordered(cursor, next));
        cursor = next;
    }
    chunks
}

/// Unit duration used to size chunks of `kind`.
pub fn unit_secs(kind: ChunkKind) -> i64 {
    match kind {
        ChunkKind::Bars(g) => g.seconds(),
        ChunkKind::Ticks => SECS_PER_DAY,
    }
}

/// Partitions `range` for `kind` and numbers the pieces in fetch order.
pub fn plan_chunks(range: TimeRange, kind: ChunkKind, max_units: NonZeroU32) -> Vec<Chunk> {
    let max_units = match kind {
        ChunkKind::Bars(_) => max_units,
        ChunkKind::Ticks => nonzero!(1u32),
    };
    let ranges = partition(range, unit_secs(kind), max_units);
    let total = ranges.len();
    ranges
        .into_iter()
        .enumerate()
        .map(|(index, range)| Chunk {
            index,
            total,
            range,
            kind,
        })
        .collect()
}
