use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{granularity::UnknownGranularity, range::InvalidRange};
use crate::source::Diagnostic;

/// Why a chunk produced no usable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// The terminal returned its failure sentinel.
    Sentinel,
    /// The terminal answered with no rows and empty chunks are not accepted.
    NoData,
    /// The per-chunk deadline expired before the terminal answered.
    Timeout,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchFailure::Sentinel => "failure sentinel",
            FetchFailure::NoData => "no data",
            FetchFailure::Timeout => "timed out",
        })
    }
}

/// The unified error type for the `history_ingestor` crate.
///
/// Any error aborts the whole operation that raised it; rows already fetched
/// for earlier chunks are dropped with it.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The mode name is not configured.
    #[error("unknown mode {mode:?}; configured modes: {known:?}")]
    UnknownMode { mode: String, known: Vec<String> },

    /// A session was needed but no mode has been selected.
    #[error("no mode selected and no default mode configured")]
    NoActiveMode,

    /// The terminal handshake failed. Nothing is cached.
    #[error("connecting in mode {mode:?} failed: {diagnostic}")]
    Connection { mode: String, diagnostic: Diagnostic },

    #[error(transparent)]
    UnknownGranularity(#[from] UnknownGranularity),

    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),

    /// The terminal refused to select the instrument.
    #[error("symbol {symbol:?} is not available in mode {mode:?}: {diagnostic}")]
    SymbolUnavailable {
        symbol: String,
        mode: String,
        diagnostic: Diagnostic,
    },

    /// One chunk of a range request failed.
    #[error(
        "fetching {symbol} chunk {} of {chunk_count} ({start} .. {end}) failed ({failure}): {diagnostic}",
        .chunk_index + 1
    )]
    SourceFetch {
        symbol: String,
        chunk_index: usize,
        chunk_count: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
        failure: FetchFailure,
        diagnostic: Diagnostic,
    },

    /// The terminal could not list its symbols.
    #[error("listing symbols failed: {diagnostic}")]
    SymbolListing { diagnostic: Diagnostic },
}

impl IngestError {
    /// Zero-based index of the chunk that failed, for [`IngestError::SourceFetch`].
    pub fn failed_chunk(&self) -> Option<usize> {
        match self {
            IngestError::SourceFetch { chunk_index, .. } => Some(*chunk_index),
            _ => None,
        }
    }

    /// The terminal's diagnostic, when the error carries one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            IngestError::Connection { diagnostic, .. }
            | IngestError::SymbolUnavailable { diagnostic, .. }
            | IngestError::SourceFetch { diagnostic, .. }
            | IngestError::SymbolListing { diagnostic } => Some(diagnostic),
            _ => None,
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
