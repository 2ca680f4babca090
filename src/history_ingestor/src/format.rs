//! Normalized output layout for tick frames.
//!
//! [`format_ticks`] splits the leading datetime column into `DATE` and `TIME`,
//! casts every other numeric column to floats rounded to five decimals, and
//! upper-cases all column names. Non-numeric columns pass through renamed.
//!
//! Formatting never blocks delivery: if the frame does not have the expected
//! shape, the failure is logged and the input frame is returned untouched.
//! [`try_format_ticks`] exposes the error for callers that want it.

use polars::prelude::*;
use thiserror::Error;
use tracing::warn;

const DECIMALS: u32 = 5;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("frame has no columns")]
    NoColumns,

    #[error("first column {name:?} is {dtype}, expected a datetime")]
    NotTimestamp { name: String, dtype: DataType },

    /// An error from the Polars library.
    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Formats `frame`, or returns it unchanged if it cannot be formatted.
pub fn format_ticks(frame: DataFrame) -> DataFrame {
    match try_format_ticks(&frame) {
        Ok(formatted) => formatted,
        Err(error) => {
            warn!(%error, "tick formatting failed, returning unformatted frame");
            frame
        }
    }
}

pub fn try_format_ticks(frame: &DataFrame) -> Result<DataFrame, FormatError> {
    let mut columns = frame.get_columns().iter();
    let first = columns.next().ok_or(FormatError::NoColumns)?;
    if !matches!(first.dtype(), DataType::Datetime(_, _)) {
        return Err(FormatError::NotTimestamp {
            name: first.name().to_string(),
            dtype: first.dtype().clone(),
        });
    }

    let stamp = first.name().as_str();
    let mut exprs = vec![
        col(stamp).dt().date().alias("DATE"),
        col(stamp).dt().time().alias("TIME"),
    ];
    for column in columns {
        let name = column.name().as_str();
        let dtype = column.dtype();
        let expr = if dtype.is_float() || dtype.is_integer() {
            col(name).cast(DataType::Float64).round(DECIMALS)
        } else {
            col(name)
        };
        exprs.push(expr.alias(name.to_uppercase()));
    }

    // Upper-casing can collide two names; the projection rejects duplicates.
    Ok(frame.clone().lazy().select(exprs).collect()?)
}
