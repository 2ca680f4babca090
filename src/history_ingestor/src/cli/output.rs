use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use polars::prelude::{DataFrame, PolarsResult};
use polars_io::{SerWriter, csv::write::CsvWriter};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A buffered file, or stdout when `path` is `None`.
pub fn open_sink(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Writes `frame` as CSV with a header row. Timestamps are written to the
/// second, in the same layout the CLI accepts for range bounds.
pub fn write_csv<W: Write>(frame: &mut DataFrame, writer: W) -> PolarsResult<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_datetime_format(Some(DATETIME_FORMAT.to_string()))
        .with_time_format(Some(TIME_FORMAT.to_string()))
        .finish(frame)
}
