//! Command-line front end: download bars, ticks or the symbol list as CSV.

pub mod commands;
pub mod output;
pub mod params;

use std::{io::Write, path::Path};

use anyhow::Context;
use polars::{df, prelude::DataFrame};
use tracing::info;

use crate::{
    HistoryClient,
    format::format_ticks,
    source::TerminalSource,
};

use self::{
    commands::Commands,
    output::{open_sink, write_csv},
    params::parse_range,
};

/// Executes one subcommand against `client`.
pub async fn run<S: TerminalSource>(
    client: &HistoryClient<S>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Bars {
            symbol,
            granularity,
            start,
            end,
            single,
            output,
        } => {
            let range = parse_range(&start, &end)?;
            let series = if single {
                client
                    .fetch_bars(&symbol, &granularity, range.start(), range.end())
                    .await?
            } else {
                client
                    .fetch_bars_chunked(&symbol, &granularity, range.start(), range.end())
                    .await?
            };
            info!(symbol = %symbol, bars = series.len(), "writing bars");
            emit(series.to_frame()?, output.as_deref())
        }
        Commands::Ticks {
            symbol,
            start,
            end,
            format,
            output,
        } => {
            let range = parse_range(&start, &end)?;
            let series = client
                .fetch_ticks_chunked(&symbol, range.start(), range.end())
                .await?;
            info!(symbol = %symbol, ticks = series.len(), "writing ticks");
            let mut frame = series.to_frame()?;
            if format {
                frame = format_ticks(frame);
            }
            emit(frame, output.as_deref())
        }
        Commands::Symbols { group, output } => {
            let names = client.list_symbols(group.as_deref()).await?;
            info!(symbols = names.len(), "writing symbols");
            emit(df!("symbol" => names)?, output.as_deref())
        }
    }
}

fn emit(mut frame: DataFrame, path: Option<&Path>) -> anyhow::Result<()> {
    let name = path.map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    let mut sink = open_sink(path).with_context(|| format!("cannot open output {name}"))?;
    write_csv(&mut frame, &mut sink).context("failed to write CSV")?;
    sink.flush().with_context(|| format!("cannot flush output {name}"))?;
    Ok(())
}
