//! Chunked retrieval of historical bars and ticks from a trading terminal.
//!
//! The terminal caps the number of rows one range request returns and reports
//! timestamps in UTC while callers think in the broker's local clock. This
//! crate hides both: ranges are cut into bounded chunks, fetched one at a time
//! through a single session, converted to local time and reconciled into one
//! ordered, duplicate-free series.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::NaiveDate;
//! use history_ingestor::{HistoryClient, config::load_config_path, source::bridge::BridgeSource};
//!
//! let config = load_config_path("ingestor.toml")?;
//! let source = BridgeSource::from_config(config.bridge.as_ref())?;
//! let client = HistoryClient::from_config(source, config).await?;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let end = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let series = client.fetch_bars_chunked("EURUSD", "M1", start, end).await?;
//! println!("{} bars", series.len());
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod format;
pub mod models;
pub mod partition;
pub mod reconcile;
pub mod session;
pub mod source;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::HistoryClient;
pub use errors::{IngestError, Result};
