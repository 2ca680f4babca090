mod common;

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use common::{Call, Script, StubSource, client, local, minute_rates, rate, utc};
use history_ingestor::{
    IngestError,
    config::{EmptyChunkPolicy, FetchSettings},
    errors::FetchFailure,
    source::{Diagnostic, RangeReply, RawRate},
};
use nonzero_ext::nonzero;

/// 40 one-minute bars from 00:00 UTC; four chunks of ten minutes each.
fn four_chunk_setup(
    settings: FetchSettings,
) -> (StubSource, history_ingestor::HistoryClient<StubSource>) {
    let mut script = Script::default();
    script.rates = minute_rates(utc(1, 0, 0), 40);
    let stub = StubSource::new(script);
    let settings = FetchSettings {
        max_units_per_chunk: nonzero!(10u32),
        ..settings
    };
    let client = client(&stub, settings);
    (stub, client)
}

#[tokio::test]
async fn failing_last_chunk_discards_everything() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    stub.script.lock().unwrap().rate_overrides.insert(
        3,
        RangeReply::Failed(Diagnostic::new(Diagnostic::FAIL, "Terminal: Call failed")),
    );
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();

    match &err {
        IngestError::SourceFetch {
            symbol,
            chunk_index,
            chunk_count,
            start,
            end,
            failure,
            diagnostic,
        } => {
            assert_eq!(symbol, "EURUSD");
            assert_eq!(*chunk_index, 3);
            assert_eq!(*chunk_count, 4);
            assert_eq!(*start, local(1, 0, 30));
            assert_eq!(*end, local(1, 0, 40));
            assert_eq!(*failure, FetchFailure::Sentinel);
            assert_eq!(diagnostic.code, Diagnostic::FAIL);
        }
        other => panic!("expected SourceFetch, got {other:?}"),
    }
    assert_eq!(err.failed_chunk(), Some(3));
    assert!(err.to_string().contains("chunk 4 of 4"), "{err}");
    assert_eq!(stub.rate_calls().len(), 4);
}

#[tokio::test]
async fn no_chunk_is_fetched_after_a_failure() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    stub.script.lock().unwrap().rate_overrides.insert(
        1,
        RangeReply::Failed(Diagnostic::new(Diagnostic::INTERNAL_FAIL_RECEIVE, "IPC recv failed")),
    );
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();
    assert_eq!(err.failed_chunk(), Some(1));
    assert_eq!(stub.rate_calls().len(), 2);
}

#[tokio::test]
async fn empty_chunk_fails_by_default() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    stub.script
        .lock()
        .unwrap()
        .rate_overrides
        .insert(2, RangeReply::Empty(Diagnostic::ok()));
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::SourceFetch {
            chunk_index: 2,
            failure: FetchFailure::NoData,
            ..
        }
    ));
}

#[tokio::test]
async fn empty_chunk_is_skipped_when_configured() {
    let (stub, client) = four_chunk_setup(FetchSettings {
        empty_chunks: EmptyChunkPolicy::Skip,
        ..FetchSettings::default()
    });
    stub.script
        .lock()
        .unwrap()
        .rate_overrides
        .insert(2, RangeReply::Empty(Diagnostic::ok()));
    client.set_mode("forex").await.unwrap();

    let series = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap();

    // Chunk 2 covers 00:20..=00:30; both boundary bars still arrive from its
    // neighbours.
    assert_eq!(series.len(), 31);
    assert!(
        series
            .bars
            .iter()
            .all(|b| b.time <= local(1, 0, 20) || b.time >= local(1, 0, 30))
    );
}

#[tokio::test]
async fn skip_policy_still_fails_on_sentinel() {
    let (stub, client) = four_chunk_setup(FetchSettings {
        empty_chunks: EmptyChunkPolicy::Skip,
        ..FetchSettings::default()
    });
    stub.script
        .lock()
        .unwrap()
        .rate_overrides
        .insert(0, RangeReply::Failed(Diagnostic::new(Diagnostic::FAIL, "boom")));
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();
    assert_eq!(err.failed_chunk(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn slow_chunk_times_out() {
    let (stub, client) = four_chunk_setup(FetchSettings {
        chunk_timeout: Some(Duration::from_secs(5)),
        ..FetchSettings::default()
    });
    stub.script.lock().unwrap().range_delay = Some(Duration::from_secs(30));
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();
    match err {
        IngestError::SourceFetch {
            chunk_index,
            failure,
            diagnostic,
            ..
        } => {
            assert_eq!(chunk_index, 0);
            assert_eq!(failure, FetchFailure::Timeout);
            assert_eq!(diagnostic.code, Diagnostic::INTERNAL_FAIL_TIMEOUT);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_symbol_is_reported_before_any_range_call() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    stub.script
        .lock()
        .unwrap()
        .rejected_symbols
        .insert("XAUUSD.pro".into());
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("XAUUSD.pro", "M1", local(1, 0, 0), local(1, 0, 40))
        .await
        .unwrap_err();
    match err {
        IngestError::SymbolUnavailable {
            symbol,
            mode,
            diagnostic,
        } => {
            assert_eq!(symbol, "XAUUSD.pro");
            assert_eq!(mode, "forex");
            assert_eq!(diagnostic.code, Diagnostic::NOT_FOUND);
        }
        other => panic!("expected SymbolUnavailable, got {other:?}"),
    }
    assert!(stub.rate_calls().is_empty());
}

#[tokio::test]
async fn caller_errors_are_raised_before_connecting() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    client.set_mode("forex").await.unwrap();

    let err = client
        .fetch_bars_chunked("EURUSD", "M7", local(1, 0, 0), local(1, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::UnknownGranularity(ref g) if g.value == "M7"));

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", local(2, 0, 0), local(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidRange(_)), "{err}");

    let err = client
        .fetch_ticks_chunked("EURUSD", local(2, 0, 0), local(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidRange(_)), "{err}");

    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn ranges_longer_than_the_limit_are_rejected() {
    let (stub, client) = four_chunk_setup(FetchSettings {
        max_range_days: Some(nonzero!(30u32)),
        ..FetchSettings::default()
    });
    client.set_mode("forex").await.unwrap();

    let start = local(1, 0, 0);
    let err = client
        .fetch_bars_chunked("EURUSD", "D1", start, start + TimeDelta::days(31))
        .await
        .unwrap_err();
    match err {
        IngestError::InvalidRange(r) => assert!(r.reason.contains("30 days"), "{}", r.reason),
        other => panic!("expected InvalidRange, got {other:?}"),
    }
    assert!(stub.calls().is_empty());

    client
        .fetch_bars_chunked("EURUSD", "D1", start, start + TimeDelta::days(30))
        .await
        .unwrap();
    assert_eq!(stub.count(|c| matches!(c, Call::Rates { .. })), 1);
}

#[tokio::test]
async fn unshiftable_bounds_are_an_invalid_range() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    stub.script
        .lock()
        .unwrap()
        .offsets
        .insert("forex".into(), 3 * 3600);
    client.set_mode("forex").await.unwrap();

    let start = NaiveDateTime::MIN;
    let err = client
        .fetch_bars("EURUSD", "M1", start, start + TimeDelta::minutes(5))
        .await
        .unwrap_err();
    match err {
        IngestError::InvalidRange(r) => {
            assert_eq!(r.start, start);
            assert!(r.reason.contains("no UTC equivalent"), "{}", r.reason);
        }
        other => panic!("expected InvalidRange, got {other:?}"),
    }

    let err = client
        .fetch_bars_chunked("EURUSD", "M1", start, start + TimeDelta::minutes(5))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidRange(_)), "{err}");

    let err = client
        .fetch_ticks_chunked("EURUSD", start, start + TimeDelta::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidRange(_)), "{err}");

    assert_eq!(stub.count(|c| matches!(c, Call::Initialize(_))), 1);
    assert_eq!(stub.count(|c| matches!(c, Call::SymbolSelect(_))), 0);
    assert!(stub.rate_calls().is_empty());
    assert_eq!(stub.count(|c| matches!(c, Call::Ticks { .. })), 0);
}

#[tokio::test]
async fn rows_with_unreadable_timestamps_are_dropped() {
    let (stub, client) = four_chunk_setup(FetchSettings::default());
    let good = rate(utc(1, 0, 2), 1.5);
    let corrupt = RawRate {
        time: i64::MAX,
        ..rate(utc(1, 0, 3), 9.9)
    };
    stub.script
        .lock()
        .unwrap()
        .rate_overrides
        .insert(0, RangeReply::Rows(vec![good, corrupt]));
    client.set_mode("forex").await.unwrap();

    let series = client
        .fetch_bars_chunked("EURUSD", "M1", local(1, 0, 0), local(1, 0, 5))
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.bars[0].time, local(1, 0, 2));
    assert_eq!(series.bars[0].close, 1.5);
}
