//! Ingestion loop behaviour over in-memory and duplex inputs

mod common;

use common::{digest_lines, Harness, MockAnalyzer, MockClassifier};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use triagestream::{watch, BatchOutcome, WatchEnd, WatchSettings};

fn settings(max_lines: usize, max_age: Duration) -> WatchSettings {
    WatchSettings {
        max_lines,
        max_age,
        check_interval: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn test_end_of_stream_flushes_remainder() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let input: &[u8] = b"ERROR: db fail\nWARN: mem high\nINFO: ok\n";
    let mut outcomes = 0;

    let end = watch(
        &h.controller,
        input,
        settings(100, Duration::from_secs(60)),
        std::future::pending::<()>(),
        |_| outcomes += 1,
    )
    .await
    .unwrap();

    assert_eq!(end, WatchEnd::EndOfStream);
    assert_eq!(outcomes, 1);
    assert_eq!(h.classifier.calls(), 1);
    assert_eq!(digest_lines(&h.classifier.digests()[0]), 3);
}

#[tokio::test]
async fn test_size_threshold_splits_batches_in_order() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let input: &[u8] = b"ERROR: 1\nERROR: 2\nERROR: 3\nERROR: 4\nERROR: 5\n";

    let end = watch(
        &h.controller,
        input,
        settings(2, Duration::from_secs(60)),
        std::future::pending::<()>(),
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(end, WatchEnd::EndOfStream);

    let digests = h.classifier.digests();
    assert!(digests.len() >= 2);
    assert_eq!(digest_lines(&digests[0]), 2);
    assert!(digests[0].contains("ERROR: 1"));
    assert_eq!(digests.iter().map(|d| digest_lines(d)).sum::<usize>(), 5);
    assert_eq!(h.controller.stats().summary().total_triages, digests.len() as u64);
}

#[tokio::test]
async fn test_invalid_utf8_line_is_kept() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let input: &[u8] = b"ERROR: a\nERROR: bad \xff\r\nERROR: b";
    let mut outcomes = 0;

    let end = watch(
        &h.controller,
        input,
        settings(100, Duration::from_secs(60)),
        std::future::pending::<()>(),
        |outcome| {
            assert!(matches!(outcome, BatchOutcome::Completed(_)));
            outcomes += 1;
        },
    )
    .await
    .unwrap();

    assert_eq!(end, WatchEnd::EndOfStream);
    assert_eq!(outcomes, 1);
    let digest = &h.classifier.digests()[0];
    assert_eq!(digest_lines(digest), 3);
    assert!(digest.contains("ERROR: a"));
    assert!(digest.contains("ERROR: bad \u{FFFD}"));
    assert!(digest.contains("ERROR: b"));
    assert!(!digest.contains('\r'));
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let input: &[u8] = b"";

    let end = watch(
        &h.controller,
        input,
        WatchSettings::default(),
        std::future::pending::<()>(),
        |_| panic!("no batch expected"),
    )
    .await
    .unwrap();

    assert_eq!(end, WatchEnd::EndOfStream);
    assert_eq!(h.classifier.calls(), 0);
}

#[tokio::test]
async fn test_age_threshold_flushes_open_stream() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let (reader, mut writer) = tokio::io::duplex(1024);

    let producer = tokio::spawn(async move {
        writer.write_all(b"ERROR: lonely line\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        // the batch must have been flushed by age before the stream closes
        drop(writer);
    });

    let mut flushed_while_open = false;
    let producer_handle = &producer;
    let end = watch(
        &h.controller,
        BufReader::new(reader),
        settings(100, Duration::from_millis(100)),
        std::future::pending::<()>(),
        |outcome| {
            assert!(matches!(outcome, BatchOutcome::Completed(_)));
            flushed_while_open = !producer_handle.is_finished();
        },
    )
    .await
    .unwrap();
    producer.await.unwrap();

    assert_eq!(end, WatchEnd::EndOfStream);
    assert!(flushed_while_open);
    assert_eq!(h.classifier.calls(), 1);
}

#[tokio::test]
async fn test_shutdown_drops_buffered_lines() {
    let h = Harness::new(MockClassifier::new(), MockAnalyzer::new());
    let (reader, mut writer) = tokio::io::duplex(1024);
    writer.write_all(b"ERROR: pending\n").await.unwrap();

    let end = watch(
        &h.controller,
        BufReader::new(reader),
        settings(100, Duration::from_secs(60)),
        tokio::time::sleep(Duration::from_millis(100)),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(end, WatchEnd::Interrupted);
    assert_eq!(h.classifier.calls(), 0);
    drop(writer);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_stream() {
    let h = Harness::new(
        MockClassifier::new().then(Err(triagestream_core::Error::classification("boom"))),
        MockAnalyzer::new(),
    );
    let input: &[u8] = b"ERROR: a\nERROR: b\nERROR: c\nERROR: d\n";
    let mut failed = 0;
    let mut completed = 0;

    watch(
        &h.controller,
        input,
        settings(2, Duration::from_secs(60)),
        std::future::pending::<()>(),
        |outcome| match outcome {
            BatchOutcome::Failed { .. } => failed += 1,
            BatchOutcome::Completed(_) => completed += 1,
            BatchOutcome::Skipped => {}
        },
    )
    .await
    .unwrap();

    assert_eq!(failed, 1);
    assert!(completed >= 1);
}
