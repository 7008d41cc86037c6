//! Line ingestion loop
//!
//! Lines are buffered continuously. A batch is flushed when the
//! accumulator says so, checked on every line and on a fixed tick, and at
//! most one batch is in flight at a time. Lines that arrive meanwhile wait
//! for the next flush.
//!
//! Input is read as raw bytes. Lines that are not valid UTF-8 are decoded
//! lossily and batched like any other.

use crate::pipeline::{BatchOutcome, TriageController};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use triagestream_core::{BatchAccumulator, LogBatch, Result};

/// How often the age-based flush condition is checked
pub const FLUSH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Batching thresholds for a watch session
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub max_lines: usize,
    pub max_age: Duration,
    pub check_interval: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            max_lines: triagestream_core::batch::DEFAULT_MAX_LINES,
            max_age: triagestream_core::batch::DEFAULT_MAX_AGE,
            check_interval: FLUSH_CHECK_INTERVAL,
        }
    }
}

/// Why a watch session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// Input closed; every buffered line was processed
    EndOfStream,

    /// Shutdown requested; buffered and in-flight work was dropped
    Interrupted,
}

/// Feed `input` through the controller until it closes or `shutdown` fires
///
/// `report` is called with every batch outcome in flush order.
pub async fn watch<R, S, F>(
    controller: &TriageController,
    mut input: R,
    settings: WatchSettings,
    shutdown: S,
    mut report: F,
) -> Result<WatchEnd>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    F: FnMut(&BatchOutcome),
{
    // Holds a partial line across cancelled reads
    let mut line = Vec::new();
    let mut accumulator = BatchAccumulator::with_thresholds(settings.max_lines, settings.max_age);
    let mut tick = tokio::time::interval(settings.check_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut in_flight: Option<LocalBoxFuture<'_, BatchOutcome>> = None;
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(
                    buffered = accumulator.len(),
                    in_flight = in_flight.is_some(),
                    "Shutdown requested, dropping pending work"
                );
                return Ok(WatchEnd::Interrupted);
            }

            outcome = next_outcome(&mut in_flight) => {
                in_flight = None;
                report(&outcome);
            }

            read = input.read_until(b'\n', &mut line), if input_open => {
                if read? == 0 {
                    if !line.is_empty() {
                        accumulator.add_line(decode_line(&line));
                        line.clear();
                    }
                    debug!(buffered = accumulator.len(), "Input closed");
                    input_open = false;
                } else if line.ends_with(b"\n") {
                    accumulator.add_line(decode_line(&line));
                    line.clear();
                }
            }

            _ = tick.tick() => {}
        }

        if in_flight.is_some() || !accumulator.has_pending() {
            if !input_open && in_flight.is_none() {
                return Ok(WatchEnd::EndOfStream);
            }
            continue;
        }

        // Remaining lines are flushed as soon as input closes
        if accumulator.should_flush() || !input_open {
            let batch = accumulator.flush();
            debug!(lines = batch.len(), "Flushing batch");
            in_flight = Some(process(controller, batch));
        }
    }
}

/// One input line without its terminator; invalid UTF-8 is replaced
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn process(controller: &TriageController, batch: LogBatch) -> LocalBoxFuture<'_, BatchOutcome> {
    async move { controller.process_batch(&batch).await }.boxed_local()
}

async fn next_outcome(in_flight: &mut Option<LocalBoxFuture<'_, BatchOutcome>>) -> BatchOutcome {
    match in_flight {
        Some(batch) => batch.await,
        None => std::future::pending().await,
    }
}
