//! Custom test assertions for integration tests

use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use download_tracker::{Event, JobId};

/// Result of waiting for a job to finish
#[derive(Debug, PartialEq)]
pub enum WaitResult {
    /// Job completed at the given location
    Completed(String),
    /// Job failed with the given diagnostic
    Failed(String),
    /// Timeout waiting for a terminal event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for a job's `completed` or `failed` event
///
/// Subscribe before creating the job so no event is missed.
pub async fn wait_for_terminal(
    events: &mut Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Completed {
                    id: event_id,
                    result_location,
                    ..
                }) if event_id == id => return WaitResult::Completed(result_location),
                Ok(Event::Failed {
                    id: event_id,
                    diagnostic,
                    ..
                }) if event_id == id => return WaitResult::Failed(diagnostic),
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return WaitResult::ChannelClosed;
                }
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Collect the progress percentages reported for `id` until it finishes
pub async fn collect_progress(
    events: &mut Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> Vec<u8> {
    let mut seen = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Progress {
                    id: event_id,
                    percent,
                    ..
                } if event_id == id => seen.push(percent),
                Event::Completed { id: event_id, .. } | Event::Failed { id: event_id, .. }
                    if event_id == id =>
                {
                    break;
                }
                _ => {}
            }
        }
    })
    .await;
    seen
}
