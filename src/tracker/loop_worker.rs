use std::future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::collaborators::PositionReading;
use crate::error::GeolocationError;
use crate::models::GeoFix;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub latest_fix: Option<GeoFix>,
    pub acquiring: bool,
    pub error: Option<GeolocationError>,
}

impl TrackerSnapshot {
    pub fn acquiring() -> Self {
        Self {
            latest_fix: None,
            acquiring: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCause {
    Fix,
    Error,
    /// The debounce window after the first fix or error has elapsed.
    Settled,
}

#[derive(Debug, Clone)]
pub struct TrackerEvent {
    /// Which `start` produced this event; stale ones are dropped by the flow.
    pub subscription: u64,
    pub cause: TrackerCause,
    pub snapshot: TrackerSnapshot,
}

pub async fn watch_loop(
    subscription: u64,
    readings: mpsc::Receiver<PositionReading>,
    events: mpsc::UnboundedSender<TrackerEvent>,
    settle_after: Duration,
    cancel_token: CancellationToken,
) {
    let mut readings = Some(readings);
    let mut snapshot = TrackerSnapshot::acquiring();
    let mut settle_at: Option<Instant> = None;

    loop {
        // Source gone and nothing left to report.
        if readings.is_none() && settle_at.is_none() {
            log_debug!("position watch {} finished", subscription);
            break;
        }

        let cause = tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("position watch {} cancelled", subscription);
                break;
            }
            _ = sleep_until(settle_at), if settle_at.is_some() => {
                settle_at = None;
                snapshot.acquiring = false;
                TrackerCause::Settled
            }
            reading = next_reading(&mut readings), if readings.is_some() => {
                let reading = reading.unwrap_or_else(|| {
                    Err(GeolocationError::Unavailable("position stream closed".into()))
                });

                match reading {
                    Ok(fix) => {
                        log_debug!(
                            "position watch {}: fix ({:.6}, {:.6}) ±{:.0}m",
                            subscription, fix.lat, fix.lng, fix.accuracy_meters
                        );
                        snapshot.latest_fix = Some(fix);
                        if snapshot.acquiring && settle_at.is_none() {
                            settle_at = Some(Instant::now() + settle_after);
                        }
                        TrackerCause::Fix
                    }
                    Err(err) => {
                        log_warn!("position watch {} failed: {}", subscription, err);
                        // Terminal: drop the stream, no retries.
                        readings = None;
                        snapshot.error = Some(err);
                        if snapshot.acquiring && settle_at.is_none() {
                            settle_at = Some(Instant::now() + settle_after);
                        }
                        TrackerCause::Error
                    }
                }
            }
        };

        let event = TrackerEvent {
            subscription,
            cause,
            snapshot: snapshot.clone(),
        };
        if events.send(event).is_err() {
            log_debug!("position watch {}: flow is gone, stopping", subscription);
            break;
        }
    }
}

async fn next_reading(
    readings: &mut Option<mpsc::Receiver<PositionReading>>,
) -> Option<PositionReading> {
    match readings {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
