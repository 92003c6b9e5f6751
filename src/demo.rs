//! Scripted check-in against the in-memory collaborators: a strict GPS step
//! with an out-of-range first fix, then a photo upload and submission.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use log::info;
use tokio::sync::broadcast::error::RecvError;

use crate::collaborators::Collaborators;
use crate::flow::{FlowEvent, SessionFlow, SessionRegistry};
use crate::geofence::GpsMode;
use crate::models::{
    AttendanceKind, GeoFix, GeofenceTarget, ImageArtifact, PhotoMode, SessionConfig,
    SessionContext,
};
use crate::settings::FlowSettings;
use crate::sim::{
    RecordingNavigator, RecordingNotifier, ScriptedAttendanceApi, ScriptedPositionSource,
    ScriptedUploader, StaticCamera,
};

const SITE: (f64, f64) = (-6.200000, 106.816666);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_demo(settings: FlowSettings) -> Result<()> {
    let positions = Arc::new(ScriptedPositionSource::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let uploader = Arc::new(
        ScriptedUploader::succeeding("https://cdn.example.com/attendance/selfie.jpg")
            .with_steps(vec![25, 60, 90], Duration::from_millis(150)),
    );
    let attendance = Arc::new(ScriptedAttendanceApi::accepting().with_latency(Duration::from_millis(200)));

    let collaborators = Collaborators {
        positions: positions.clone(),
        uploader,
        attendance: attendance.clone(),
        notifier: notifier.clone(),
        navigator: navigator.clone(),
    };

    let config = SessionConfig {
        require_gps_verification: true,
        require_photo_verification: true,
        gps_mode: GpsMode::RequiredAtLocation,
        photo_mode: PhotoMode::RequireFacePhoto,
        ..SessionConfig::default()
    };
    let context = SessionContext::new(AttendanceKind::CheckIn, "shift-demo")
        .with_config(config)
        .with_target(GeofenceTarget::new(SITE.0, SITE.1, Some(100.0)));

    let registry = SessionRegistry::new();
    let settle = settings.settle_debounce() + Duration::from_millis(50);
    let flow = SessionFlow::start(context, collaborators, settings, &registry)?;
    let mut events = flow.subscribe();

    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(FlowEvent::TornDown) => break,
                Ok(event) => info!("event: {event:?}"),
                Err(RecvError::Lagged(skipped)) => info!("event log skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });
    let mut completion = flow.subscribe();

    // Roughly 1.1km north of the site.
    positions.push_fix(GeoFix::new(SITE.0 + 0.01, SITE.1, 12.0));
    tokio::time::sleep(settle).await;
    let snapshot = flow.snapshot().await?;
    info!(
        "far fix: can advance = {}, geofence = {:?}",
        snapshot.can_advance_from_gps, snapshot.geofence
    );

    positions.push_fix(GeoFix::new(SITE.0 + 0.0002, SITE.1, 8.0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = flow.confirm_location().await?;
    info!("after confirming location: {:?}", snapshot.position);

    let camera = StaticCamera::returning(ImageArtifact::jpeg("selfie.jpg", vec![0xFF, 0xD8, 0xFF]));
    flow.capture_with(&camera).await?;

    let completed = tokio::time::timeout(COMPLETION_TIMEOUT, async {
        loop {
            match completion.recv().await {
                Ok(FlowEvent::Completed { destination }) => return Some(destination),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    let snapshot = flow.teardown().await?;
    let _ = logger.await;

    match completed {
        Ok(Some(destination)) => info!(
            "demo finished at {destination}: record {:?}, {} request(s), navigation {:?}, {} notification(s) left",
            snapshot.record.map(|record| record.id),
            attendance.requests().len(),
            navigator.calls(),
            notifier.live_count()
        ),
        Ok(None) => bail!("flow stopped before completing"),
        Err(_) => bail!("flow did not complete within {COMPLETION_TIMEOUT:?}"),
    }

    Ok(())
}
