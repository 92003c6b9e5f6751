use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::capture::{CapturePipeline, PipelineOutcome, UploadEvent};
use crate::collaborators::{Camera, Collaborators};
use crate::error::{CameraError, PreconditionError, SubmissionError};
use crate::geofence::{self, can_advance_from_gps_step, Geofence, GeofenceEvaluation};
use crate::models::{
    AttendanceKind, AttendanceRecord, AttendanceRequest, GeoFix, ImageArtifact, SessionConfig,
    SessionContext, StepId,
};
use crate::notifications::{
    copy, Notice, NoticeStamp, NotificationCategory, NotificationLifecycle,
};
use crate::planner;
use crate::settings::FlowSettings;
use crate::tracker::{GeolocationTracker, TrackerCause, TrackerEvent, TrackerSnapshot};

use super::events::{FlowEvent, FlowSnapshot, SubmissionStatus};
use super::registry::{SessionLease, SessionRegistry};
use super::state::{FlowState, Retreat, Transition};

const EVENT_CAPACITY: usize = 64;

enum FlowAction {
    Snapshot,
    Advance,
    Retreat,
    JumpTo(StepId),
    ConfirmLocation,
    ConfirmCapture(ImageArtifact),
    CameraFailed(CameraError),
    Resubmit,
    Finish,
    Teardown,
}

struct FlowCommand {
    action: FlowAction,
    reply: oneshot::Sender<FlowSnapshot>,
}

enum FlowSignal {
    SubmissionFinished {
        attempt: u64,
        result: Result<AttendanceRecord, SubmissionError>,
    },
    PostSubmitElapsed {
        attempt: u64,
    },
    NoticeExpired {
        category: NotificationCategory,
        stamp: NoticeStamp,
    },
}

/// Who last wrote the status notification. The gps step and the photo
/// upload both report through it and must not clobber each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusOwner {
    Location,
    Upload,
    Flow,
}

struct FlowInbox {
    commands: mpsc::UnboundedReceiver<FlowCommand>,
    tracker: mpsc::UnboundedReceiver<TrackerEvent>,
    uploads: mpsc::UnboundedReceiver<UploadEvent>,
    signals: mpsc::UnboundedReceiver<FlowSignal>,
}

/// Handle to a running check-in/check-out flow.
///
/// All session state lives in one background task; every method here sends
/// a command to it and returns the snapshot taken right after the command
/// was applied. Dropping every handle tears the session down.
#[derive(Clone)]
pub struct SessionFlow {
    commands: mpsc::UnboundedSender<FlowCommand>,
    events: broadcast::Sender<FlowEvent>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionFlow {
    /// Validates the context and starts the flow on its first planned step.
    /// Must be called from within a tokio runtime.
    pub fn start(
        context: SessionContext,
        collaborators: Collaborators,
        settings: FlowSettings,
        registry: &SessionRegistry,
    ) -> Result<Self, PreconditionError> {
        let config = context
            .config
            .clone()
            .ok_or(PreconditionError::MissingConfig)?;
        let plan = planner::plan(&config);

        let geofence = match &context.target {
            Some(target) => {
                geofence::validate_target(target)?;
                Some(Geofence::resolve(target, settings.default_radius_meters))
            }
            None => None,
        };
        if plan.contains(StepId::Gps) && config.gps_mode.requires_coordinates() && geofence.is_none()
        {
            return Err(PreconditionError::MissingTarget);
        }

        let lease = registry.acquire(&context.target_id)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (tracker_tx, tracker_rx) = mpsc::unbounded_channel();
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Starting {} flow for {} with plan {:?}",
            context.kind.as_str(),
            context.target_id,
            plan.steps()
        );

        let worker = FlowWorker {
            kind: context.kind,
            target_id: context.target_id,
            done_destination: context.done_destination,
            config,
            geofence,
            notices: NotificationLifecycle::new(collaborators.notifier.clone()),
            tracker: GeolocationTracker::new(settings.settle_debounce()),
            pipeline: CapturePipeline::new(
                settings.upload_notice_delay(),
                settings.success_notice(),
            ),
            settings,
            collaborators,
            state: FlowState::new(plan),
            tracker_snapshot: TrackerSnapshot::default(),
            evaluation: None,
            committed_location: None,
            photo_url: None,
            submission: SubmissionStatus::Idle,
            attempt: 0,
            record: None,
            torn_down: false,
            status_owner: None,
            deferred_status: None,
            events: events.clone(),
            tracker_tx,
            upload_tx,
            signal_tx,
            lease: Some(lease),
        };

        let handle = tokio::spawn(worker.run(FlowInbox {
            commands: command_rx,
            tracker: tracker_rx,
            uploads: upload_rx,
            signals: signal_rx,
        }));

        Ok(Self {
            commands: command_tx,
            events,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::Snapshot).await
    }

    pub async fn advance(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::Advance).await
    }

    pub async fn retreat(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::Retreat).await
    }

    pub async fn jump_to(&self, step: StepId) -> Result<FlowSnapshot> {
        self.send(FlowAction::JumpTo(step)).await
    }

    /// Commits the current fix and moves past the GPS step, if allowed.
    pub async fn confirm_location(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::ConfirmLocation).await
    }

    /// Hands a finished photo to the upload pipeline. Returns as soon as the
    /// upload has started.
    pub async fn confirm_capture(&self, artifact: ImageArtifact) -> Result<FlowSnapshot> {
        self.send(FlowAction::ConfirmCapture(artifact)).await
    }

    pub async fn report_camera_error(&self, err: CameraError) -> Result<FlowSnapshot> {
        self.send(FlowAction::CameraFailed(err)).await
    }

    pub async fn capture_with(&self, camera: &dyn Camera) -> Result<FlowSnapshot> {
        match camera.capture_image().await {
            Ok(artifact) => self.confirm_capture(artifact).await,
            Err(err) => {
                warn!("Camera capture failed: {err}");
                self.report_camera_error(err).await
            }
        }
    }

    pub async fn resubmit(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::Resubmit).await
    }

    pub async fn finish(&self) -> Result<FlowSnapshot> {
        self.send(FlowAction::Finish).await
    }

    /// Stops location tracking, removes every notification and ends the flow.
    pub async fn teardown(&self) -> Result<FlowSnapshot> {
        let snapshot = self.send(FlowAction::Teardown).await?;
        if let Some(handle) = self.worker.lock().await.take() {
            handle.await.context("session flow task failed to join")?;
        }
        Ok(snapshot)
    }

    async fn send(&self, action: FlowAction) -> Result<FlowSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(FlowCommand { action, reply })
            .map_err(|_| anyhow!("session flow has shut down"))?;
        response
            .await
            .context("session flow stopped before answering")
    }
}

struct FlowWorker {
    kind: AttendanceKind,
    target_id: String,
    done_destination: String,
    config: SessionConfig,
    geofence: Option<Geofence>,
    settings: FlowSettings,
    collaborators: Collaborators,
    state: FlowState,
    notices: NotificationLifecycle,
    tracker: GeolocationTracker,
    tracker_snapshot: TrackerSnapshot,
    evaluation: Option<GeofenceEvaluation>,
    committed_location: Option<GeoFix>,
    pipeline: CapturePipeline,
    photo_url: Option<String>,
    submission: SubmissionStatus,
    attempt: u64,
    record: Option<AttendanceRecord>,
    torn_down: bool,
    status_owner: Option<StatusOwner>,
    /// Upload error that arrived while a location notice held the slot.
    deferred_status: Option<Notice>,
    events: broadcast::Sender<FlowEvent>,
    tracker_tx: mpsc::UnboundedSender<TrackerEvent>,
    upload_tx: mpsc::UnboundedSender<UploadEvent>,
    signal_tx: mpsc::UnboundedSender<FlowSignal>,
    /// Dropped once the flow is exited or done so the target can start anew.
    lease: Option<SessionLease>,
}

impl FlowWorker {
    async fn run(mut self, mut inbox: FlowInbox) {
        if let Some(step) = self.state.current_step() {
            self.emit(FlowEvent::StepChanged {
                from: None,
                to: step,
            });
            self.enter_step(step);
        }

        loop {
            tokio::select! {
                command = inbox.commands.recv() => {
                    let Some(command) = command else {
                        info!("All handles for {} dropped; tearing down", self.target_id);
                        self.teardown().await;
                        break;
                    };
                    let stop = matches!(command.action, FlowAction::Teardown);
                    self.handle(command.action).await;
                    let _ = command.reply.send(self.snapshot());
                    if stop {
                        break;
                    }
                }
                Some(event) = inbox.tracker.recv() => self.on_tracker_event(event),
                Some(event) = inbox.uploads.recv() => self.on_upload_event(event).await,
                Some(signal) = inbox.signals.recv() => self.on_signal(signal).await,
            }
        }
    }

    async fn handle(&mut self, action: FlowAction) {
        match action {
            FlowAction::Snapshot => {}
            FlowAction::Advance => self.advance().await,
            FlowAction::Retreat => self.retreat().await,
            FlowAction::JumpTo(step) => self.jump_to(step).await,
            FlowAction::ConfirmLocation => self.confirm_location().await,
            FlowAction::ConfirmCapture(artifact) => self.confirm_capture(artifact),
            FlowAction::CameraFailed(err) => self.camera_failed(err),
            FlowAction::Resubmit => self.resubmit(),
            FlowAction::Finish => self.finish().await,
            FlowAction::Teardown => self.teardown().await,
        }
    }

    // ----- navigation -----

    async fn advance(&mut self) {
        let Some(step) = self.state.current_step() else {
            warn!("Advance ignored: flow is {:?}", self.state.position());
            return;
        };
        match self.state.advance() {
            Some(transition) => self.apply_transition(transition).await,
            None => warn!("Advance ignored: {step} is the last step"),
        }
    }

    async fn retreat(&mut self) {
        match self.state.retreat() {
            Some(Retreat::Moved(transition)) => self.apply_transition(transition).await,
            Some(Retreat::LeaveFlow(step)) => {
                info!("Leaving {} flow for {} from {step}", self.kind.as_str(), self.target_id);
                self.leave_step(step).await;
                self.state.exit();
                self.release().await;
                self.release_lease();
                self.collaborators.navigator.navigate_back();
                self.emit(FlowEvent::Exited);
            }
            None => warn!("Retreat ignored: flow is {:?}", self.state.position()),
        }
    }

    async fn jump_to(&mut self, step: StepId) {
        match self.state.jump_to(step) {
            Some(transition) => self.apply_transition(transition).await,
            None => warn!(
                "Jump to {step} ignored (position {:?}, plan {:?})",
                self.state.position(),
                self.state.plan().steps()
            ),
        }
    }

    async fn apply_transition(&mut self, transition: Transition) {
        info!(
            "{} {}: {} -> {}",
            self.kind.as_str(),
            self.target_id,
            transition.from,
            transition.to
        );
        self.leave_step(transition.from).await;
        self.emit(FlowEvent::StepChanged {
            from: Some(transition.from),
            to: transition.to,
        });
        self.enter_step(transition.to);
    }

    fn enter_step(&mut self, step: StepId) {
        match step {
            StepId::Gps => {
                self.tracker_snapshot = TrackerSnapshot::acquiring();
                self.evaluation = None;
                if let Err(err) = self
                    .tracker
                    .start(self.collaborators.positions.as_ref(), self.tracker_tx.clone())
                {
                    error!("Failed to start position watch: {err:?}");
                }
                // An upload still in flight keeps the slot until it ends.
                let upload_reporting = self.pipeline.is_uploading()
                    && self.status_owner == Some(StatusOwner::Upload);
                if self.tracker_snapshot.latest_fix.is_none() && !upload_reporting {
                    self.present_status(StatusOwner::Location, &copy::acquiring_location());
                }
            }
            StepId::Capture => {
                self.notices.show_pending(
                    NotificationCategory::CaptureGuide,
                    &copy::capture_guide(self.config.photo_mode),
                );
            }
            StepId::Submit => self.maybe_auto_submit(),
            StepId::Survey | StepId::PreShiftTask | StepId::PostShiftTask => {}
        }
    }

    async fn leave_step(&mut self, step: StepId) {
        match step {
            StepId::Gps => {
                self.stop_tracking().await;
                self.release_location_status();
                self.notices.remove(NotificationCategory::RangeWarning);
            }
            StepId::Capture => {
                self.notices.remove(NotificationCategory::CaptureGuide);
            }
            StepId::Survey | StepId::PreShiftTask | StepId::Submit | StepId::PostShiftTask => {}
        }
    }

    async fn stop_tracking(&mut self) {
        if let Err(err) = self.tracker.stop().await {
            error!("Failed to stop position watch: {err:?}");
        }
        self.tracker_snapshot = TrackerSnapshot::default();
        self.evaluation = None;
    }

    async fn release(&mut self) {
        self.stop_tracking().await;
        self.notices.remove_all();
        self.status_owner = None;
        self.deferred_status = None;
    }

    fn release_lease(&mut self) {
        if self.lease.take().is_some() {
            debug!("Released session lease for {}", self.target_id);
        }
    }

    fn present_status(&mut self, owner: StatusOwner, notice: &Notice) {
        self.notices.present(NotificationCategory::Status, notice);
        self.status_owner = Some(owner);
    }

    /// Drops the location notice, if it is the one showing, and hands the
    /// slot back to the upload.
    fn release_location_status(&mut self) {
        if self.status_owner != Some(StatusOwner::Location) {
            return;
        }
        self.notices.remove(NotificationCategory::Status);
        self.status_owner = None;

        if let Some(notice) = self.deferred_status.take() {
            self.present_status(StatusOwner::Upload, &notice);
        } else if self.pipeline.is_uploading() {
            let percent = self.pipeline.state().progress_percent;
            self.present_status(StatusOwner::Upload, &copy::uploading(percent));
        }
    }

    async fn complete(&mut self) {
        if let Some(step) = self.state.current_step() {
            self.leave_step(step).await;
        }
        self.state.finish();
        self.stop_tracking().await;
        self.release_lease();

        let destination = self.done_destination.clone();
        info!(
            "{} for {} complete; navigating to {destination}",
            self.kind.as_str(),
            self.target_id
        );
        self.collaborators.navigator.navigate_to(&destination);
        self.emit(FlowEvent::Completed { destination });
    }

    async fn finish(&mut self) {
        if self.record.is_none() {
            warn!("Finish ignored: nothing has been submitted for {}", self.target_id);
            return;
        }
        if self.state.position().is_terminal() {
            return;
        }
        self.complete().await;
    }

    async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.release().await;
        self.release_lease();
        info!("Session flow for {} torn down", self.target_id);
        self.emit(FlowEvent::TornDown);
    }

    // ----- gps -----

    fn can_advance_from_gps(&self) -> bool {
        let has_fix = self.tracker_snapshot.latest_fix.is_some();
        let within = self.evaluation.map(|eval| eval.within).unwrap_or(false);
        can_advance_from_gps_step(self.config.gps_mode, has_fix, within)
    }

    async fn confirm_location(&mut self) {
        if self.state.current_step() != Some(StepId::Gps) {
            warn!("Confirm location ignored outside the gps step");
            return;
        }
        let Some(fix) = self.tracker_snapshot.latest_fix else {
            warn!("Confirm location ignored: no fix yet");
            return;
        };
        if !self.can_advance_from_gps() {
            warn!(
                "Confirm location ignored: fix is outside the geofence ({:?})",
                self.evaluation
            );
            return;
        }

        info!(
            "Committed location ({:.6}, {:.6}) ±{:.0}m for {}",
            fix.lat, fix.lng, fix.accuracy_meters, self.target_id
        );
        self.committed_location = Some(fix);
        if let Some(transition) = self.state.advance() {
            self.apply_transition(transition).await;
        }
    }

    fn on_tracker_event(&mut self, event: TrackerEvent) {
        if !self.tracker.is_active() || event.subscription != self.tracker.subscription() {
            debug!("Dropping event from stale position watch {}", event.subscription);
            return;
        }

        let cause = event.cause;
        self.tracker_snapshot = event.snapshot;
        self.evaluation = match (self.tracker_snapshot.latest_fix, self.geofence) {
            (Some(fix), Some(fence)) => Some(fence.evaluate(&fix)),
            _ => None,
        };

        match cause {
            TrackerCause::Error => {
                if let Some(err) = self.tracker_snapshot.error.clone() {
                    self.present_status(StatusOwner::Location, &copy::location_error(&err));
                    self.emit(FlowEvent::LocationFailed {
                        kind: err.kind().to_string(),
                        message: err.message().to_string(),
                    });
                }
            }
            TrackerCause::Fix | TrackerCause::Settled => {
                let settled = self.tracker_snapshot.latest_fix.is_some()
                    && !self.tracker_snapshot.acquiring
                    && self.tracker_snapshot.error.is_none();
                if settled {
                    self.release_location_status();
                }
            }
        }

        self.sync_range_warning();

        if cause == TrackerCause::Fix {
            if let Some(fix) = self.tracker_snapshot.latest_fix {
                self.emit(FlowEvent::LocationUpdated {
                    fix,
                    evaluation: self.evaluation,
                    can_advance: self.can_advance_from_gps(),
                });
            }
        }
    }

    /// Shown only in strict mode, on a settled fix that is out of range.
    /// Anything ambiguous (still acquiring, errored) hides it.
    fn sync_range_warning(&mut self) {
        let eligible = self.state.current_step() == Some(StepId::Gps)
            && self.config.gps_mode.is_strict()
            && !self.tracker_snapshot.acquiring
            && self.tracker_snapshot.error.is_none();

        match self.evaluation {
            Some(eval) if eligible && !eval.within => {
                self.notices
                    .present(NotificationCategory::RangeWarning, &copy::out_of_range(&eval));
            }
            _ => {
                self.notices.remove(NotificationCategory::RangeWarning);
            }
        }
    }

    // ----- capture -----

    fn photo_required(&self) -> bool {
        self.config.require_photo_verification || self.state.plan().contains(StepId::Capture)
    }

    fn confirm_capture(&mut self, artifact: ImageArtifact) {
        if self.state.current_step() != Some(StepId::Capture) {
            warn!("Capture ignored outside the capture step");
            return;
        }
        if self.pipeline.is_uploading() {
            warn!("Capture ignored: an upload is already in flight");
            return;
        }

        self.notices.remove(NotificationCategory::CaptureGuide);
        match self.pipeline.begin(
            artifact,
            self.collaborators.uploader.clone(),
            self.upload_tx.clone(),
            &mut self.notices,
        ) {
            Ok(generation) => {
                self.status_owner = Some(StatusOwner::Upload);
                self.deferred_status = None;
                self.photo_url = None;
                self.emit(FlowEvent::UploadStarted { generation });
            }
            Err(err) => warn!("Capture ignored: {err}"),
        }
    }

    fn camera_failed(&mut self, err: CameraError) {
        self.notices.remove(NotificationCategory::CaptureGuide);
        if err != CameraError::Cancelled {
            self.present_status(StatusOwner::Flow, &copy::camera_failed(&err));
        }
    }

    async fn on_upload_event(&mut self, event: UploadEvent) {
        let withheld = self.status_owner == Some(StatusOwner::Location);
        let notices = if withheld { None } else { Some(&mut self.notices) };
        match self.pipeline.apply(event, notices) {
            Some(PipelineOutcome::Progress(percent)) => {
                self.emit(FlowEvent::UploadProgress { percent });
            }
            Some(PipelineOutcome::Uploaded { url, notice }) => {
                if let Some(stamp) = notice {
                    self.schedule(
                        self.settings.success_notice(),
                        FlowSignal::NoticeExpired {
                            category: NotificationCategory::Status,
                            stamp,
                        },
                    );
                }
                self.photo_url = Some(url.clone());
                self.emit(FlowEvent::UploadFinished { url: url.clone() });

                if self.state.position().is_terminal() || self.record.is_some() {
                    return;
                }
                // The user may have moved around while the upload ran;
                // landing on submit is idempotent.
                if self.state.current_step() != Some(StepId::Submit) {
                    if let Some(transition) = self.state.jump_to(StepId::Submit) {
                        self.apply_transition(transition).await;
                    }
                }
                self.submit(Some(url));
            }
            Some(PipelineOutcome::Failed(err)) => {
                if withheld {
                    self.deferred_status = Some(copy::upload_failed(&err));
                }
                self.emit(FlowEvent::UploadFailed {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                });
            }
            None => {}
        }
    }

    // ----- submit -----

    fn maybe_auto_submit(&mut self) {
        if self.photo_required()
            || self.photo_url.is_some()
            || self.pipeline.is_uploading()
            || self.record.is_some()
            || self.submission == SubmissionStatus::InFlight
        {
            return;
        }
        if !self.state.take_auto_submit() {
            return;
        }
        info!("No photo needed for {}; submitting automatically", self.target_id);
        self.submit(None);
    }

    fn resubmit(&mut self) {
        if self.state.current_step() != Some(StepId::Submit) {
            warn!("Resubmit ignored outside the submit step");
            return;
        }
        if self.record.is_some() {
            warn!("Resubmit ignored: {} is already recorded", self.target_id);
            return;
        }
        if self.photo_required() && self.photo_url.is_none() {
            warn!("Resubmit ignored: a photo is required; capture one first");
            return;
        }
        self.submit(self.photo_url.clone());
    }

    fn submit(&mut self, photo_url: Option<String>) {
        if self.submission == SubmissionStatus::InFlight {
            warn!("Submission already in flight for {}", self.target_id);
            return;
        }

        self.submission = SubmissionStatus::InFlight;
        self.attempt += 1;
        let attempt = self.attempt;
        let kind = self.kind;
        let request = AttendanceRequest {
            kind,
            target_id: self.target_id.clone(),
            location: self.committed_location.into(),
            photo_url,
            requested_at: Utc::now(),
        };

        info!(
            "Submitting {} for {} (attempt {attempt})",
            kind.as_str(),
            self.target_id
        );

        let api = self.collaborators.attendance.clone();
        let signals = self.signal_tx.clone();
        tokio::spawn(async move {
            let result = match kind {
                AttendanceKind::CheckIn => api.submit_check_in(request).await,
                AttendanceKind::CheckOut => api.submit_check_out(request).await,
            };
            let _ = signals.send(FlowSignal::SubmissionFinished { attempt, result });
        });

        self.emit(FlowEvent::Submitting { attempt });
    }

    fn on_submitted(&mut self, record: AttendanceRecord) {
        self.submission = SubmissionStatus::Succeeded;

        // Session-scoped artifacts are spent once the record exists.
        self.committed_location = None;
        self.tracker_snapshot = TrackerSnapshot::default();
        self.evaluation = None;
        self.pipeline.reset();
        self.photo_url = None;

        let show_for = self.settings.success_notice();
        self.present_status(StatusOwner::Flow, &copy::submitted(self.kind, show_for));
        if let Some(stamp) = self.notices.stamp(NotificationCategory::Status) {
            self.schedule(
                show_for,
                FlowSignal::NoticeExpired {
                    category: NotificationCategory::Status,
                    stamp,
                },
            );
        }

        info!(
            "{} recorded for {} as {}",
            self.kind.as_str(),
            self.target_id,
            record.id
        );
        self.record = Some(record.clone());
        self.emit(FlowEvent::Submitted { record });
        self.schedule(
            self.settings.post_submit_delay(),
            FlowSignal::PostSubmitElapsed {
                attempt: self.attempt,
            },
        );
    }

    fn on_submission_failed(&mut self, err: SubmissionError) {
        self.submission = SubmissionStatus::Failed;
        warn!(
            "{} for {} failed: {err}",
            self.kind.as_str(),
            self.target_id
        );
        self.present_status(StatusOwner::Flow, &copy::submission_failed(self.kind, &err));
        self.emit(FlowEvent::SubmissionFailed {
            kind: err.kind().to_string(),
            message: err.message().to_string(),
        });
    }

    async fn on_signal(&mut self, signal: FlowSignal) {
        match signal {
            FlowSignal::SubmissionFinished { attempt, result } => {
                if attempt != self.attempt || self.submission != SubmissionStatus::InFlight {
                    debug!("Dropping result of superseded submission {attempt}");
                    return;
                }
                match result {
                    Ok(record) => self.on_submitted(record),
                    Err(err) => self.on_submission_failed(err),
                }
            }
            FlowSignal::PostSubmitElapsed { attempt } => {
                // The user may have stepped back after the record landed;
                // the exit runs from wherever they are.
                if attempt != self.attempt || self.state.position().is_terminal() {
                    return;
                }
                if !self.state.plan().contains(StepId::PostShiftTask) {
                    self.complete().await;
                } else if self.state.current_step() != Some(StepId::PostShiftTask) {
                    self.jump_to(StepId::PostShiftTask).await;
                }
            }
            FlowSignal::NoticeExpired { category, stamp } => {
                let expired = self.notices.expire(category, &stamp);
                if expired && category == NotificationCategory::Status {
                    self.status_owner = None;
                }
            }
        }
    }

    // ----- plumbing -----

    fn schedule(&self, after: Duration, signal: FlowSignal) {
        let signals = self.signal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = signals.send(signal);
        });
    }

    fn emit(&self, event: FlowEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            kind: self.kind,
            target_id: self.target_id.clone(),
            position: self.state.position(),
            plan: self.state.plan().steps().to_vec(),
            step_index: self.state.index(),
            tracking: self.tracker.is_active(),
            tracker: self.tracker_snapshot.clone(),
            geofence: self.evaluation,
            can_advance_from_gps: self.can_advance_from_gps(),
            committed_location: self.committed_location,
            upload: self.pipeline.state().clone(),
            photo_url: self.photo_url.clone(),
            submission: self.submission,
            record: self.record.clone(),
            live_notifications: self.notices.live_categories(),
        }
    }
}
