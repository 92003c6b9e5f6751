//! In-memory collaborators for the demo binary and the test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::capture::ProgressReporter;
use crate::collaborators::{
    AttendanceApi, Camera, Navigator, Notifier, PositionReading, PositionSource, Uploader,
};
use crate::error::{CameraError, GeolocationError, SubmissionError, UploadError};
use crate::models::{
    AttendanceKind, AttendanceRecord, AttendanceRequest, GeoFix, ImageArtifact, UploadedFile,
};
use crate::notifications::{Notice, NotificationId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Position source fed by hand through `push_fix` / `push_error`.
pub struct ScriptedPositionSource {
    sender: Mutex<Option<mpsc::Sender<PositionReading>>>,
    watches: AtomicUsize,
}

impl ScriptedPositionSource {
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
            watches: AtomicUsize::new(0),
        }
    }

    /// Returns false when nobody is watching.
    pub fn push_fix(&self, fix: GeoFix) -> bool {
        self.push(Ok(fix))
    }

    pub fn push_error(&self, err: GeolocationError) -> bool {
        self.push(Err(err))
    }

    fn push(&self, reading: PositionReading) -> bool {
        match lock(&self.sender).as_ref() {
            Some(tx) => tx.try_send(reading).is_ok(),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.sender)
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub fn watch_count(&self) -> usize {
        self.watches.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for ScriptedPositionSource {
    fn watch(&self) -> mpsc::Receiver<PositionReading> {
        let (tx, rx) = mpsc::channel(64);
        *lock(&self.sender) = Some(tx);
        self.watches.fetch_add(1, Ordering::SeqCst);
        rx
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotifierCall {
    Show(NotificationId, Notice),
    Update(NotificationId, Notice),
    Remove(NotificationId),
}

/// Notification service that remembers every call.
pub struct RecordingNotifier {
    next_id: AtomicU64,
    calls: Mutex<Vec<NotifierCall>>,
    live: Mutex<Vec<(NotificationId, Notice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        lock(&self.calls).clone()
    }

    pub fn live(&self) -> Vec<(NotificationId, Notice)> {
        lock(&self.live).clone()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn current(&self, id: &NotificationId) -> Option<Notice> {
        lock(&self.live)
            .iter()
            .find(|(live_id, _)| live_id == id)
            .map(|(_, notice)| notice.clone())
    }

    pub fn shown(&self) -> Vec<(NotificationId, Notice)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Show(id, notice) => Some((id.clone(), notice.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn removed_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, NotifierCall::Remove(_)))
            .count()
    }

    /// Every version of one notification: the opening notice then each update.
    pub fn history(&self, id: &NotificationId) -> Vec<Notice> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Show(call_id, notice) | NotifierCall::Update(call_id, notice)
                    if call_id == id =>
                {
                    Some(notice.clone())
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notice: &Notice) -> NotificationId {
        let id = NotificationId(format!("toast-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        lock(&self.calls).push(NotifierCall::Show(id.clone(), notice.clone()));
        lock(&self.live).push((id.clone(), notice.clone()));
        id
    }

    fn update(&self, id: &NotificationId, notice: &Notice) {
        lock(&self.calls).push(NotifierCall::Update(id.clone(), notice.clone()));
        if let Some(entry) = lock(&self.live).iter_mut().find(|(live_id, _)| live_id == id) {
            entry.1 = notice.clone();
        }
    }

    fn remove(&self, id: &NotificationId) {
        lock(&self.calls).push(NotifierCall::Remove(id.clone()));
        lock(&self.live).retain(|(live_id, _)| live_id != id);
    }
}

/// Uploader that replays scripted outcomes, optionally reporting progress
/// steps `interval` apart. The last outcome repeats once the script runs out.
pub struct ScriptedUploader {
    outcomes: Mutex<VecDeque<Result<String, UploadError>>>,
    steps: Vec<u8>,
    interval: Duration,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new(outcomes: Vec<Result<String, UploadError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            steps: Vec::new(),
            interval: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(url: impl Into<String>) -> Self {
        Self::new(vec![Ok(url.into())])
    }

    pub fn failing(err: UploadError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn with_steps(mut self, steps: Vec<u8>, interval: Duration) -> Self {
        self.steps = steps;
        self.interval = interval;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<String, UploadError> {
        let mut outcomes = lock(&self.outcomes);
        if outcomes.len() > 1 {
            if let Some(outcome) = outcomes.pop_front() {
                return outcome;
            }
        }
        outcomes
            .front()
            .cloned()
            .unwrap_or_else(|| Err(UploadError::ServerRejected("no scripted outcome".into())))
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(
        &self,
        _artifact: ImageArtifact,
        progress: ProgressReporter,
    ) -> Result<UploadedFile, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for percent in &self.steps {
            tokio::time::sleep(self.interval).await;
            progress.report(*percent);
        }
        self.next_outcome().map(|url| UploadedFile { url })
    }
}

/// Attendance API that records requests and replays scripted outcomes.
pub struct ScriptedAttendanceApi {
    outcomes: Mutex<VecDeque<Result<(), SubmissionError>>>,
    latency: Duration,
    requests: Mutex<Vec<AttendanceRequest>>,
}

impl ScriptedAttendanceApi {
    pub fn accepting() -> Self {
        Self::new(vec![Ok(())])
    }

    pub fn new(outcomes: Vec<Result<(), SubmissionError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests(&self) -> Vec<AttendanceRequest> {
        lock(&self.requests).clone()
    }

    async fn respond(
        &self,
        expected: AttendanceKind,
        request: AttendanceRequest,
    ) -> Result<AttendanceRecord, SubmissionError> {
        lock(&self.requests).push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if request.kind != expected {
            return Err(SubmissionError::ValidationFailed(format!(
                "{} request sent to the {} endpoint",
                request.kind.as_str(),
                expected.as_str()
            )));
        }

        let outcome = {
            let mut outcomes = lock(&self.outcomes);
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap_or(Ok(()))
            } else {
                outcomes.front().cloned().unwrap_or(Ok(()))
            }
        };

        outcome.map(|()| AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            target_id: request.target_id,
            kind: request.kind,
            recorded_at: Utc::now(),
            location: request.location,
            photo_url: request.photo_url,
        })
    }
}

#[async_trait]
impl AttendanceApi for ScriptedAttendanceApi {
    async fn submit_check_in(
        &self,
        request: AttendanceRequest,
    ) -> Result<AttendanceRecord, SubmissionError> {
        self.respond(AttendanceKind::CheckIn, request).await
    }

    async fn submit_check_out(
        &self,
        request: AttendanceRequest,
    ) -> Result<AttendanceRecord, SubmissionError> {
        self.respond(AttendanceKind::CheckOut, request).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationCall {
    Back,
    To(String),
}

pub struct RecordingNavigator {
    calls: Mutex<Vec<NavigationCall>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<NavigationCall> {
        lock(&self.calls).clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_back(&self) {
        lock(&self.calls).push(NavigationCall::Back);
    }

    fn navigate_to(&self, destination: &str) {
        lock(&self.calls).push(NavigationCall::To(destination.to_string()));
    }
}

pub struct StaticCamera {
    result: Result<ImageArtifact, CameraError>,
}

impl StaticCamera {
    pub fn returning(artifact: ImageArtifact) -> Self {
        Self { result: Ok(artifact) }
    }

    pub fn failing(err: CameraError) -> Self {
        Self { result: Err(err) }
    }
}

#[async_trait]
impl Camera for StaticCamera {
    async fn capture_image(&self) -> Result<ImageArtifact, CameraError> {
        self.result.clone()
    }
}
