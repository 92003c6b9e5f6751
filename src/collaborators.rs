//! Seams to the outside world. The engine only orchestrates these.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::capture::ProgressReporter;
use crate::error::{CameraError, GeolocationError, SubmissionError, UploadError};
use crate::models::{AttendanceRecord, AttendanceRequest, GeoFix, ImageArtifact, UploadedFile};
use crate::notifications::{Notice, NotificationId};

pub type PositionReading = Result<GeoFix, GeolocationError>;

/// Continuous device location.
pub trait PositionSource: Send + Sync {
    /// Starts a watch. The watch ends when the receiver is dropped, which is
    /// how the tracker unsubscribes.
    fn watch(&self) -> mpsc::Receiver<PositionReading>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture_image(&self) -> Result<ImageArtifact, CameraError>;
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        artifact: ImageArtifact,
        progress: ProgressReporter,
    ) -> Result<UploadedFile, UploadError>;
}

#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn submit_check_in(
        &self,
        request: AttendanceRequest,
    ) -> Result<AttendanceRecord, SubmissionError>;

    async fn submit_check_out(
        &self,
        request: AttendanceRequest,
    ) -> Result<AttendanceRecord, SubmissionError>;
}

/// Toast/push notification service addressed by id.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: &Notice) -> NotificationId;
    fn update(&self, id: &NotificationId, notice: &Notice);
    fn remove(&self, id: &NotificationId);
}

pub trait Navigator: Send + Sync {
    fn navigate_back(&self);
    fn navigate_to(&self, destination: &str);
}

#[derive(Clone)]
pub struct Collaborators {
    pub positions: Arc<dyn PositionSource>,
    pub uploader: Arc<dyn Uploader>,
    pub attendance: Arc<dyn AttendanceApi>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}
