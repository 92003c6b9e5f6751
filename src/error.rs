//! Error taxonomy for the session flow.
//!
//! Geolocation, camera and upload errors are caught where they originate and
//! surfaced as notifications. Submission errors are caught at the orchestrator
//! and leave the flow resumable. Precondition errors stop a flow from starting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum GeolocationError {
    #[error("location permission denied: {0}")]
    PermissionDenied(String),

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out: {0}")]
    Timeout(String),
}

impl GeolocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied(_) => "permissionDenied",
            GeolocationError::Unavailable(_) => "unavailable",
            GeolocationError::Timeout(_) => "timeout",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GeolocationError::PermissionDenied(msg)
            | GeolocationError::Unavailable(msg)
            | GeolocationError::Timeout(msg) => msg,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum UploadError {
    #[error("upload failed (network): {0}")]
    Network(String),

    #[error("upload rejected by server: {0}")]
    ServerRejected(String),
}

impl UploadError {
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Network(_) => "network",
            UploadError::ServerRejected(_) => "serverRejected",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum SubmissionError {
    #[error("submission failed (network): {0}")]
    Network(String),

    #[error("submission rejected: {0}")]
    ValidationFailed(String),

    #[error("server error: {0}")]
    ServerError(String),
}

impl SubmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Network(_) => "network",
            SubmissionError::ValidationFailed(_) => "validationFailed",
            SubmissionError::ServerError(_) => "serverError",
        }
    }

    /// Upstream message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            SubmissionError::Network(msg)
            | SubmissionError::ValidationFailed(msg)
            | SubmissionError::ServerError(msg) => msg,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("capture cancelled")]
    Cancelled,
}

impl CameraError {
    pub fn kind(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied(_) => "permissionDenied",
            CameraError::Unavailable(_) => "unavailable",
            CameraError::Cancelled => "cancelled",
        }
    }
}

/// Fatal: checked once in `SessionFlow::start`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("session config was not supplied")]
    MissingConfig,

    #[error("session requires GPS verification but no geofence target was supplied")]
    MissingTarget,

    #[error("geofence target is invalid: {0}")]
    InvalidTarget(String),

    #[error("a session flow is already active for attendance target {0}")]
    SessionAlreadyActive(String),
}
