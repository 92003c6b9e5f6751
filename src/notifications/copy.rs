//! User-facing notice text for each flow situation.

use std::time::Duration;

use crate::error::{CameraError, GeolocationError, SubmissionError, UploadError};
use crate::geofence::GeofenceEvaluation;
use crate::models::{AttendanceKind, PhotoMode};

use super::{Notice, NotificationLevel};

pub fn acquiring_location() -> Notice {
    Notice::new(
        NotificationLevel::Pending,
        "Locating you",
        "Getting your current position. Keep location services on.",
    )
}

pub fn location_error(err: &GeolocationError) -> Notice {
    let hint = match err {
        GeolocationError::PermissionDenied(_) => "Allow location access in your browser settings.",
        GeolocationError::Unavailable(_) => "Move to an open area and try again.",
        GeolocationError::Timeout(_) => "It is taking too long to find you. Try again.",
    };
    Notice::new(
        NotificationLevel::Error,
        "Location unavailable",
        format!("{} {hint}", err.message()),
    )
}

pub fn out_of_range(eval: &GeofenceEvaluation) -> Notice {
    Notice::new(
        NotificationLevel::Warning,
        "Outside the work area",
        format!(
            "You are {:.0}m from the shift location; you must be within {:.0}m to continue.",
            eval.distance_meters, eval.radius_meters
        ),
    )
}

pub fn capture_guide(mode: PhotoMode) -> Notice {
    let message = if mode.is_face_verification() {
        "Face the camera directly in good light. Remove hats, masks and sunglasses; your whole face must be visible."
    } else {
        "Take a clear photo to confirm your attendance."
    };
    Notice::new(NotificationLevel::Info, "Photo check", message)
}

pub fn camera_failed(err: &CameraError) -> Notice {
    Notice::new(
        NotificationLevel::Error,
        "Camera unavailable",
        format!("{err}. You can try taking the photo again."),
    )
}

pub fn uploading(percent: u8) -> Notice {
    Notice::new(
        NotificationLevel::Pending,
        "Uploading photo",
        format!("{percent}% uploaded"),
    )
    .with_progress(percent)
}

pub fn upload_succeeded(show_for: Duration) -> Notice {
    Notice::new(NotificationLevel::Success, "Photo uploaded", "Your photo was uploaded.")
        .with_progress(100)
        .auto_close_after(show_for)
}

pub fn upload_failed(err: &UploadError) -> Notice {
    Notice::new(
        NotificationLevel::Error,
        "Upload failed",
        format!("{err}. Take the photo again to retry."),
    )
}

pub fn submitted(kind: AttendanceKind, show_for: Duration) -> Notice {
    let title = match kind {
        AttendanceKind::CheckIn => "Checked in",
        AttendanceKind::CheckOut => "Checked out",
    };
    Notice::new(
        NotificationLevel::Success,
        title,
        format!("Your {} was recorded.", kind.as_str()),
    )
    .auto_close_after(show_for)
}

pub fn submission_failed(kind: AttendanceKind, err: &SubmissionError) -> Notice {
    Notice::new(
        NotificationLevel::Error,
        format!("Could not {}", kind.as_str()),
        err.message().to_string(),
    )
}
