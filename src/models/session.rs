//! Session-level configuration supplied by the organisation before a flow starts.

use serde::{Deserialize, Serialize};

use crate::geofence::GpsMode;
use crate::models::GeofenceTarget;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

impl AttendanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceKind::CheckIn => "check-in",
            AttendanceKind::CheckOut => "check-out",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoMode {
    #[default]
    NotRequired,
    RequireFacePhoto,
    RequireIdentityVerification,
    #[serde(other)]
    Other,
}

impl PhotoMode {
    /// Face-verification modes get the stricter capture guide.
    pub fn is_face_verification(&self) -> bool {
        matches!(
            self,
            PhotoMode::RequireFacePhoto | PhotoMode::RequireIdentityVerification
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub require_survey: bool,
    pub require_pre_shift_task: bool,
    pub require_gps_verification: bool,
    pub require_photo_verification: bool,
    pub require_post_shift_task: bool,
    pub gps_mode: GpsMode,
    pub photo_mode: PhotoMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_survey: false,
            require_pre_shift_task: false,
            require_gps_verification: false,
            require_photo_verification: false,
            require_post_shift_task: false,
            gps_mode: GpsMode::RequiredAtLocation,
            photo_mode: PhotoMode::NotRequired,
        }
    }
}

impl SessionConfig {
    pub fn has_any_step_flag(&self) -> bool {
        self.require_survey
            || self.require_pre_shift_task
            || self.require_gps_verification
            || self.require_photo_verification
            || self.require_post_shift_task
    }
}

/// Everything the caller hands to `SessionFlow::start`. Read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub kind: AttendanceKind,
    /// Shift or attendance record this session is for.
    pub target_id: String,
    pub config: Option<SessionConfig>,
    pub target: Option<GeofenceTarget>,
    /// Where to navigate once the flow reaches `done`.
    pub done_destination: String,
}

impl SessionContext {
    pub fn new(kind: AttendanceKind, target_id: impl Into<String>) -> Self {
        Self {
            kind,
            target_id: target_id.into(),
            config: None,
            target: None,
            done_destination: "/attendance".into(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_target(mut self, target: GeofenceTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_done_destination(mut self, destination: impl Into<String>) -> Self {
        self.done_destination = destination.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_from_partial_camel_case_json() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"requireGpsVerification": true, "gpsMode": "REQUIRED_BUT_NOT_STRICT", "photoMode": "REQUIRE_FACE_PHOTO"}"#,
        )
        .unwrap();

        assert!(config.require_gps_verification);
        assert!(!config.require_survey);
        assert_eq!(config.gps_mode, GpsMode::RequiredButNotStrict);
        assert_eq!(config.photo_mode, PhotoMode::RequireFacePhoto);
    }

    #[test]
    fn unknown_photo_mode_maps_to_other() {
        let mode: PhotoMode = serde_json::from_str(r#""REQUIRE_BADGE_SCAN""#).unwrap();
        assert_eq!(mode, PhotoMode::Other);
        assert!(!mode.is_face_verification());
        assert!(PhotoMode::RequireIdentityVerification.is_face_verification());
    }

    #[test]
    fn default_config_has_no_step_flags() {
        assert!(!SessionConfig::default().has_any_step_flag());
    }
}
