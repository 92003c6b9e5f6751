use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AttendanceKind, GeoFix};

/// Finished camera output. The engine never touches the camera itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageArtifact {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl ImageArtifact {
    pub fn jpeg(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "image/jpeg".into(),
            bytes,
            captured_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
}

/// Location sent with a submission. All zeros when nothing was committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommittedLocation {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_meters: f64,
}

impl From<Option<GeoFix>> for CommittedLocation {
    fn from(fix: Option<GeoFix>) -> Self {
        match fix {
            Some(fix) => Self {
                lat: fix.lat,
                lng: fix.lng,
                accuracy_meters: fix.accuracy_meters,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub kind: AttendanceKind,
    pub target_id: String,
    pub location: CommittedLocation,
    pub photo_url: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub target_id: String,
    pub kind: AttendanceKind,
    pub recorded_at: DateTime<Utc>,
    pub location: CommittedLocation,
    pub photo_url: Option<String>,
}
