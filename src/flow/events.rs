use serde::Serialize;

use crate::capture::UploadState;
use crate::geofence::GeofenceEvaluation;
use crate::models::{AttendanceKind, AttendanceRecord, FlowPosition, GeoFix, StepId};
use crate::notifications::NotificationCategory;
use crate::tracker::TrackerSnapshot;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    InFlight,
    Failed,
    Succeeded,
}

/// Broadcast to anyone rendering the flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowEvent {
    StepChanged {
        from: Option<StepId>,
        to: StepId,
    },
    LocationUpdated {
        fix: GeoFix,
        evaluation: Option<GeofenceEvaluation>,
        can_advance: bool,
    },
    LocationFailed {
        kind: String,
        message: String,
    },
    UploadStarted {
        generation: u64,
    },
    UploadProgress {
        percent: u8,
    },
    UploadFinished {
        url: String,
    },
    UploadFailed {
        kind: String,
        message: String,
    },
    Submitting {
        attempt: u64,
    },
    Submitted {
        record: AttendanceRecord,
    },
    SubmissionFailed {
        kind: String,
        message: String,
    },
    Exited,
    Completed {
        destination: String,
    },
    TornDown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub kind: AttendanceKind,
    pub target_id: String,
    pub position: FlowPosition,
    pub plan: Vec<StepId>,
    pub step_index: usize,
    pub tracking: bool,
    pub tracker: TrackerSnapshot,
    pub geofence: Option<GeofenceEvaluation>,
    pub can_advance_from_gps: bool,
    pub committed_location: Option<GeoFix>,
    pub upload: UploadState,
    pub photo_url: Option<String>,
    pub submission: SubmissionStatus,
    pub record: Option<AttendanceRecord>,
    pub live_notifications: Vec<NotificationCategory>,
}

impl FlowSnapshot {
    pub fn step(&self) -> Option<StepId> {
        self.position.step()
    }

    pub fn has_notification(&self, category: NotificationCategory) -> bool {
        self.live_notifications.contains(&category)
    }
}
