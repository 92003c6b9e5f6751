pub mod attendance;
pub mod location;
pub mod session;
pub mod step;

pub use attendance::{AttendanceRecord, AttendanceRequest, CommittedLocation, ImageArtifact, UploadedFile};
pub use location::{GeoFix, GeoPoint, GeofenceTarget};
pub use session::{AttendanceKind, PhotoMode, SessionConfig, SessionContext};
pub use step::{FlowPosition, StepId};
