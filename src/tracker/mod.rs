pub mod controller;
pub mod loop_worker;

pub use controller::GeolocationTracker;
pub use loop_worker::{TrackerCause, TrackerEvent, TrackerSnapshot};
