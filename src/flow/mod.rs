pub mod controller;
pub mod events;
pub mod registry;
pub mod state;

pub use controller::SessionFlow;
pub use events::{FlowEvent, FlowSnapshot, SubmissionStatus};
pub use registry::{SessionLease, SessionRegistry};
pub use state::{FlowState, Retreat, Transition};
