pub mod pipeline;
pub mod state;

pub use pipeline::{CapturePipeline, PipelineOutcome, ProgressReporter, UploadEvent, UploadEventKind};
pub use state::{UploadPhase, UploadState};
