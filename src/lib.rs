//! Attendance session flow engine: plans the check-in/check-out steps,
//! gates the GPS step on a geofence, uploads the verification photo and
//! submits the attendance record.

pub mod capture;
pub mod collaborators;
pub mod demo;
pub mod error;
pub mod flow;
pub mod geofence;
pub mod models;
pub mod notifications;
pub mod planner;
pub mod settings;
pub mod sim;
pub mod tracker;
pub mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

pub use collaborators::Collaborators;
pub use error::{CameraError, GeolocationError, PreconditionError, SubmissionError, UploadError};
pub use flow::{FlowEvent, FlowSnapshot, SessionFlow, SessionRegistry, SubmissionStatus};
pub use settings::{FlowSettings, SettingsStore};

/// Entry point for the demo binary.
pub fn run() -> Result<()> {
    // RUST_LOG wins over the default level.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    info!("attendance-flow starting up...");

    let settings = match std::env::var_os(settings::SETTINGS_PATH_ENV) {
        Some(path) => SettingsStore::new(PathBuf::from(path))?.flow(),
        None => FlowSettings::default(),
    }
    .with_env_overrides();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(demo::run_demo(settings))
}
