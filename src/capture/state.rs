use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

/// Moves one way only: idle -> uploading -> success | error. A new capture
/// calls `reset` before `start`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadState {
    pub phase: UploadPhase,
    pub progress_percent: u8,
    pub result_url: Option<String>,
}

impl UploadState {
    pub fn is_uploading(&self) -> bool {
        self.phase == UploadPhase::Uploading
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start(&mut self) -> bool {
        if self.phase != UploadPhase::Idle {
            return false;
        }
        self.phase = UploadPhase::Uploading;
        self.progress_percent = 0;
        self.result_url = None;
        true
    }

    /// Progress never goes backwards within one upload.
    pub fn record_progress(&mut self, percent: u8) -> bool {
        if self.phase != UploadPhase::Uploading {
            return false;
        }
        self.progress_percent = self.progress_percent.max(percent.min(100));
        true
    }

    pub fn succeed(&mut self, url: String) -> bool {
        if self.phase != UploadPhase::Uploading {
            return false;
        }
        self.phase = UploadPhase::Success;
        self.progress_percent = 100;
        self.result_url = Some(url);
        true
    }

    pub fn fail(&mut self) -> bool {
        if self.phase != UploadPhase::Uploading {
            return false;
        }
        self.phase = UploadPhase::Error;
        true
    }
}
