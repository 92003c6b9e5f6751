use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;

use crate::collaborators::Uploader;
use crate::error::UploadError;
use crate::models::{ImageArtifact, UploadedFile};
use crate::notifications::{copy, NoticeStamp, NotificationCategory, NotificationLifecycle};

use super::state::UploadState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone)]
pub enum UploadEventKind {
    /// The pending-notice delay elapsed while the upload was still running.
    NoticeDue,
    Progress(u8),
    Finished(Result<UploadedFile, UploadError>),
}

#[derive(Debug, Clone)]
pub struct UploadEvent {
    pub generation: u64,
    pub kind: UploadEventKind,
}

/// Handed to the uploader so it can report percent complete.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    generation: u64,
    events: mpsc::UnboundedSender<UploadEvent>,
}

impl ProgressReporter {
    pub fn new(generation: u64, events: mpsc::UnboundedSender<UploadEvent>) -> Self {
        Self { generation, events }
    }

    pub fn report(&self, percent: u8) {
        let _ = self.events.send(UploadEvent {
            generation: self.generation,
            kind: UploadEventKind::Progress(percent.min(100)),
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Progress(u8),
    Uploaded {
        url: String,
        /// Success notice that should be dropped once it expires.
        notice: Option<NoticeStamp>,
    },
    Failed(UploadError),
}

/// Capture -> upload. One upload in flight at a time; the caller keeps the
/// capture trigger disabled while `is_uploading()` holds.
pub struct CapturePipeline {
    state: UploadState,
    generation: u64,
    notice_delay: Duration,
    success_notice: Duration,
}

impl CapturePipeline {
    pub fn new(notice_delay: Duration, success_notice: Duration) -> Self {
        Self {
            state: UploadState::default(),
            generation: 0,
            notice_delay,
            success_notice,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_uploading(&self) -> bool {
        self.state.is_uploading()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Marks the upload as started and runs it in the background; returns
    /// without waiting for the network.
    pub fn begin(
        &mut self,
        artifact: ImageArtifact,
        uploader: Arc<dyn Uploader>,
        events: mpsc::UnboundedSender<UploadEvent>,
        notices: &mut NotificationLifecycle,
    ) -> Result<u64> {
        if self.state.is_uploading() {
            bail!("an upload is already in flight");
        }

        // A fresh capture clears the previous upload's error.
        notices.remove(NotificationCategory::Status);
        self.state.reset();
        self.state.start();
        self.generation += 1;
        let generation = self.generation;

        log_info!(
            "upload {} started: {} ({} bytes)",
            generation,
            artifact.file_name,
            artifact.bytes.len()
        );

        let notice_delay = self.notice_delay;
        tokio::spawn(async move {
            let notice_timer = {
                let events = events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(notice_delay).await;
                    let _ = events.send(UploadEvent {
                        generation,
                        kind: UploadEventKind::NoticeDue,
                    });
                })
            };

            let reporter = ProgressReporter::new(generation, events.clone());
            let result = uploader.upload(artifact, reporter).await;
            notice_timer.abort();

            if let Err(err) = &result {
                log_error!("upload {} failed: {}", generation, err);
            }
            let _ = events.send(UploadEvent {
                generation,
                kind: UploadEventKind::Finished(result),
            });
        });

        Ok(generation)
    }

    /// Folds one upload event into the state. Pass `None` for `notices`
    /// while another owner holds the status slot: the upload still moves
    /// through its phases but leaves the slot alone.
    pub fn apply(
        &mut self,
        event: UploadEvent,
        notices: Option<&mut NotificationLifecycle>,
    ) -> Option<PipelineOutcome> {
        if event.generation != self.generation || !self.state.is_uploading() {
            log_debug!(
                "dropping upload event for generation {} (current {}, {:?})",
                event.generation,
                self.generation,
                self.state.phase
            );
            return None;
        }

        match event.kind {
            UploadEventKind::NoticeDue => {
                if let Some(notices) = notices {
                    notices.show_pending(
                        NotificationCategory::Status,
                        &copy::uploading(self.state.progress_percent),
                    );
                }
                None
            }
            UploadEventKind::Progress(percent) => {
                self.state.record_progress(percent);
                let current = self.state.progress_percent;
                if let Some(notices) = notices {
                    notices.update(NotificationCategory::Status, &copy::uploading(current));
                }
                Some(PipelineOutcome::Progress(current))
            }
            UploadEventKind::Finished(Ok(file)) => {
                self.state.succeed(file.url.clone());
                let mut notice = None;
                if let Some(notices) = notices {
                    if notices.update(
                        NotificationCategory::Status,
                        &copy::upload_succeeded(self.success_notice),
                    ) {
                        notice = notices.stamp(NotificationCategory::Status);
                    }
                }
                log_info!("upload {} finished: {}", event.generation, file.url);
                Some(PipelineOutcome::Uploaded {
                    url: file.url,
                    notice,
                })
            }
            UploadEventKind::Finished(Err(err)) => {
                self.state.fail();
                if let Some(notices) = notices {
                    notices.present(NotificationCategory::Status, &copy::upload_failed(&err));
                }
                Some(PipelineOutcome::Failed(err))
            }
        }
    }
}
