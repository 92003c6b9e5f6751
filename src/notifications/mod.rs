pub mod copy;
pub mod lifecycle;

pub use lifecycle::{NoticeStamp, NotificationLifecycle};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Status,
    RangeWarning,
    CaptureGuide,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 3] = [
        NotificationCategory::Status,
        NotificationCategory::RangeWarning,
        NotificationCategory::CaptureGuide,
    ];

    pub(crate) fn slot(&self) -> usize {
        match self {
            NotificationCategory::Status => 0,
            NotificationCategory::RangeWarning => 1,
            NotificationCategory::CaptureGuide => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Status => "status",
            NotificationCategory::RangeWarning => "range_warning",
            NotificationCategory::CaptureGuide => "capture_guide",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Pending,
    Info,
    Success,
    Warning,
    Error,
}

/// Opaque id handed out by the notification service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    /// `None` keeps the notice until it is removed.
    pub auto_close_ms: Option<u64>,
    /// 0..=100 while an upload is in flight.
    pub progress_percent: Option<u8>,
}

impl Notice {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            auto_close_ms: None,
            progress_percent: None,
        }
    }

    pub fn auto_close_after(mut self, duration: Duration) -> Self {
        self.auto_close_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress_percent = Some(percent.min(100));
        self
    }

    pub fn auto_close(&self) -> Option<Duration> {
        self.auto_close_ms.map(Duration::from_millis)
    }
}
