//! Import notification events streamed to dashboard clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FileKind, SessionSnapshot, UploadStatus, UploadedFile};

/// Event published on every upload session transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum ImportEvent {
    /// A file entered the session.
    FileAdded(FilePayload),
    /// A file changed status or message.
    FileUpdated(FilePayload),
    /// A file was removed by the user.
    FileRemoved(FileRemovedPayload),
    /// A batch started sending files to the database.
    BatchStarted(BatchStartedPayload),
    /// Overall batch progress advanced.
    BatchProgress(BatchProgressPayload),
    /// A batch finished or aborted.
    BatchFinished(BatchFinishedPayload),
    /// Whole session state, sent to one client when it connects or falls behind.
    Snapshot(SessionSnapshot),
}

/// Payload for file_added and file_updated events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub file_id: Uuid,
    pub kind: FileKind,
    pub file_name: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_references: Vec<String>,
}

/// Payload for file_removed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRemovedPayload {
    pub file_id: Uuid,
    pub kind: FileKind,
    pub file_name: String,
}

/// Payload for batch_started event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStartedPayload {
    pub total_files: usize,
}

/// Payload for batch_progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgressPayload {
    pub completed_files: usize,
    pub total_files: usize,
    pub progress_percent: u8,
}

/// Payload for batch_finished event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFinishedPayload {
    pub completed_files: usize,
    pub total_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_file: Option<String>,
}

/// Wrapper that includes timestamp with every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportEventMessage {
    #[serde(flatten)]
    pub event: ImportEvent,
    pub timestamp: DateTime<Utc>,
}

impl ImportEventMessage {
    /// Create a new event message with the current timestamp.
    pub fn new(event: ImportEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

impl FilePayload {
    fn from_file(file: &UploadedFile) -> Self {
        Self {
            file_id: file.id,
            kind: file.kind,
            file_name: file.file_name.clone(),
            status: file.status,
            message: file.message.clone(),
            record_count: file.record_count(),
            skipped_references: file.skipped_references.clone(),
        }
    }
}

impl ImportEvent {
    pub fn file_added(file: &UploadedFile) -> Self {
        ImportEvent::FileAdded(FilePayload::from_file(file))
    }

    pub fn file_updated(file: &UploadedFile) -> Self {
        ImportEvent::FileUpdated(FilePayload::from_file(file))
    }

    pub fn file_removed(file: &UploadedFile) -> Self {
        ImportEvent::FileRemoved(FileRemovedPayload {
            file_id: file.id,
            kind: file.kind,
            file_name: file.file_name.clone(),
        })
    }

    pub fn batch_started(total_files: usize) -> Self {
        ImportEvent::BatchStarted(BatchStartedPayload { total_files })
    }

    pub fn batch_progress(completed_files: usize, total_files: usize, progress_percent: u8) -> Self {
        ImportEvent::BatchProgress(BatchProgressPayload {
            completed_files,
            total_files,
            progress_percent,
        })
    }

    pub fn batch_finished(
        completed_files: usize,
        total_files: usize,
        failed_file: Option<String>,
    ) -> Self {
        ImportEvent::BatchFinished(BatchFinishedPayload {
            completed_files,
            total_files,
            failed_file,
        })
    }
}
