//! Upload session domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PerformanceRecord, SchoolRecord};

/// Category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    School,
    Performance,
    /// Reserved; always fails validation.
    Teacher,
}

impl FileKind {
    /// Get kind name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Performance => "performance",
            Self::Teacher => "teacher",
        }
    }

    /// Parse kind from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "school" | "schools" => Some(Self::School),
            "performance" => Some(Self::Performance),
            "teacher" | "teachers" => Some(Self::Teacher),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an uploaded file.
///
/// `Processing` moves exactly once to `Success` or `Error`. `Success` may later
/// become `Error` when persistence fails. `Error` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Success,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Typed records produced by a successful validation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedRecords {
    Schools(Vec<SchoolRecord>),
    Performance(Vec<PerformanceRecord>),
}

impl ImportedRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Schools(records) => records.len(),
            Self::Performance(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One user-selected file tracked through its lifecycle.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Server-assigned id; (kind, file_name) stays the user-facing identity.
    pub id: Uuid,
    pub kind: FileKind,
    pub file_name: String,
    pub status: UploadStatus,
    pub message: Option<String>,
    /// Present only while `status` is `Success` (and kept after a later persistence failure).
    pub records: Option<ImportedRecords>,
    /// School codes of performance rows dropped during reference resolution.
    pub skipped_references: Vec<String>,
    /// Set once the records have been stored; such files are left out of later batches.
    pub persisted: bool,
    pub created_at: DateTime<Utc>,
}

impl UploadedFile {
    /// Create a new entry in the processing state.
    pub fn processing(kind: FileKind, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            file_name: file_name.into(),
            status: UploadStatus::Processing,
            message: None,
            records: None,
            skipped_references: Vec::new(),
            persisted: false,
            created_at: Utc::now(),
        }
    }

    /// Number of typed records held by this entry.
    pub fn record_count(&self) -> usize {
        self.records.as_ref().map(ImportedRecords::len).unwrap_or(0)
    }

    /// True when this entry should be sent by the next batch.
    pub fn is_pending_persistence(&self) -> bool {
        self.status == UploadStatus::Success
            && !self.persisted
            && self.records.as_ref().is_some_and(|r| !r.is_empty())
    }

    pub fn matches(&self, kind: FileKind, file_name: &str) -> bool {
        self.kind == kind && self.file_name == file_name
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            kind: self.kind,
            file_name: self.file_name.clone(),
            status: self.status,
            message: self.message.clone(),
            record_count: self.record_count(),
            skipped_references: self.skipped_references.clone(),
            persisted: self.persisted,
            created_at: self.created_at,
        }
    }
}

/// Serializable view of an [`UploadedFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: Uuid,
    pub kind: FileKind,
    pub file_name: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_references: Vec<String>,
    pub persisted: bool,
    pub created_at: DateTime<Utc>,
}

/// Current state of the whole upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub files: Vec<FileSummary>,
    pub is_uploading: bool,
    pub progress_percent: u8,
}

/// Result of one `process_files` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Files included in the batch snapshot.
    pub total_files: usize,
    /// Files stored before the batch finished or aborted.
    pub completed_files: usize,
    /// Records stored across completed files.
    pub records_saved: u64,
    /// File that aborted the batch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_file: Option<String>,
    pub progress_percent: u8,
}

impl BatchOutcome {
    /// Outcome of a call that found nothing to send.
    pub fn idle(progress_percent: u8) -> Self {
        Self {
            total_files: 0,
            completed_files: 0,
            records_saved: 0,
            failed_file: None,
            progress_percent,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.total_files == 0
    }

    pub fn aborted(&self) -> bool {
        self.failed_file.is_some()
    }
}
