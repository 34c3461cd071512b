//! Domain models for the School Insights import pipeline.

pub mod import_event;
pub mod performance;
pub mod school;
pub mod upload;

// Re-export commonly used types
pub use import_event::{ImportEvent, ImportEventMessage};
pub use performance::PerformanceRecord;
pub use school::{KnownSchool, SchoolRecord};
pub use upload::{
    BatchOutcome, FileKind, FileSummary, ImportedRecords, SessionSnapshot, UploadStatus,
    UploadedFile,
};
