//! Upload session: per-file validation lifecycle and batch persistence.
//!
//! ## File lifecycle
//!
//! `processing -> success | error`, and `success -> error` only when the
//! record store rejects the file during a batch. `error` is terminal.
//!
//! ## Batches
//!
//! `process_files` snapshots every success file that has not been stored yet
//! and sends them in insertion order. The first store failure marks that file
//! as error and aborts the rest of the batch; files stored earlier keep their
//! results and are not sent again by later batches. Removals are refused while
//! a batch is running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ImportSettings;
use crate::error::{AppError, AppResult, ImportError};
use crate::models::{
    BatchOutcome, FileKind, ImportEvent, ImportedRecords, SessionSnapshot, UploadStatus,
    UploadedFile,
};
use crate::services::event_broadcaster::EventBroadcaster;
use crate::services::mapper::{map_performance_rows, map_school_rows};
use crate::services::references::ReferenceResolver;
use crate::services::schema;
use crate::services::store::RecordStore;
use crate::services::tabular::{RawRow, parse_csv};

// ============================================================================
// Constants
// ============================================================================

const INVALID_FORMAT_MESSAGE: &str = "Invalid file format. Please upload a CSV or XLSX file.";
const XLSX_UNSUPPORTED_MESSAGE: &str = "Excel (.xlsx) file processing is not implemented yet.";

// ============================================================================
// Types
// ============================================================================

/// Upload formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadFormat {
    Csv,
    Xlsx,
}

impl UploadFormat {
    /// Detect the format from a file name, ignoring extension case.
    fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }
}

/// Records accepted from one file.
struct Evaluation {
    records: ImportedRecords,
    skipped: Vec<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    files: Vec<UploadedFile>,
    is_uploading: bool,
    progress_percent: u8,
}

/// Clears `is_uploading` when a batch ends, including when its future is dropped.
struct UploadingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).is_uploading = false;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Percentage of `done` over `total`, rounded to the nearest integer.
fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 * 100.0) / total as f64).round() as u8
}

fn success_message(record_count: usize, skipped: &[String]) -> String {
    let mut message = format!("File is valid. {} records ready for import.", record_count);
    if !skipped.is_empty() {
        let mut schools: Vec<&str> = Vec::new();
        for code in skipped {
            if !schools.contains(&code.as_str()) {
                schools.push(code);
            }
        }
        message.push_str(&format!(
            " {} rows skipped (unknown schools: {}).",
            skipped.len(),
            schools.join(", ")
        ));
    }
    message
}

// ============================================================================
// Session
// ============================================================================

/// Shared import session.
pub struct UploadSession {
    store: Arc<dyn RecordStore>,
    resolver: ReferenceResolver,
    settings: ImportSettings,
    events: EventBroadcaster,
    state: Mutex<SessionState>,
}

impl UploadSession {
    pub fn new(
        store: Arc<dyn RecordStore>,
        settings: ImportSettings,
        events: EventBroadcaster,
    ) -> Self {
        let resolver = ReferenceResolver::new(store.clone(), settings.reference_policy);
        Self {
            store,
            resolver,
            settings,
            events,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// All tracked files, in insertion order.
    pub fn files(&self) -> Vec<UploadedFile> {
        lock(&self.state).files.clone()
    }

    /// First file matching `(kind, file_name)`.
    pub fn file(&self, kind: FileKind, file_name: &str) -> Option<UploadedFile> {
        lock(&self.state)
            .files
            .iter()
            .find(|f| f.matches(kind, file_name))
            .cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        SessionSnapshot {
            files: state.files.iter().map(UploadedFile::summary).collect(),
            is_uploading: state.is_uploading,
            progress_percent: state.progress_percent,
        }
    }

    pub fn is_uploading(&self) -> bool {
        lock(&self.state).is_uploading
    }

    pub fn progress_percent(&self) -> u8 {
        lock(&self.state).progress_percent
    }

    // ------------------------------------------------------------------------
    // add_file
    // ------------------------------------------------------------------------

    /// Track a new file and validate it.
    ///
    /// The entry is visible as `processing` until validation finishes. Returns
    /// the entry in its final state; if it was removed meanwhile the result is
    /// not stored.
    pub async fn add_file(
        &self,
        kind: FileKind,
        file_name: impl Into<String>,
        bytes: &[u8],
    ) -> UploadedFile {
        let file_name = file_name.into();
        let mut entry = UploadedFile::processing(kind, file_name.as_str());

        let Some(format) = UploadFormat::from_file_name(&file_name) else {
            warn!("Rejected {} file with unsupported extension: {}", kind, file_name);
            mark_failed(&mut entry, &ImportError::Format(INVALID_FORMAT_MESSAGE.to_string()));
            self.push(entry.clone());
            return entry;
        };

        self.push(entry.clone());

        let result = match format {
            UploadFormat::Csv => self.evaluate_csv(kind, bytes).await,
            UploadFormat::Xlsx => {
                tokio::time::sleep(self.settings.xlsx_rejection_delay).await;
                Err(ImportError::Format(XLSX_UNSUPPORTED_MESSAGE.to_string()))
            }
        };

        match result {
            Ok(evaluation) => {
                info!(
                    file = %file_name,
                    kind = %kind,
                    records = evaluation.records.len(),
                    skipped = evaluation.skipped.len(),
                    "File validated"
                );
                entry.status = UploadStatus::Success;
                entry.message = Some(success_message(
                    evaluation.records.len(),
                    &evaluation.skipped,
                ));
                entry.records = Some(evaluation.records);
                entry.skipped_references = evaluation.skipped;
            }
            Err(e) => {
                warn!(file = %file_name, kind = %kind, code = e.code(), "File rejected: {}", e);
                mark_failed(&mut entry, &e);
            }
        }

        let replaced = {
            let mut state = lock(&self.state);
            match state.files.iter_mut().find(|f| f.id == entry.id) {
                Some(slot) => {
                    *slot = entry.clone();
                    true
                }
                None => false,
            }
        };

        if replaced {
            self.events.publish(ImportEvent::file_updated(&entry));
        } else {
            debug!("File {} was removed before validation finished", file_name);
        }

        entry
    }

    async fn evaluate_csv(&self, kind: FileKind, bytes: &[u8]) -> Result<Evaluation, ImportError> {
        let rows = parse_csv(bytes)?;
        let policy = self.settings.numeric_policy;

        match kind {
            FileKind::Performance => {
                let known = self.resolver.known_schools().await?;
                if known.is_empty() {
                    return Err(ImportError::ReferenceGap);
                }
                validate_schema(kind, &rows)?;
                let mapping = map_performance_rows(&rows, &known, policy)?;
                Ok(Evaluation {
                    records: ImportedRecords::Performance(mapping.accepted),
                    skipped: mapping.skipped,
                })
            }
            FileKind::School => {
                validate_schema(kind, &rows)?;
                Ok(Evaluation {
                    records: ImportedRecords::Schools(map_school_rows(&rows, policy)?),
                    skipped: Vec::new(),
                })
            }
            FileKind::Teacher => {
                validate_schema(kind, &rows)?;
                Err(ImportError::Validation(format!(
                    "Files of kind '{}' are not supported yet.",
                    kind
                )))
            }
        }
    }

    fn push(&self, entry: UploadedFile) {
        let event = ImportEvent::file_added(&entry);
        lock(&self.state).files.push(entry);
        self.events.publish(event);
    }

    // ------------------------------------------------------------------------
    // remove_file
    // ------------------------------------------------------------------------

    /// Remove the first file matching `(kind, file_name)`.
    ///
    /// Returns `false` when nothing matched. Refused while a batch is running.
    pub fn remove_file(&self, kind: FileKind, file_name: &str) -> AppResult<bool> {
        let removed = {
            let mut state = lock(&self.state);
            if state.is_uploading {
                return Err(AppError::Conflict(
                    "Files cannot be removed while an import is in progress".to_string(),
                ));
            }
            state
                .files
                .iter()
                .position(|f| f.matches(kind, file_name))
                .map(|index| state.files.remove(index))
        };

        match removed {
            Some(file) => {
                info!("Removed {} file {}", kind, file_name);
                self.events.publish(ImportEvent::file_removed(&file));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ------------------------------------------------------------------------
    // process_files
    // ------------------------------------------------------------------------

    /// Send every pending success file to the record store.
    ///
    /// A no-op (state untouched) when nothing is pending.
    pub async fn process_files(&self) -> AppResult<BatchOutcome> {
        let batch: Vec<UploadedFile> = {
            let mut state = lock(&self.state);
            if state.is_uploading {
                return Err(AppError::Conflict(
                    "An import is already in progress".to_string(),
                ));
            }

            let batch: Vec<UploadedFile> = state
                .files
                .iter()
                .filter(|f| f.is_pending_persistence())
                .cloned()
                .collect();

            if batch.is_empty() {
                debug!("No files pending import");
                return Ok(BatchOutcome::idle(state.progress_percent));
            }

            state.is_uploading = true;
            state.progress_percent = 0;
            batch
        };

        let guard = UploadingGuard { state: &self.state };
        let total = batch.len();
        let mut outcome = BatchOutcome {
            total_files: total,
            ..BatchOutcome::idle(0)
        };

        info!("Starting import of {} files", total);
        self.events.publish(ImportEvent::batch_started(total));

        for (index, file) in batch.iter().enumerate() {
            let result = match &file.records {
                Some(ImportedRecords::Schools(records)) => {
                    self.store.insert_school_records(file.id, records).await
                }
                Some(ImportedRecords::Performance(records)) => {
                    self.store.insert_performance_records(file.id, records).await
                }
                None => continue,
            };

            match result {
                Ok(saved) => {
                    let done = index + 1;
                    let percent = progress_percent(done, total);
                    outcome.completed_files = done;
                    outcome.records_saved += saved;
                    outcome.progress_percent = percent;

                    info!(file = %file.file_name, records = saved, "File imported");
                    self.update_file(file.id, |entry| {
                        entry.persisted = true;
                        entry.message = Some(format!(
                            "Data imported successfully! {} records saved.",
                            saved
                        ));
                    });
                    lock(&self.state).progress_percent = percent;
                    self.events
                        .publish(ImportEvent::batch_progress(done, total, percent));
                }
                Err(e) => {
                    let err = ImportError::from(e);
                    error!(file = %file.file_name, "Import aborted: {}", err);
                    self.update_file(file.id, |entry| mark_failed(entry, &err));
                    outcome.failed_file = Some(file.file_name.clone());
                    break;
                }
            }
        }

        drop(guard);
        self.events.publish(ImportEvent::batch_finished(
            outcome.completed_files,
            total,
            outcome.failed_file.clone(),
        ));

        Ok(outcome)
    }

    /// Apply `change` to the file with `id`, publishing the new state.
    fn update_file(&self, id: Uuid, change: impl FnOnce(&mut UploadedFile)) {
        let updated = {
            let mut state = lock(&self.state);
            state.files.iter_mut().find(|f| f.id == id).map(|entry| {
                change(entry);
                entry.clone()
            })
        };

        if let Some(file) = updated {
            self.events.publish(ImportEvent::file_updated(&file));
        }
    }
}

fn validate_schema(kind: FileKind, rows: &[RawRow]) -> Result<(), ImportError> {
    let validation = schema::validate(kind, rows);
    if validation.valid {
        Ok(())
    } else {
        Err(ImportError::Validation(validation.message))
    }
}

fn mark_failed(entry: &mut UploadedFile, err: &ImportError) {
    entry.status = UploadStatus::Error;
    entry.message = Some(err.to_string());
}
