//! Record store seam used by the import pipeline.
//!
//! `DbPool` implements it against PostgreSQL; `MemoryStore` keeps records in
//! process for dry runs and tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{KnownSchool, PerformanceRecord, SchoolRecord};

/// Storage collaborator for imported records.
///
/// `import_id` identifies the uploaded file the records came from. A store that
/// already holds rows for an `import_id` must not insert them again.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Names of all stored schools.
    async fn list_schools(&self) -> Result<Vec<KnownSchool>, PersistenceError>;

    /// Store school records of one file. Returns the number of stored rows.
    async fn insert_school_records(
        &self,
        import_id: Uuid,
        records: &[SchoolRecord],
    ) -> Result<u64, PersistenceError>;

    /// Store performance records of one file. Returns the number of stored rows.
    async fn insert_performance_records(
        &self,
        import_id: Uuid,
        records: &[PerformanceRecord],
    ) -> Result<u64, PersistenceError>;
}

/// In-process record store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    schools: Mutex<Vec<(Uuid, SchoolRecord)>>,
    performance: Mutex<Vec<(Uuid, PerformanceRecord)>>,
    extra_school_names: Vec<String>,
    insert_calls: AtomicUsize,
    /// 1-based insert call number that fails, with its message.
    failing_insert: Option<(usize, String)>,
    listing_failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend these schools are already stored.
    pub fn with_schools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_school_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Make the `call_number`-th insert call (1-based, any kind) fail.
    pub fn fail_insert_number(mut self, call_number: usize, message: impl Into<String>) -> Self {
        self.failing_insert = Some((call_number, message.into()));
        self
    }

    /// Make every `list_schools` call fail.
    pub fn fail_listing(mut self, message: impl Into<String>) -> Self {
        self.listing_failure = Some(message.into());
        self
    }

    /// Number of insert calls received so far, including failed ones.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn school_records(&self) -> Vec<SchoolRecord> {
        lock(&self.schools).iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn performance_records(&self) -> Vec<PerformanceRecord> {
        lock(&self.performance)
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn check_insert_failure(&self) -> Result<(), PersistenceError> {
        let call_number = self.insert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.failing_insert {
            Some((failing, message)) if *failing == call_number => {
                Err(PersistenceError::new(message.clone()))
            }
            _ => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn insert_once<T: Clone>(table: &Mutex<Vec<(Uuid, T)>>, import_id: Uuid, records: &[T]) -> u64 {
    let mut rows = lock(table);
    let existing = rows.iter().filter(|(id, _)| *id == import_id).count();
    if existing > 0 {
        return existing as u64;
    }
    rows.extend(records.iter().cloned().map(|r| (import_id, r)));
    records.len() as u64
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_schools(&self) -> Result<Vec<KnownSchool>, PersistenceError> {
        if let Some(message) = &self.listing_failure {
            return Err(PersistenceError::new(message.clone()));
        }

        let mut schools: Vec<KnownSchool> = self
            .extra_school_names
            .iter()
            .map(KnownSchool::new)
            .collect();
        schools.extend(
            lock(&self.schools)
                .iter()
                .map(|(_, r)| KnownSchool::new(r.name.clone())),
        );
        Ok(schools)
    }

    async fn insert_school_records(
        &self,
        import_id: Uuid,
        records: &[SchoolRecord],
    ) -> Result<u64, PersistenceError> {
        self.check_insert_failure()?;
        Ok(insert_once(&self.schools, import_id, records))
    }

    async fn insert_performance_records(
        &self,
        import_id: Uuid,
        records: &[PerformanceRecord],
    ) -> Result<u64, PersistenceError> {
        self.check_insert_failure()?;
        Ok(insert_once(&self.performance, import_id, records))
    }
}
