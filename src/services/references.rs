//! Resolution of performance rows against stored schools.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::PersistenceError;
use crate::models::KnownSchool;
use crate::services::store::RecordStore;

/// How a failed school listing is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Listing failures read as "no known schools".
    #[default]
    Degrade,
    /// Listing failures are reported to the caller.
    Strict,
}

/// Set of stored school names. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownSchools {
    names: HashSet<String>,
}

impl KnownSchools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, school_code: &str) -> bool {
        self.names.contains(school_code)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl FromIterator<KnownSchool> for KnownSchools {
    fn from_iter<T: IntoIterator<Item = KnownSchool>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(|s| s.name).collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for KnownSchools {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Fetches the known-school set from the record store.
#[derive(Clone)]
pub struct ReferenceResolver {
    store: Arc<dyn RecordStore>,
    policy: ReferencePolicy,
}

impl ReferenceResolver {
    pub fn new(store: Arc<dyn RecordStore>, policy: ReferencePolicy) -> Self {
        Self { store, policy }
    }

    /// Load the current set of known schools.
    ///
    /// Under `Degrade` a listing failure yields an empty set, which callers
    /// treat as "no schools imported yet".
    pub async fn known_schools(&self) -> Result<KnownSchools, PersistenceError> {
        match self.store.list_schools().await {
            Ok(schools) => {
                let known: KnownSchools = schools.into_iter().collect();
                info!("Loaded {} known schools", known.len());
                Ok(known)
            }
            Err(e) => match self.policy {
                ReferencePolicy::Degrade => {
                    warn!("Failed to list schools, treating as none known: {}", e);
                    Ok(KnownSchools::new())
                }
                ReferencePolicy::Strict => Err(e),
            },
        }
    }
}
