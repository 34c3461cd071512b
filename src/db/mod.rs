//! Database module providing connection management, migrations, and queries.

pub mod performance;
pub mod schools;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult, PersistenceError};
use crate::migration::Migrator;
use crate::models::{KnownSchool, PerformanceRecord, SchoolRecord};
use crate::services::store::RecordStore;

/// Rows per INSERT statement, to stay under the PostgreSQL parameter limit.
pub(crate) const INSERT_BATCH_SIZE: usize = 1000;

/// PostgreSQL connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured pool bounds.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (max {} connections)",
            settings.max_connections
        );

        Ok(DbPool { conn })
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}

#[async_trait]
impl RecordStore for DbPool {
    async fn list_schools(&self) -> Result<Vec<KnownSchool>, PersistenceError> {
        let names = self.list_school_names().await?;
        Ok(names.into_iter().map(KnownSchool::new).collect())
    }

    async fn insert_school_records(
        &self,
        import_id: Uuid,
        records: &[SchoolRecord],
    ) -> Result<u64, PersistenceError> {
        Ok(self.insert_schools(import_id, records).await?)
    }

    async fn insert_performance_records(
        &self,
        import_id: Uuid,
        records: &[PerformanceRecord],
    ) -> Result<u64, PersistenceError> {
        Ok(self.insert_performance(import_id, records).await?)
    }
}
