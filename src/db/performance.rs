//! Database queries for performance results.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::performance::{self as desempenho, ActiveModel, Entity as Desempenho};
use crate::models::PerformanceRecord;

use super::{DbPool, INSERT_BATCH_SIZE};

fn to_active_model(
    import_id: Uuid,
    record: &PerformanceRecord,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::now_v7()),
        import_id: Set(import_id),
        codigo_escola: Set(record.school_code.clone()),
        codigo_habilidade: Set(record.skill_code.clone()),
        componente_curricular: Set(record.curricular_component.clone()),
        descricao_habilidade: Set(record.skill_description.clone()),
        percentual_acertos: Set(record.percent_correct),
        created_at: Set(created_at),
    }
}

impl DbPool {
    /// Insert the performance rows of one imported file in a single transaction.
    ///
    /// Idempotent per `import_id`, like [`DbPool::insert_schools`].
    pub async fn insert_performance(
        &self,
        import_id: Uuid,
        records: &[PerformanceRecord],
    ) -> Result<u64, DbErr> {
        let txn = self.connection().begin().await?;

        let existing = Desempenho::find()
            .filter(desempenho::Column::ImportId.eq(import_id))
            .count(&txn)
            .await?;
        if existing > 0 {
            debug!("Import {} already stored ({} rows)", import_id, existing);
            txn.rollback().await?;
            return Ok(existing);
        }

        let now = Utc::now();
        for batch in records.chunks(INSERT_BATCH_SIZE) {
            let models: Vec<ActiveModel> = batch
                .iter()
                .map(|record| to_active_model(import_id, record, now))
                .collect();
            Desempenho::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        info!(
            "Inserted {} performance rows for import {}",
            records.len(),
            import_id
        );

        Ok(records.len() as u64)
    }
}
