//! Database queries for schools.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::school::{self, ActiveModel, Entity as School};
use crate::models::SchoolRecord;

use super::{DbPool, INSERT_BATCH_SIZE};

fn to_active_model(import_id: Uuid, record: &SchoolRecord) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::now_v7()),
        import_id: Set(import_id),
        nome: Set(record.name.clone()),
        profe_lingua_portuguesa: Set(record.portuguese_teachers),
        profe_matematica: Set(record.math_teachers),
        profe_ciencias: Set(record.science_teachers),
        ano_da_ultima_reforma: Set(record.last_renovation_year),
        n_de_quadras_disponiveis: Set(record.sports_courts),
        biblioteca: Set(record.has_library),
        lab_info: Set(record.has_computer_lab),
        acess_internet: Set(record.has_internet_access),
        projetos_usam_celular: Set(record.mobile_device_projects),
        carencia_de_professor: Set(record.teacher_shortage),
        ar_condicionado: Set(record.has_air_conditioning),
        iluminacao: Set(record.adequate_lighting),
        bebedouro: Set(record.has_water_fountains),
        acessibilidade: Set(record.accessibility.clone()),
        projetos_externos: Set(record.external_projects),
        areas_recreativas: Set(record.recreation_areas),
        dif_rendimento_entre_turnos: Set(record.shift_performance_gap),
        created_at: Set(Utc::now()),
    }
}

impl DbPool {
    /// Distinct school names, alphabetically.
    pub async fn list_school_names(&self) -> Result<Vec<String>, DbErr> {
        School::find()
            .select_only()
            .column(school::Column::Nome)
            .distinct()
            .order_by_asc(school::Column::Nome)
            .into_tuple::<String>()
            .all(self.connection())
            .await
    }

    /// Insert the schools of one imported file in a single transaction.
    ///
    /// When rows for `import_id` already exist, nothing is inserted and the
    /// stored count is returned.
    pub async fn insert_schools(
        &self,
        import_id: Uuid,
        records: &[SchoolRecord],
    ) -> Result<u64, DbErr> {
        let txn = self.connection().begin().await?;

        let existing = School::find()
            .filter(school::Column::ImportId.eq(import_id))
            .count(&txn)
            .await?;
        if existing > 0 {
            debug!("Import {} already stored ({} schools)", import_id, existing);
            txn.rollback().await?;
            return Ok(existing);
        }

        for batch in records.chunks(INSERT_BATCH_SIZE) {
            let models: Vec<ActiveModel> = batch
                .iter()
                .map(|record| to_active_model(import_id, record))
                .collect();
            School::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        info!("Inserted {} schools for import {}", records.len(), import_id);

        Ok(records.len() as u64)
    }
}
