//! Migration: Create desempenho table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE desempenho (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    import_id UUID NOT NULL,

                    codigo_escola TEXT NOT NULL,
                    codigo_habilidade TEXT NOT NULL DEFAULT '',
                    componente_curricular TEXT NOT NULL DEFAULT '',
                    descricao_habilidade TEXT NOT NULL DEFAULT '',
                    percentual_acertos DOUBLE PRECISION NOT NULL DEFAULT 0, -- not clamped

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_desempenho_import_id ON desempenho(import_id);
                CREATE INDEX idx_desempenho_codigo_escola ON desempenho(codigo_escola);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS desempenho CASCADE;")
            .await?;

        Ok(())
    }
}
