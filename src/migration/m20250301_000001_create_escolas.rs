//! Migration: Create escolas table.
//!
//! One row per school of an imported file; `import_id` identifies that file.

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
                CREATE TABLE escolas (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    import_id UUID NOT NULL,

                    nome TEXT NOT NULL,
                    profe_lingua_portuguesa INTEGER NOT NULL DEFAULT 0,
                    profe_matematica INTEGER NOT NULL DEFAULT 0,
                    profe_ciencias INTEGER NOT NULL DEFAULT 0,
                    ano_da_ultima_reforma INTEGER NOT NULL DEFAULT 0,
                    n_de_quadras_disponiveis INTEGER NOT NULL DEFAULT 0,

                    -- Infrastructure flags
                    biblioteca BOOLEAN NOT NULL DEFAULT FALSE,
                    lab_info BOOLEAN NOT NULL DEFAULT FALSE,
                    acess_internet BOOLEAN NOT NULL DEFAULT FALSE,
                    projetos_usam_celular BOOLEAN NOT NULL DEFAULT FALSE,
                    carencia_de_professor BOOLEAN NOT NULL DEFAULT FALSE,
                    ar_condicionado BOOLEAN NOT NULL DEFAULT FALSE,
                    iluminacao BOOLEAN NOT NULL DEFAULT FALSE,
                    bebedouro BOOLEAN NOT NULL DEFAULT FALSE,
                    acessibilidade TEXT NOT NULL DEFAULT '',
                    projetos_externos BOOLEAN NOT NULL DEFAULT FALSE,
                    areas_recreativas BOOLEAN NOT NULL DEFAULT FALSE,
                    dif_rendimento_entre_turnos BOOLEAN NOT NULL DEFAULT FALSE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Dedupe lookups per imported file
                CREATE INDEX idx_escolas_import_id ON escolas(import_id);

                -- Reference resolution by name
                CREATE INDEX idx_escolas_nome ON escolas(nome);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS escolas CASCADE;")
            .await?;

        Ok(())
    }
}
