//! School entity for SeaORM.
//!
//! Column names follow the import file headers.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "escolas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub import_id: Uuid,
    pub nome: String,
    pub profe_lingua_portuguesa: i32,
    pub profe_matematica: i32,
    pub profe_ciencias: i32,
    pub ano_da_ultima_reforma: i32,
    pub n_de_quadras_disponiveis: i32,
    pub biblioteca: bool,
    pub lab_info: bool,
    pub acess_internet: bool,
    pub projetos_usam_celular: bool,
    pub carencia_de_professor: bool,
    pub ar_condicionado: bool,
    pub iluminacao: bool,
    pub bebedouro: bool,
    pub acessibilidade: String,
    pub projetos_externos: bool,
    pub areas_recreativas: bool,
    pub dif_rendimento_entre_turnos: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
