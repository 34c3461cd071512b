//! School infrastructure records.

use serde::{Deserialize, Serialize};

/// One row of a school import file, typed.
///
/// Serialized names match the CSV columns and the `escolas` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRecord {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "profe_lingua_portuguesa")]
    pub portuguese_teachers: i32,
    #[serde(rename = "profe_matematica")]
    pub math_teachers: i32,
    #[serde(rename = "profe_ciencias")]
    pub science_teachers: i32,
    #[serde(rename = "ano_da_ultima_reforma")]
    pub last_renovation_year: i32,
    #[serde(rename = "n_de_quadras_disponiveis")]
    pub sports_courts: i32,
    #[serde(rename = "biblioteca")]
    pub has_library: bool,
    #[serde(rename = "lab_info")]
    pub has_computer_lab: bool,
    #[serde(rename = "acess_internet")]
    pub has_internet_access: bool,
    #[serde(rename = "projetos_usam_celular")]
    pub mobile_device_projects: bool,
    #[serde(rename = "carencia_de_professor")]
    pub teacher_shortage: bool,
    #[serde(rename = "ar_condicionado")]
    pub has_air_conditioning: bool,
    #[serde(rename = "iluminacao")]
    pub adequate_lighting: bool,
    #[serde(rename = "bebedouro")]
    pub has_water_fountains: bool,
    /// Free-text accessibility level (e.g. "Nenhuma", "Mediana", "Alta").
    #[serde(rename = "acessibilidade")]
    pub accessibility: String,
    #[serde(rename = "projetos_externos")]
    pub external_projects: bool,
    #[serde(rename = "areas_recreativas")]
    pub recreation_areas: bool,
    #[serde(rename = "dif_rendimento_entre_turnos")]
    pub shift_performance_gap: bool,
}

/// Minimal projection of a stored school, used to resolve performance rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSchool {
    #[serde(rename = "nome")]
    pub name: String,
}

impl KnownSchool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
