//! Skill performance records.

use serde::{Deserialize, Serialize};

/// Percent of correct answers for one skill at one school.
///
/// Serialized names match the CSV columns and the `desempenho` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Reference to a stored school's name.
    #[serde(rename = "codigo_escola")]
    pub school_code: String,
    #[serde(rename = "codigo_habilidade")]
    pub skill_code: String,
    #[serde(rename = "componente_curricular")]
    pub curricular_component: String,
    #[serde(rename = "descricao_habilidade")]
    pub skill_description: String,
    /// Expected within 0..=100, stored as given.
    #[serde(rename = "percentual_acertos")]
    pub percent_correct: f64,
}
