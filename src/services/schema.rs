//! Required-column contracts per file kind.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::FileKind;
use crate::services::tabular::{RawRow, normalize_column};

/// Columns every school file must carry.
pub const SCHOOL_COLUMNS: &[&str] = &[
    "nome",
    "profe_lingua_portuguesa",
    "profe_matematica",
    "profe_ciencias",
    "ano_da_ultima_reforma",
    "n_de_quadras_disponiveis",
    "biblioteca",
    "lab_info",
    "acess_internet",
    "projetos_usam_celular",
    "carencia_de_professor",
    "ar_condicionado",
    "iluminacao",
    "bebedouro",
    "acessibilidade",
    "projetos_externos",
    "areas_recreativas",
    "dif_rendimento_entre_turnos",
];

/// Columns every performance file must carry.
pub const PERFORMANCE_COLUMNS: &[&str] = &[
    "codigo_escola",
    "codigo_habilidade",
    "componente_curricular",
    "descricao_habilidade",
    "percentual_acertos",
];

/// Outcome of a schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Required columns for a kind. Teacher files have no contract yet.
pub fn required_columns(kind: FileKind) -> Option<&'static [&'static str]> {
    match kind {
        FileKind::School => Some(SCHOOL_COLUMNS),
        FileKind::Performance => Some(PERFORMANCE_COLUMNS),
        FileKind::Teacher => None,
    }
}

/// Check a parsed table against the required columns of `kind`.
///
/// Columns are read from the first row and compared trimmed and lower-cased.
/// Extra columns and column order do not matter.
pub fn validate(kind: FileKind, rows: &[RawRow]) -> ValidationResult {
    let Some(first) = rows.first() else {
        return ValidationResult::fail("The file is empty or contains no valid data.");
    };

    let Some(required) = required_columns(kind) else {
        return ValidationResult::fail(format!("Files of kind '{}' are not supported yet.", kind));
    };

    let present: HashSet<String> = first.columns().map(normalize_column).collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !present.contains(*column))
        .collect();

    if !missing.is_empty() {
        return ValidationResult::fail(format!(
            "Missing required columns: {}",
            missing.join(", ")
        ));
    }

    ValidationResult::ok("File is valid. Data ready for processing.")
}
