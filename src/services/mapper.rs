//! Record mapping: parsed rows into typed records.
//!
//! Each row is turned into exactly one record (or one skipped reference);
//! nothing downstream of this module sees untyped rows.

use crate::error::ImportError;
use crate::models::{PerformanceRecord, SchoolRecord};
use crate::services::coercion::{NumericPolicy, coerce_boolean};
use crate::services::references::KnownSchools;
use crate::services::tabular::RawRow;

/// Performance rows split by reference resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMapping {
    pub accepted: Vec<PerformanceRecord>,
    /// `codigo_escola` of each skipped row, in input order.
    pub skipped: Vec<String>,
}

/// Row accessor that knows its CSV line for error messages.
struct RowReader<'a> {
    row: &'a RawRow,
    /// 1-based line in the file; the header is line 1.
    line: usize,
    policy: NumericPolicy,
}

impl<'a> RowReader<'a> {
    fn new(row: &'a RawRow, index: usize, policy: NumericPolicy) -> Self {
        Self {
            row,
            line: index + 2,
            policy,
        }
    }

    fn text(&self, column: &str) -> String {
        self.row.text(column)
    }

    fn flag(&self, column: &str) -> bool {
        coerce_boolean(self.row.get(column).unwrap_or_default())
    }

    fn number(&self, column: &str) -> Result<f64, ImportError> {
        let raw = self.row.get(column).unwrap_or_default();
        self.policy
            .number(&self.row.decimal_separator().normalize(raw))
            .ok_or_else(|| self.not_a_number(column, raw))
    }

    fn integer(&self, column: &str) -> Result<i32, ImportError> {
        let raw = self.row.get(column).unwrap_or_default();
        self.policy
            .integer(&self.row.decimal_separator().normalize(raw))
            .ok_or_else(|| self.not_a_number(column, raw))
    }

    fn not_a_number(&self, column: &str, raw: &str) -> ImportError {
        ImportError::Parse(format!(
            "line {}: column '{}' is not a number ({:?})",
            self.line, column, raw
        ))
    }
}

/// Map school rows, one record per row, in input order.
pub fn map_school_rows(
    rows: &[RawRow],
    policy: NumericPolicy,
) -> Result<Vec<SchoolRecord>, ImportError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| -> Result<SchoolRecord, ImportError> {
            let r = RowReader::new(row, index, policy);
            Ok(SchoolRecord {
                name: r.text("nome"),
                portuguese_teachers: r.integer("profe_lingua_portuguesa")?,
                math_teachers: r.integer("profe_matematica")?,
                science_teachers: r.integer("profe_ciencias")?,
                last_renovation_year: r.integer("ano_da_ultima_reforma")?,
                sports_courts: r.integer("n_de_quadras_disponiveis")?,
                has_library: r.flag("biblioteca"),
                has_computer_lab: r.flag("lab_info"),
                has_internet_access: r.flag("acess_internet"),
                mobile_device_projects: r.flag("projetos_usam_celular"),
                teacher_shortage: r.flag("carencia_de_professor"),
                has_air_conditioning: r.flag("ar_condicionado"),
                adequate_lighting: r.flag("iluminacao"),
                has_water_fountains: r.flag("bebedouro"),
                accessibility: r.text("acessibilidade"),
                external_projects: r.flag("projetos_externos"),
                recreation_areas: r.flag("areas_recreativas"),
                shift_performance_gap: r.flag("dif_rendimento_entre_turnos"),
            })
        })
        .collect()
}

/// Map performance rows and partition them against `known`.
///
/// An empty `known` set accepts every row.
pub fn map_performance_rows(
    rows: &[RawRow],
    known: &KnownSchools,
    policy: NumericPolicy,
) -> Result<PerformanceMapping, ImportError> {
    let mut mapping = PerformanceMapping::default();

    for (index, row) in rows.iter().enumerate() {
        let r = RowReader::new(row, index, policy);
        let record = PerformanceRecord {
            school_code: r.text("codigo_escola"),
            skill_code: r.text("codigo_habilidade"),
            curricular_component: r.text("componente_curricular"),
            skill_description: r.text("descricao_habilidade"),
            percent_correct: r.number("percentual_acertos")?,
        };

        if !known.is_empty() && !known.contains(&record.school_code) {
            mapping.skipped.push(record.school_code);
        } else {
            mapping.accepted.push(record);
        }
    }

    Ok(mapping)
}
