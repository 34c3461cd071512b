//! Tabular parsing of uploaded CSV files.
//!
//! Produces an ordered sequence of rows, each an ordered list of
//! (header, value) cells. Nothing here knows about record kinds.

use tracing::debug;

use crate::error::ImportError;
use crate::services::coercion::DecimalSeparator;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Normalize a column name for comparison (trimmed, lower-cased).
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One parsed data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
    decimal_separator: DecimalSeparator,
}

impl RawRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self {
            cells,
            decimal_separator: DecimalSeparator::Dot,
        }
    }

    pub fn with_decimal_separator(mut self, separator: DecimalSeparator) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Decimal mark used by numeric cells of this row's file.
    pub fn decimal_separator(&self) -> DecimalSeparator {
        self.decimal_separator
    }

    /// Build a row from string pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Column names as they appear in the header.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(column, _)| column.as_str())
    }

    /// Cell value for a column, matched on the normalized name.
    pub fn get(&self, column: &str) -> Option<&str> {
        let wanted = normalize_column(column);
        self.cells
            .iter()
            .find(|(name, _)| normalize_column(name) == wanted)
            .map(|(_, value)| value.as_str())
    }

    /// Cell value or empty string when the column is absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parse CSV bytes with a header row into data rows.
///
/// Blank lines are skipped. A record with a different field count than the
/// header fails the whole file. Semicolon-separated files use `,` as their
/// decimal mark.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = detect_delimiter(bytes);
    let decimal_separator = if delimiter == b';' {
        DecimalSeparator::Comma
    } else {
        DecimalSeparator::Dot
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(describe_csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(describe_csv_error)?;
        let cells = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(RawRow::new(cells).with_decimal_separator(decimal_separator));
    }

    debug!(
        "Parsed CSV: {} columns, {} rows, delimiter {:?}",
        headers.len(),
        rows.len(),
        delimiter as char
    );

    Ok(rows)
}

/// Pick `;` when the header line uses it more than `,`.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = header_line.iter().filter(|b| **b == b',').count();
    let semicolons = header_line.iter().filter(|b| **b == b';').count();
    if semicolons > commas { b';' } else { b',' }
}

fn describe_csv_error(err: csv::Error) -> ImportError {
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            format!(
                "line {} has {} fields, expected {} (same as the header)",
                line, len, expected_len
            )
        }
        csv::ErrorKind::Utf8 { pos, .. } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            format!("line {} is not valid UTF-8 text", line)
        }
        _ => err.to_string(),
    };
    ImportError::Parse(message)
}
