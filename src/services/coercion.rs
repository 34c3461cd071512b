//! Conversion of raw CSV cells into typed scalars.

use std::borrow::Cow;

/// Cell values (after trim + lowercase) that read as `true`.
const TRUE_LITERALS: &[&str] = &["true", "sim", "1", "s"];

/// How numeric cells that do not parse are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Unparseable values read as `0`.
    #[default]
    Lenient,
    /// Unparseable values fail the file.
    Strict,
}

/// Interpret a cell as a boolean flag. Anything outside the literal set is `false`.
pub fn coerce_boolean(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    TRUE_LITERALS.contains(&value.as_str())
}

/// Decimal separator used by numeric cells of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    #[default]
    Dot,
    /// Portuguese-locale exports: `72,5`.
    Comma,
}

impl DecimalSeparator {
    /// Rewrite a cell so the decimal mark is `.`.
    pub fn normalize<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        match self {
            Self::Comma if raw.contains(',') => Cow::Owned(raw.replace(',', ".")),
            _ => Cow::Borrowed(raw),
        }
    }
}

/// Interpret a cell as a number, reading `0` when it does not parse.
///
/// Reads the longest numeric prefix of the trimmed cell, so `"64 %"` is 64.
pub fn coerce_number(raw: &str) -> f64 {
    parse_leading_number(raw).unwrap_or(0.0)
}

/// Parse a cell that must be exactly one finite floating-point literal.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the longest finite decimal literal at the start of the trimmed cell.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

impl NumericPolicy {
    /// Coerce a cell under this policy. `None` only happens under `Strict`.
    pub fn number(&self, raw: &str) -> Option<f64> {
        match self {
            Self::Lenient => Some(coerce_number(raw)),
            Self::Strict => parse_number(raw),
        }
    }

    /// Coerce a cell to an integer, truncating toward zero.
    ///
    /// Values outside the `i32` range saturate under `Lenient` and are
    /// unparseable under `Strict`.
    pub fn integer(&self, raw: &str) -> Option<i32> {
        let value = self.number(raw)?.trunc();
        match self {
            Self::Lenient => Some(value as i32),
            Self::Strict => {
                if value < i32::MIN as f64 || value > i32::MAX as f64 {
                    None
                } else {
                    Some(value as i32)
                }
            }
        }
    }
}
