//! Amount cleansing and integer coercion.

use serde_json::json;

use super::patterns::AMOUNT_INTEGER;
use crate::error::{ExtractionFailure, Result, StatementError};

/// Thousands separators found in statement amounts: ASCII comma and `、`.
pub const AMOUNT_SEPARATORS: [char; 2] = [',', '、'];

/// Remove thousands separators. No other characters are touched.
pub fn strip_separators(raw: &str) -> String {
    raw.replace(AMOUNT_SEPARATORS, "")
}

/// Parse a separator-free amount. Surrounding whitespace is ignored and a
/// leading sign is allowed.
pub fn coerce(cleaned: &str) -> Option<i64> {
    let trimmed = cleaned.trim();
    if !AMOUNT_INTEGER.is_match(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

/// Parse every amount, or fail listing each distinct unparseable value once.
pub fn coerce_all<'a, I>(values: I) -> Result<Vec<i64>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut amounts = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for value in values {
        match coerce(value) {
            Some(amount) => amounts.push(amount),
            None => {
                if !invalid.iter().any(|v| v == value) {
                    invalid.push(value.to_string());
                }
            }
        }
    }

    if invalid.is_empty() {
        Ok(amounts)
    } else {
        Err(invalid_amounts(invalid))
    }
}

/// Error listing amounts that could not be converted.
pub fn invalid_amounts(values: Vec<String>) -> StatementError {
    StatementError::data_extraction(
        ExtractionFailure::InvalidAmounts,
        format!("amount column holds non-numeric values: {:?}", values),
        json!({ "invalid_values": values }),
    )
}
