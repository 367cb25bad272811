//! Detail row classification and field projection.
//!
//! Statement layout (0-indexed rows):
//!
//! ```text
//! 0..8   issuer metadata, account summary, blank separator, column titles
//! 8..    detail rows, interleaved with subtotal and footer rows
//! ```
//!
//! Detail row columns:
//!
//! ```text
//! 0 date code   1 user   2 store   3 payment method   4,5 installments
//! 6 amount      7 note (some exports shift it to 8)
//! ```

use serde_json::json;
use tracing::debug;

use super::amounts::{coerce_all, strip_separators};
use super::patterns::DATE_CODE;
use crate::error::{ExtractionFailure, Result, StatementError};
use crate::models::config::LayoutConfig;
use crate::models::statement::{DetailRow, RawGrid};

pub const DATE_COLUMN: usize = 0;
pub const USER_COLUMN: usize = 1;
pub const STORE_COLUMN: usize = 2;
pub const PAYMENT_METHOD_COLUMN: usize = 3;
pub const AMOUNT_COLUMN: usize = 6;

/// Columns every detail row must have.
pub const REQUIRED_COLUMNS: [usize; 5] = [
    DATE_COLUMN,
    USER_COLUMN,
    STORE_COLUMN,
    PAYMENT_METHOD_COLUMN,
    AMOUNT_COLUMN,
];

/// Whether a row is a detail row: its first cell, trimmed, is six ASCII digits.
pub fn is_detail_row(row: &[String]) -> bool {
    row.first()
        .map(|cell| DATE_CODE.is_match(cell.trim()))
        .unwrap_or(false)
}

/// Detail rows pulled out of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub rows: Vec<DetailRow>,
    /// Rows examined after the preamble, detail or not.
    pub rows_scanned: usize,
}

/// Projects detail rows out of a raw grid.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    preamble_rows: usize,
    note_columns: Vec<usize>,
}

impl RowExtractor {
    pub fn new(preamble_rows: usize, note_columns: Vec<usize>) -> Self {
        Self {
            preamble_rows,
            note_columns,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.preamble_rows, config.note_columns.clone())
    }

    pub fn extract(&self, grid: &RawGrid) -> Result<Extraction> {
        if grid.len() <= self.preamble_rows {
            return Err(StatementError::data_extraction(
                ExtractionFailure::NoDataSection,
                format!(
                    "statement has no detail section ({} rows, details start at row {})",
                    grid.len(),
                    self.preamble_rows
                ),
                json!({ "total_rows": grid.len(), "detail_start_row": self.preamble_rows }),
            ));
        }

        let section = &grid.rows()[self.preamble_rows..];
        let detail: Vec<&Vec<String>> = section.iter().filter(|row| is_detail_row(row)).collect();
        debug!("{} of {} rows after the preamble are detail rows", detail.len(), section.len());

        if detail.is_empty() {
            return Err(StatementError::data_extraction(
                ExtractionFailure::NoDataRows,
                "no detail rows found (no row starts with a 6-digit date)",
                json!({ "rows_scanned": section.len(), "detail_rows_found": 0 }),
            ));
        }

        let missing: Vec<usize> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|&c| !grid.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(StatementError::data_extraction(
                ExtractionFailure::MissingColumns,
                format!("required columns are missing: {:?}", missing),
                json!({
                    "missing_columns": missing,
                    "available_columns": (0..grid.width()).collect::<Vec<_>>(),
                    "required_columns": REQUIRED_COLUMNS,
                }),
            ));
        }

        let rows: Vec<DetailRow> = detail.into_iter().map(|row| self.project(row)).collect();
        coerce_all(rows.iter().map(|r| r.amount.as_str()))?;

        Ok(Extraction {
            rows,
            rows_scanned: section.len(),
        })
    }

    fn project(&self, row: &[String]) -> DetailRow {
        let cell = |c: usize| row.get(c).cloned().unwrap_or_default();
        let note = self
            .note_columns
            .iter()
            .find_map(|&c| row.get(c))
            .cloned()
            .unwrap_or_default();

        DetailRow {
            date: cell(DATE_COLUMN).trim().to_string(),
            user: cell(USER_COLUMN),
            store: cell(STORE_COLUMN),
            payment_method: cell(PAYMENT_METHOD_COLUMN),
            amount: strip_separators(&cell(AMOUNT_COLUMN)),
            note,
        }
    }
}

impl Default for RowExtractor {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
