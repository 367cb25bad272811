//! Statement data models: the raw grid, extracted rows and final records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

use crate::error::{Details, Result, StatementError};

/// Headerless grid of text cells, indexed by row then column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row; the grid's column set is `0..width`.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether `column` belongs to the grid's column set.
    pub fn has_column(&self, column: usize) -> bool {
        column < self.width()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell text, or `None` when the row is shorter than `column`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

/// One detail row projected out of the raw grid, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Six-digit `YYMMDD` date code.
    pub date: String,
    pub user: String,
    pub store: String,
    pub payment_method: String,
    /// Amount with thousands separators removed.
    pub amount: String,
    /// Free-text note, empty when the statement has none.
    pub note: String,
}

/// A fully normalized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Date as `YYYY/MM/DD`.
    pub date: String,
    pub year: i32,
    /// Month number (1 - 12).
    pub month: u32,
    /// Display label such as `2025年1月`.
    #[serde(rename = "month_str")]
    pub month_label: String,
    pub store: String,
    pub user: String,
    pub payment_method: String,
    /// Amount in yen; negative for refunds.
    pub amount: i64,
    pub note: String,
}

/// First and last transaction dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Aggregate statistics over all records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_amount: i64,
    pub date_range: DateRange,
}

impl Summary {
    /// Sum amounts and find the date range.
    ///
    /// Dates are compared as strings: `YYYY/MM/DD` is fixed-width and
    /// zero-padded, so string order is chronological order.
    ///
    /// Fails when the total does not fit in an `i64`.
    pub fn from_records(records: &[TransactionRecord]) -> Result<Self> {
        let total_amount = records
            .iter()
            .try_fold(0i64, |total, r| total.checked_add(r.amount))
            .ok_or_else(|| amount_overflow(records))?;
        let start = records.iter().map(|r| r.date.as_str()).min();
        let end = records.iter().map(|r| r.date.as_str()).max();

        Ok(Self {
            total_amount,
            date_range: DateRange {
                start: start.unwrap_or_default().to_string(),
                end: end.unwrap_or_default().to_string(),
            },
        })
    }
}

fn amount_overflow(records: &[TransactionRecord]) -> StatementError {
    let mut details = Details::new();
    details.insert("amount_overflow".into(), json!(true));
    details.insert("record_count".into(), json!(records.len()));
    details.insert(
        "max_amount".into(),
        json!(records.iter().map(|r| r.amount).max()),
    );
    details.insert(
        "min_amount".into(),
        json!(records.iter().map(|r| r.amount).min()),
    );
    StatementError::Processing {
        message: "total amount does not fit in a signed 64-bit integer".to_string(),
        details,
    }
}

/// Processing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// File that was processed.
    pub source_file: PathBuf,

    /// Encoding the file was decoded with.
    pub encoding: String,

    /// Rows examined after the preamble.
    pub rows_scanned: usize,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    pub processed_at: DateTime<Utc>,
}

/// Output of one pipeline run over one statement file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub total_count: usize,
    pub details: Vec<TransactionRecord>,
    pub preview: Vec<TransactionRecord>,
    pub summary: Summary,
    pub metadata: ProcessingMetadata,
}

impl ProcessingResult {
    /// Assemble a result, copying the first `preview_rows` records into the preview.
    pub fn new(
        details: Vec<TransactionRecord>,
        preview_rows: usize,
        metadata: ProcessingMetadata,
    ) -> Result<Self> {
        let preview = preview(&details, preview_rows);
        let summary = Summary::from_records(&details)?;

        Ok(Self {
            total_count: details.len(),
            details,
            preview,
            summary,
            metadata,
        })
    }
}

/// Leading `limit` records in original order.
pub fn preview(records: &[TransactionRecord], limit: usize) -> Vec<TransactionRecord> {
    records.iter().take(limit).cloned().collect()
}
