//! Statement pipeline: guard, detect, read, extract, normalize, summarize.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::Result;
use crate::input::{EncodingDetector, EncodingSniffer, FileGuard, TabularReader};
use crate::models::config::MeisaiConfig;
use crate::models::statement::{DetailRow, ProcessingMetadata, ProcessingResult, TransactionRecord};

use super::rules::amounts::{coerce, invalid_amounts};
use super::rules::dates::{month_label, normalize, split_normalized};
use super::rules::rows::RowExtractor;

/// Runs one statement file through every stage.
///
/// Holds no per-file state, so one processor can serve concurrent calls.
pub struct StatementProcessor {
    config: MeisaiConfig,
    guard: FileGuard,
    sniffer: EncodingSniffer,
    reader: TabularReader,
    extractor: RowExtractor,
}

impl StatementProcessor {
    /// Create a processor with the `chardet` encoding detector.
    pub fn new(config: MeisaiConfig) -> Self {
        Self {
            guard: FileGuard::from_config(&config.guard),
            sniffer: EncodingSniffer::new(config.encoding.clone()),
            reader: TabularReader::new(),
            extractor: RowExtractor::from_config(&config.layout),
            config,
        }
    }

    /// Replace the encoding detector.
    pub fn with_detector(mut self, detector: impl EncodingDetector + 'static) -> Self {
        self.sniffer = EncodingSniffer::with_detector(self.config.encoding.clone(), detector);
        self
    }

    pub fn config(&self) -> &MeisaiConfig {
        &self.config
    }

    /// Process a file under the configured allowed directory.
    pub fn process_in_default_root(&self, path: impl AsRef<Path>) -> Result<ProcessingResult> {
        self.process(path, &self.config.guard.allowed_dir)
    }

    /// Process `path`, which must live under `allowed_dir`.
    pub fn process(
        &self,
        path: impl AsRef<Path>,
        allowed_dir: impl AsRef<Path>,
    ) -> Result<ProcessingResult> {
        let start = Instant::now();
        let path = path.as_ref();

        let guarded = self.guard.check(path, allowed_dir.as_ref())?;
        debug!("Guard passed: {} ({} bytes)", guarded.path.display(), guarded.size);

        let encoding = self.sniffer.detect_file(&guarded.path)?;
        debug!("Using encoding {}", encoding);

        let grid = self.reader.read_file(&guarded.path, &encoding)?;
        let extraction = self.extractor.extract(&grid)?;
        debug!("Extracted {} detail rows", extraction.rows.len());

        let details = build_records(extraction.rows)?;

        let metadata = ProcessingMetadata {
            source_file: guarded.path,
            encoding,
            rows_scanned: extraction.rows_scanned,
            processing_time_ms: start.elapsed().as_millis() as u64,
            processed_at: Utc::now(),
        };
        let result = ProcessingResult::new(details, self.config.output.preview_rows, metadata)?;

        info!(
            "Processed {}: {} records, total {}, {} - {}",
            path.display(),
            result.total_count,
            result.summary.total_amount,
            result.summary.date_range.start,
            result.summary.date_range.end
        );

        Ok(result)
    }
}

impl Default for StatementProcessor {
    fn default() -> Self {
        Self::new(MeisaiConfig::default())
    }
}

/// Normalize every detail row, in order.
pub fn build_records(rows: Vec<DetailRow>) -> Result<Vec<TransactionRecord>> {
    rows.into_iter().map(build_record).collect()
}

/// Normalize one detail row.
///
/// Year and month come from the rendered date so they always agree with it.
pub fn build_record(row: DetailRow) -> Result<TransactionRecord> {
    let date = normalize(&row.date)?;
    let (year, month) = split_normalized(&date)?;
    let amount = coerce(&row.amount).ok_or_else(|| invalid_amounts(vec![row.amount.clone()]))?;

    Ok(TransactionRecord {
        month_label: month_label(year, month),
        date,
        year,
        month,
        store: row.store,
        user: row.user,
        payment_method: row.payment_method,
        amount,
        note: row.note,
    })
}
