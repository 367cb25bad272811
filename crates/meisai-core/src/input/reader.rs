//! Decodes a statement file into a headerless grid of text cells.

use std::fs;
use std::io;
use std::path::Path;

use encoding_rs::UTF_8;
use serde_json::json;
use tracing::debug;

use super::encoding::resolve_codec;
use super::guard::not_found;
use crate::error::{Result, StatementError};
use crate::models::statement::RawGrid;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV reader producing a [`RawGrid`].
///
/// Every cell stays text and row 0 is data like any other row; rows may
/// differ in width.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularReader;

impl TabularReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and decode a whole file.
    pub fn read_file(&self, path: &Path, encoding: &str) -> Result<RawGrid> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                not_found(path)
            } else {
                StatementError::invalid_file_format(
                    format!("failed to read {}: {}", path.display(), e),
                    json!({
                        "file_path": path.display().to_string(),
                        "encoding": encoding,
                        "error_type": format!("{:?}", e.kind()),
                        "error_message": e.to_string(),
                    }),
                )
            }
        })?;

        self.parse(&bytes, encoding).map_err(|err| match err {
            StatementError::InvalidFileFormat { message, mut details } => {
                details.insert("file_path".into(), json!(path.display().to_string()));
                StatementError::InvalidFileFormat { message, details }
            }
            other => other,
        })
    }

    /// Decode `bytes` with `encoding` and split them into rows and cells.
    pub fn parse(&self, bytes: &[u8], encoding: &str) -> Result<RawGrid> {
        let codec = resolve_codec(encoding).ok_or_else(|| {
            StatementError::invalid_file_format(
                format!("unsupported encoding: {}", encoding),
                json!({ "encoding": encoding, "error_type": "UnknownEncoding" }),
            )
        })?;

        let bytes = if codec == UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };

        let text = codec
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or_else(|| {
                StatementError::invalid_file_format(
                    format!("file is not valid {}", encoding),
                    json!({
                        "encoding": encoding,
                        "error_type": "DecodeError",
                        "error_message": format!("malformed byte sequence for {}", codec.name()),
                    }),
                )
            })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                StatementError::invalid_file_format(
                    format!("failed to parse CSV: {}", e),
                    json!({
                        "encoding": encoding,
                        "error_type": "csv::Error",
                        "error_message": e.to_string(),
                    }),
                )
            })?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(StatementError::invalid_file_format(
                "CSV file is empty",
                json!({ "encoding": encoding }),
            ));
        }

        let grid = RawGrid::new(rows);
        debug!("Decoded {} rows x {} columns as {}", grid.len(), grid.width(), encoding);
        Ok(grid)
    }
}
