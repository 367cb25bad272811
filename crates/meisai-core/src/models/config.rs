//! Configuration structures for the statement pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted statement file (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Bytes fed to the encoding detector.
pub const DETECTION_BYTES: usize = 10_000;

/// Bytes decoded when probing the fallback codec.
pub const PROBE_BYTES: usize = 1024;

/// Detector confidence below which the fallback codec is tried.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Rows of issuer metadata preceding the detail section.
pub const PREAMBLE_ROWS: usize = 8;

/// Records included in the preview.
pub const PREVIEW_ROWS: usize = 5;

/// Main configuration for the meisai pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeisaiConfig {
    /// Path and size guard configuration.
    pub guard: GuardConfig,

    /// Encoding detection configuration.
    pub encoding: EncodingConfig,

    /// Statement layout configuration.
    pub layout: LayoutConfig,

    /// Result shaping configuration.
    pub output: OutputConfig,
}

/// File guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Maximum file size in bytes.
    pub max_file_size: u64,

    /// Directory uploaded statements must live under.
    pub allowed_dir: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_dir: PathBuf::from("/tmp/uploads"),
        }
    }
}

/// Encoding detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Prefix length handed to the statistical detector.
    pub detection_bytes: usize,

    /// Sample length decoded when probing the fallback codec.
    pub probe_bytes: usize,

    /// Confidence threshold (0.0 - 1.0).
    pub confidence_threshold: f32,

    /// Codec preferred for low-confidence and Shift_JIS-family detections.
    pub fallback_encoding: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            detection_bytes: DETECTION_BYTES,
            probe_bytes: PROBE_BYTES,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            fallback_encoding: "cp932".to_string(),
        }
    }
}

/// Statement layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Rows skipped before scanning for detail rows.
    pub preamble_rows: usize,

    /// Candidate note columns, tried in order.
    pub note_columns: Vec<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            preamble_rows: PREAMBLE_ROWS,
            note_columns: vec![7, 8],
        }
    }
}

/// Result shaping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of leading records copied into the preview.
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            preview_rows: PREVIEW_ROWS,
        }
    }
}

impl MeisaiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeisaiConfig::default();
        assert_eq!(config.guard.max_file_size, 10_485_760);
        assert_eq!(config.encoding.detection_bytes, 10_000);
        assert_eq!(config.encoding.confidence_threshold, 0.7);
        assert_eq!(config.encoding.fallback_encoding, "cp932");
        assert_eq!(config.layout.preamble_rows, 8);
        assert_eq!(config.layout.note_columns, vec![7, 8]);
        assert_eq!(config.output.preview_rows, 5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"output": {"preview_rows": 2}, "guard": {"allowed_dir": "/srv/in"}}"#;
        let config: MeisaiConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.output.preview_rows, 2);
        assert_eq!(config.guard.allowed_dir, PathBuf::from("/srv/in"));
        assert_eq!(config.guard.max_file_size, MAX_FILE_SIZE);
        assert_eq!(config.layout.preamble_rows, PREAMBLE_ROWS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = MeisaiConfig::default();
        config.layout.preamble_rows = 3;
        config.save(&path).unwrap();

        let loaded = MeisaiConfig::from_file(&path).unwrap();
        assert_eq!(loaded.layout.preamble_rows, 3);
    }

    #[test]
    fn test_invalid_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = MeisaiConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
