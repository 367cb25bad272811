//! Text-encoding detection with a CP932 fallback.
//!
//! Card statements are exported from Windows systems and usually arrive as
//! CP932 (Windows-31J), a superset of Shift_JIS holding vendor glyphs such
//! as 髙, 﨑 and ①. Statistical detectors tend to report plain Shift_JIS or
//! a low-confidence guess for such files, so whenever the guess is weak or
//! Shift_JIS-family the fallback codec is tried first.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{DecoderResult, Encoding, SHIFT_JIS, UTF_8};
use serde_json::json;
use tracing::{debug, warn};

use super::guard::not_found;
use super::{Detection, EncodingDetector};
use crate::error::{Result, StatementError};
use crate::models::config::EncodingConfig;

/// Detector backed by the `chardet` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl EncodingDetector for ChardetDetector {
    fn detect(&self, sample: &[u8]) -> Option<Detection> {
        let (charset, confidence, _language) = chardet::detect(&sample.to_vec());
        if charset.is_empty() {
            return None;
        }
        Some(Detection::new(charset, confidence))
    }
}

/// Applies the fallback decision table on top of a detector.
pub struct EncodingSniffer {
    detector: Box<dyn EncodingDetector>,
    config: EncodingConfig,
}

impl EncodingSniffer {
    /// Create a sniffer using the `chardet` detector.
    pub fn new(config: EncodingConfig) -> Self {
        Self::with_detector(config, ChardetDetector)
    }

    pub fn with_detector(
        config: EncodingConfig,
        detector: impl EncodingDetector + 'static,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            config,
        }
    }

    /// Detect the encoding of a file from its first `detection_bytes` bytes.
    pub fn detect_file(&self, path: &Path) -> Result<String> {
        let sample = self.read_prefix(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                not_found(path)
            } else {
                StatementError::encoding_detection(
                    format!("failed to read {} for encoding detection: {}", path.display(), e),
                    json!({
                        "file_path": path.display().to_string(),
                        "error_type": format!("{:?}", e.kind()),
                        "error_message": e.to_string(),
                    }),
                )
            }
        })?;

        self.detect_bytes(&sample).map_err(|err| match err {
            StatementError::EncodingDetection { message, mut details } => {
                details.insert("file_path".into(), json!(path.display().to_string()));
                StatementError::EncodingDetection { message, details }
            }
            other => other,
        })
    }

    /// Decide the encoding of an in-memory sample.
    pub fn detect_bytes(&self, sample: &[u8]) -> Result<String> {
        let fallback = self.config.fallback_encoding.to_ascii_lowercase();
        let probe_len = sample.len().min(self.config.probe_bytes);
        let fallback_ok = || {
            resolve_codec(&fallback)
                .map(|codec| probe(codec, &sample[..probe_len]))
                .unwrap_or(false)
        };

        let Some(detection) = self.detector.detect(sample) else {
            if fallback_ok() {
                debug!("No encoding candidate, {} decodes the sample", fallback);
                return Ok(fallback);
            }
            return Err(StatementError::encoding_detection(
                "could not detect the file encoding",
                json!({ "detection": null, "fallback_encoding": fallback }),
            ));
        };

        let detected = detection.encoding.to_ascii_lowercase();
        debug!("Detected {} (confidence {:.2})", detected, detection.confidence);

        if detection.confidence < self.config.confidence_threshold {
            if fallback_ok() {
                debug!("Low confidence for {}, using {}", detected, fallback);
                return Ok(fallback);
            }
            warn!("Low confidence for {} and {} failed, keeping detection", detected, fallback);
        }

        if is_shift_jis_family(&detected) {
            if fallback_ok() {
                return Ok(fallback);
            }
            warn!("{} failed on a Shift_JIS-family file, using shift_jis", fallback);
            return Ok("shift_jis".to_string());
        }

        Ok(detected)
    }

    fn read_prefix(&self, path: &Path) -> io::Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut sample = Vec::with_capacity(self.config.detection_bytes);
        file.take(self.config.detection_bytes as u64).read_to_end(&mut sample)?;
        Ok(sample)
    }
}

impl Default for EncodingSniffer {
    fn default() -> Self {
        Self::new(EncodingConfig::default())
    }
}

fn is_shift_jis_family(name: &str) -> bool {
    name.contains("shift_jis") || name.contains("shiftjis")
}

/// Map an encoding name to an `encoding_rs` codec.
///
/// Accepts WHATWG labels plus the names detectors commonly report that
/// WHATWG does not know.
pub fn resolve_codec(name: &str) -> Option<&'static Encoding> {
    match name.trim().to_ascii_lowercase().as_str() {
        "cp932" | "ms932" | "windows-31j" | "windows_31j" => Some(SHIFT_JIS),
        "ascii" | "us-ascii" => Some(UTF_8),
        "utf-8-sig" | "utf_8_sig" | "utf8" => Some(UTF_8),
        other => Encoding::for_label(other.as_bytes()),
    }
}

/// Whether `sample` decodes cleanly with `codec`.
///
/// A multi-byte sequence cut off at the end of the sample is not an error.
pub fn probe(codec: &'static Encoding, sample: &[u8]) -> bool {
    let mut decoder = codec.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(sample.len())
        .unwrap_or(sample.len() * 3 + 16);
    let mut out = String::with_capacity(capacity);
    let (result, _read) = decoder.decode_to_string_without_replacement(sample, &mut out, false);
    matches!(result, DecoderResult::InputEmpty)
}
