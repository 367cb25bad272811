//! Statement file input: path guard, encoding detection and CSV decoding.

mod encoding;
mod guard;
mod reader;

pub use encoding::{ChardetDetector, EncodingSniffer, probe, resolve_codec};
pub use guard::{FileGuard, GuardedFile};
pub use reader::TabularReader;

/// A candidate encoding reported by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Encoding name as the detector spells it.
    pub encoding: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl Detection {
    pub fn new(encoding: impl Into<String>, confidence: f32) -> Self {
        Self {
            encoding: encoding.into(),
            confidence,
        }
    }
}

/// Trait for statistical text-encoding detectors.
pub trait EncodingDetector: Send + Sync {
    /// Guess the encoding of `sample`, or `None` if there is no candidate.
    fn detect(&self, sample: &[u8]) -> Option<Detection>;
}
