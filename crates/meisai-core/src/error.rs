//! Error types for the meisai-core library.
//!
//! Every failure the pipeline can produce is one variant of [`StatementError`].
//! Each variant carries a human-readable message and a JSON detail map with
//! the values that triggered it.

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Structured diagnostic payload attached to every error.
pub type Details = Map<String, Value>;

/// Main error type for the meisai library.
#[derive(Error, Debug, Clone)]
pub enum StatementError {
    /// The file lies outside the authorized directory.
    #[error("path validation failed: {message}")]
    PathValidation { message: String, details: Details },

    /// The file exceeds the size ceiling.
    #[error("file size check failed: {message}")]
    FileSize { message: String, details: Details },

    /// The file does not exist.
    #[error("file not found: {message}")]
    FileNotFound { message: String, details: Details },

    /// No usable text encoding could be determined.
    #[error("encoding detection failed: {message}")]
    EncodingDetection { message: String, details: Details },

    /// The file could not be decoded or parsed as CSV, or was empty.
    #[error("invalid file format: {message}")]
    InvalidFileFormat { message: String, details: Details },

    /// The detail section is missing, malformed or holds unparseable amounts.
    #[error("data extraction failed: {message}")]
    DataExtraction {
        reason: ExtractionFailure,
        message: String,
        details: Details,
    },

    /// A date code could not be converted.
    #[error("date conversion failed: {message}")]
    DateConversion {
        reason: DateFailure,
        message: String,
        details: Details,
    },

    /// Anything not covered by the kinds above.
    #[error("processing failed: {message}")]
    Processing { message: String, details: Details },
}

/// Discriminant of [`StatementError`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathValidation,
    FileSize,
    FileNotFound,
    EncodingDetection,
    InvalidFileFormat,
    DataExtraction,
    DateConversion,
    Processing,
}

/// Why the detail section could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFailure {
    /// The grid ends before the detail section starts.
    NoDataSection,
    /// The detail section holds no row starting with a date code.
    NoDataRows,
    /// A structurally required column is absent.
    MissingColumns,
    /// One or more amounts are not integers.
    InvalidAmounts,
}

/// Why a date code was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFailure {
    /// Not exactly six ASCII digits.
    Format,
    MonthOutOfRange,
    DayOutOfRange,
}

impl StatementError {
    pub fn path_validation(message: impl Into<String>, details: Value) -> Self {
        Self::PathValidation {
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn file_size(message: impl Into<String>, details: Value) -> Self {
        Self::FileSize {
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn file_not_found(message: impl Into<String>, details: Value) -> Self {
        Self::FileNotFound {
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn encoding_detection(message: impl Into<String>, details: Value) -> Self {
        Self::EncodingDetection {
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn invalid_file_format(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidFileFormat {
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn data_extraction(
        reason: ExtractionFailure,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::DataExtraction {
            reason,
            message: message.into(),
            details: into_details(details),
        }
    }

    pub fn date_conversion(
        reason: DateFailure,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::DateConversion {
            reason,
            message: message.into(),
            details: into_details(details),
        }
    }

    /// Wrap an unanticipated error, keeping its type name and message.
    pub fn processing<E: std::error::Error>(err: &E, mut details: Details) -> Self {
        details.insert("error_type".into(), json!(std::any::type_name::<E>()));
        details.insert("error_message".into(), json!(err.to_string()));
        Self::Processing {
            message: format!("unexpected error: {}", err),
            details,
        }
    }

    /// Which kind of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathValidation { .. } => ErrorKind::PathValidation,
            Self::FileSize { .. } => ErrorKind::FileSize,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::EncodingDetection { .. } => ErrorKind::EncodingDetection,
            Self::InvalidFileFormat { .. } => ErrorKind::InvalidFileFormat,
            Self::DataExtraction { .. } => ErrorKind::DataExtraction,
            Self::DateConversion { .. } => ErrorKind::DateConversion,
            Self::Processing { .. } => ErrorKind::Processing,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::PathValidation { message, .. }
            | Self::FileSize { message, .. }
            | Self::FileNotFound { message, .. }
            | Self::EncodingDetection { message, .. }
            | Self::InvalidFileFormat { message, .. }
            | Self::DataExtraction { message, .. }
            | Self::DateConversion { message, .. }
            | Self::Processing { message, .. } => message,
        }
    }

    pub fn details(&self) -> &Details {
        match self {
            Self::PathValidation { details, .. }
            | Self::FileSize { details, .. }
            | Self::FileNotFound { details, .. }
            | Self::EncodingDetection { details, .. }
            | Self::InvalidFileFormat { details, .. }
            | Self::DataExtraction { details, .. }
            | Self::DateConversion { details, .. }
            | Self::Processing { details, .. } => details,
        }
    }

    /// All failures stem from malformed input or a misconfigured
    /// environment, so none of them is worth retrying.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// JSON report with the kind, message, details and sub-reason if any.
    pub fn to_report(&self) -> Value {
        let mut report = json!({
            "kind": self.kind(),
            "message": self.message(),
            "details": self.details(),
        });
        let reason = match self {
            Self::DataExtraction { reason, .. } => Some(json!(reason)),
            Self::DateConversion { reason, .. } => Some(json!(reason)),
            _ => None,
        };
        if let (Some(reason), Some(obj)) = (reason, report.as_object_mut()) {
            obj.insert("reason".into(), reason);
        }
        report
    }
}

impl From<std::io::Error> for StatementError {
    fn from(err: std::io::Error) -> Self {
        let mut details = Details::new();
        details.insert("io_kind".into(), json!(format!("{:?}", err.kind())));
        Self::processing(&err, details)
    }
}

fn into_details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        Value::Null => Details::new(),
        other => {
            let mut map = Details::new();
            map.insert("value".into(), other);
            map
        }
    }
}

/// Result type for the meisai library.
pub type Result<T> = std::result::Result<T, StatementError>;
