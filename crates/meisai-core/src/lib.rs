//! Core library for card statement CSV processing.
//!
//! This crate provides:
//! - Path and size guarding for uploaded statement files
//! - Encoding detection with a CP932 fallback for Windows-exported files
//! - Detail row extraction from the fixed statement layout
//! - `YYMMDD` date and amount normalization
//! - Transaction records with summary statistics and a preview

pub mod error;
pub mod input;
pub mod models;
pub mod statement;

pub use error::{DateFailure, Details, ErrorKind, ExtractionFailure, Result, StatementError};
pub use input::{
    ChardetDetector, Detection, EncodingDetector, EncodingSniffer, FileGuard, TabularReader,
};
pub use models::config::MeisaiConfig;
pub use models::statement::{
    DateRange, DetailRow, ProcessingMetadata, ProcessingResult, RawGrid, Summary, TransactionRecord,
};
pub use statement::StatementProcessor;
