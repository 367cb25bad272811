//! Statement extraction: detail rows to normalized transaction records.

mod processor;
pub mod rules;

pub use processor::{build_record, build_records, StatementProcessor};
