//! Rule-based field handling for card statements.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod rows;

pub use amounts::{coerce, coerce_all, strip_separators, AMOUNT_SEPARATORS};
pub use dates::{month_label, month_of, normalize, split_normalized, DateCode, CENTURY_PIVOT};
pub use rows::{is_detail_row, Extraction, RowExtractor, REQUIRED_COLUMNS};
pub use patterns::*;
