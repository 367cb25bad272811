//! `YYMMDD` date code normalization.
//!
//! The day check is a plain 1-31 range check. Codes such as `250230` or
//! `250431` are accepted even though those days do not exist; the month
//! length and leap years are never consulted.

use serde_json::json;

use super::patterns::{DATE_CODE, NORMALIZED_DATE};
use crate::error::{DateFailure, Result, StatementError};

/// Two-digit years up to this value belong to the 2000s, the rest to the 1900s.
pub const CENTURY_PIVOT: u32 = 49;

/// A syntactically valid date code split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCode {
    pub yy: u32,
    pub month: u32,
    pub day: u32,
}

impl DateCode {
    /// Check the digit format and month range; the day is not checked.
    pub fn parse(code: &str) -> Result<Self> {
        if !DATE_CODE.is_match(code) {
            return Err(StatementError::date_conversion(
                DateFailure::Format,
                format!("date code must be 6 digits: {}", code),
                json!({ "input": code, "expected_pattern": "YYMMDD" }),
            ));
        }

        let field = |range: std::ops::Range<usize>| code[range].parse::<u32>().unwrap_or(0);
        let date = Self {
            yy: field(0..2),
            month: field(2..4),
            day: field(4..6),
        };

        if !(1..=12).contains(&date.month) {
            return Err(StatementError::date_conversion(
                DateFailure::MonthOutOfRange,
                format!("month must be 1-12: {}", date.month),
                json!({ "input": code, "extracted_month": date.month }),
            ));
        }

        Ok(date)
    }

    /// Four-digit year using the century window.
    pub fn year(&self) -> i32 {
        if self.yy <= CENTURY_PIVOT {
            2000 + self.yy as i32
        } else {
            1900 + self.yy as i32
        }
    }
}

/// Convert `YYMMDD` to `YYYY/MM/DD`.
pub fn normalize(code: &str) -> Result<String> {
    let date = DateCode::parse(code)?;

    if !(1..=31).contains(&date.day) {
        return Err(StatementError::date_conversion(
            DateFailure::DayOutOfRange,
            format!("day must be 1-31: {}", date.day),
            json!({ "input": code, "extracted_day": date.day }),
        ));
    }

    Ok(format!("{:04}/{:02}/{:02}", date.year(), date.month, date.day))
}

/// Month number of a `YYMMDD` code, ignoring the day.
pub fn month_of(code: &str) -> Result<u32> {
    DateCode::parse(code).map(|d| d.month)
}

/// Year and month of a rendered `YYYY/MM/DD` date.
pub fn split_normalized(date: &str) -> Result<(i32, u32)> {
    let caps = NORMALIZED_DATE.captures(date).ok_or_else(|| {
        StatementError::date_conversion(
            DateFailure::Format,
            format!("date must be YYYY/MM/DD: {}", date),
            json!({ "input": date, "expected_pattern": "YYYY/MM/DD" }),
        )
    })?;

    let year: i32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    Ok((year, month))
}

/// Display label for a month, e.g. `2025年1月`.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{}年{}月", year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reason(code: &str) -> DateFailure {
        match normalize(code).unwrap_err() {
            StatementError::DateConversion { reason, .. } => reason,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("250115").unwrap(), "2025/01/15");
        assert_eq!(normalize("240229").unwrap(), "2024/02/29");
    }

    #[test]
    fn test_century_window_bounds() {
        assert_eq!(normalize("000101").unwrap(), "2000/01/01");
        assert_eq!(normalize("491231").unwrap(), "2049/12/31");
        assert_eq!(normalize("500101").unwrap(), "1950/01/01");
        assert_eq!(normalize("991231").unwrap(), "1999/12/31");
    }

    #[test]
    fn test_century_window_all_years() {
        for yy in 0..100u32 {
            let date = normalize(&format!("{:02}0601", yy)).unwrap();
            let expected = if yy <= 49 { 2000 + yy } else { 1900 + yy };
            assert_eq!(date, format!("{}/06/01", expected));
        }
    }

    #[test]
    fn test_rejects_bad_format() {
        for code in ["25011", "2501150", "25a115", "", " 250115", "２５０１１５"] {
            assert_eq!(reason(code), DateFailure::Format, "{:?}", code);
        }
    }

    #[test]
    fn test_rejects_month_out_of_range() {
        assert_eq!(reason("250015"), DateFailure::MonthOutOfRange);
        assert_eq!(reason("251301"), DateFailure::MonthOutOfRange);
    }

    #[test]
    fn test_rejects_day_out_of_range() {
        assert_eq!(reason("250100"), DateFailure::DayOutOfRange);
        assert_eq!(reason("250132"), DateFailure::DayOutOfRange);
    }

    // Known limitation: only the 1-31 range is checked.
    #[test]
    fn test_impossible_calendar_days_are_accepted() {
        assert_eq!(normalize("250230").unwrap(), "2025/02/30");
        assert_eq!(normalize("250431").unwrap(), "2025/04/31");
        assert_eq!(normalize("230229").unwrap(), "2023/02/29");
    }

    #[test]
    fn test_month_of() {
        assert_eq!(month_of("250115").unwrap(), 1);
        assert_eq!(month_of("241231").unwrap(), 12);
        assert_eq!(month_of("250601").unwrap(), 6);
        // Day is ignored.
        assert_eq!(month_of("250600").unwrap(), 6);
        assert_eq!(month_of("250699").unwrap(), 6);

        assert_eq!(month_of("25011").unwrap_err().kind(), ErrorKind::DateConversion);
        assert_eq!(month_of("251301").unwrap_err().kind(), ErrorKind::DateConversion);
        assert_eq!(month_of("250001").unwrap_err().kind(), ErrorKind::DateConversion);
    }

    #[test]
    fn test_split_normalized() {
        assert_eq!(split_normalized("2025/01/15").unwrap(), (2025, 1));
        assert_eq!(split_normalized("1999/12/31").unwrap(), (1999, 12));
        assert!(split_normalized("250115").is_err());
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(2025, 1), "2025年1月");
        assert_eq!(month_label(1999, 12), "1999年12月");
    }
}
