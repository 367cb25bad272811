//! Common regex patterns for statement rows.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // YYMMDD date code marking a detail row (ASCII digits only)
    pub static ref DATE_CODE: Regex = Regex::new(r"^[0-9]{6}$").unwrap();

    // Rendered YYYY/MM/DD date
    pub static ref NORMALIZED_DATE: Regex = Regex::new(
        r"^([0-9]{4})/([0-9]{2})/([0-9]{2})$"
    ).unwrap();

    // Signed integer amount after separator removal
    pub static ref AMOUNT_INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_code_is_ascii_only() {
        assert!(DATE_CODE.is_match("250115"));
        assert!(!DATE_CODE.is_match("２５０１１５"));
        assert!(!DATE_CODE.is_match("2501150"));
        assert!(!DATE_CODE.is_match("250115\n"));
    }

    #[test]
    fn test_amount_integer() {
        assert!(AMOUNT_INTEGER.is_match("5280"));
        assert!(AMOUNT_INTEGER.is_match("-1200"));
        assert!(!AMOUNT_INTEGER.is_match("12.5"));
        assert!(!AMOUNT_INTEGER.is_match(""));
    }
}
