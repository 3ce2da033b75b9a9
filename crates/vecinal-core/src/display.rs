//! # Display Helpers
//!
//! Stateless formatting used when presenting coupons.

use chrono::NaiveDate;

use crate::money::Money;

/// Formats a date as `dd-mm-yyyy`; empty when absent.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use vecinal_core::display::format_date;
///
/// let due = NaiveDate::from_ymd_opt(2024, 3, 5);
/// assert_eq!(format_date(due), "05-03-2024");
/// assert_eq!(format_date(None), "");
/// ```
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_default()
}

/// Formats a peso amount as `$ 1.234`; `$ 0` when absent.
pub fn format_currency(pesos: Option<i64>) -> String {
    Money::from_pesos(pesos.unwrap_or(0)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 20);
        assert_eq!(format_date(d), "20-12-2025");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(1234567)), "$ 1.234.567");
        assert_eq!(format_currency(Some(800)), "$ 800");
        assert_eq!(format_currency(None), "$ 0");
    }
}
