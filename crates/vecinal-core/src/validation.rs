//! # Validation Module
//!
//! Input validation for coupon payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controller                                                   │
//! │  └── Shape checks (deserialization, unknown fields rejected)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Ranges: month 1-12, amounts >= 0, discount 0-100 %                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (month BETWEEN 1 AND 12)                                    │
//! │  ├── UNIQUE (vecino_id, month, year) WHERE coupon_type = 'mensual'     │
//! │  └── Foreign key to users                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;
use crate::types::GenerationOptions;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Period Validators
// =============================================================================

/// Validates a month number (1-12).
///
/// ## Example
/// ```rust
/// use vecinal_core::validation::validate_month;
///
/// assert!(validate_month(1).is_ok());
/// assert!(validate_month(12).is_ok());
/// assert!(validate_month(0).is_err());
/// assert!(validate_month(13).is_err());
/// ```
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }
    Ok(())
}

/// Validates a coupon year.
///
/// Any year with a full calendar is accepted; only years outside what
/// `NaiveDate` can hold are rejected.
pub fn validate_year(year: i32) -> ValidationResult<()> {
    let min = NaiveDate::MIN.year();
    let max = NaiveDate::MAX.year();
    if !(min..=max).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates a peso amount. Zero is allowed.
pub fn validate_amount(field: &str, pesos: i64) -> ValidationResult<()> {
    if pesos < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a discount percentage (0-100).
pub fn validate_discount_percent(percent: u32) -> ValidationResult<()> {
    if percent > 100 {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a user id reference.
pub fn validate_user_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "vecino_id".to_string(),
        });
    }
    Ok(())
}

/// Validates a coupon type name.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
pub fn validate_coupon_type(coupon_type: &str) -> ValidationResult<()> {
    let coupon_type = coupon_type.trim();

    if coupon_type.is_empty() {
        return Err(ValidationError::Required {
            field: "type".to_string(),
        });
    }

    if coupon_type.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "type".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a coupon description (at most 255 characters).
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > 255 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 255,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// A commitment date cannot lie before `today`.
pub fn validate_commitment_date(date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if date < today {
        return Err(ValidationError::DateTooEarly {
            field: "commitment_date".to_string(),
            min: today.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates bulk generation options.
pub fn validate_generation_options(options: &GenerationOptions) -> ValidationResult<()> {
    validate_amount("amount", options.amount)?;
    validate_description(&options.description)?;

    if let Some(year) = options.year {
        validate_year(year)?;
    }

    for (&month, &percent) in &options.discount_percent_by_month {
        validate_month(month)?;
        validate_discount_percent(percent)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_validate_month() {
        for m in 1..=12 {
            assert!(validate_month(m).is_ok());
        }
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year(2024).is_ok());
        assert!(validate_year(1999).is_ok());
        assert!(validate_year(2101).is_ok());
        assert!(validate_year(1).is_ok());
        assert!(validate_year(i32::MAX).is_err());
        assert!(validate_year(i32::MIN).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", 0).is_ok());
        assert!(validate_amount("amount", 1000).is_ok());
        assert!(validate_amount("amount", -1).is_err());
    }

    #[test]
    fn test_validate_coupon_type() {
        assert!(validate_coupon_type("mensual").is_ok());
        assert!(validate_coupon_type("  ").is_err());
        assert!(validate_coupon_type(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_commitment_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(validate_commitment_date(today, today).is_ok());
        assert!(validate_commitment_date(today.succ_opt().unwrap(), today).is_ok());
        assert!(validate_commitment_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn test_validate_generation_options() {
        assert!(validate_generation_options(&GenerationOptions::default()).is_ok());

        let bad_month = GenerationOptions {
            discount_percent_by_month: BTreeMap::from([(13, 10)]),
            ..Default::default()
        };
        assert!(validate_generation_options(&bad_month).is_err());

        let bad_percent = GenerationOptions {
            discount_percent_by_month: BTreeMap::from([(3, 120)]),
            ..Default::default()
        };
        assert!(validate_generation_options(&bad_percent).is_err());

        let negative = GenerationOptions {
            amount: -5,
            ..Default::default()
        };
        assert!(validate_generation_options(&negative).is_err());
    }
}
