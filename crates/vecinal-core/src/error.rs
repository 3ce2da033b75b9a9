//! # Error Types
//!
//! Domain-specific error types for vecinal-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vecinal-core errors (this file)                                       │
//! │  ├── CoreError        - Coupon rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vecinal-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - What callers of CouponService see              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴→ ServiceError → Controller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Coupon business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The referenced user is missing or does not have the `vecino` role.
    ///
    /// ## When This Occurs
    /// - Creating a coupon for an unknown user id
    /// - Creating a coupon for an administrator
    /// - Reassigning a coupon to a non-vecino
    #[error("User {user_id} does not exist or does not have the vecino role")]
    InvalidUser { user_id: String },

    /// A monthly coupon already exists for the period.
    #[error("A monthly coupon for {month}/{year} already exists for vecino {vecino_id}")]
    DuplicateCoupon {
        vecino_id: String,
        month: u32,
        year: i32,
    },

    /// Coupon id does not resolve.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Vecino id does not resolve to a user with the `vecino` role.
    #[error("Vecino not found: {0}")]
    VecinoNotFound(String),

    /// The acting vecino does not own the coupon.
    #[error("Coupon {coupon_id} does not belong to vecino {vecino_id}")]
    NotOwner {
        coupon_id: String,
        vecino_id: String,
    },

    /// Coupon status does not allow the requested operation.
    ///
    /// ## When This Occurs
    /// - Deleting a coupon that is not `paid` or `hidden`
    /// - Committing to pay a coupon that is already `paid` or `hidden`
    #[error("Coupon {coupon_id} is {status}, expected one of: {allowed}")]
    IneligibleStatus {
        coupon_id: String,
        status: String,
        allowed: String,
    },

    /// Coupon is younger than the deletion window.
    #[error("Coupon {coupon_id} is dated {effective_date}; only coupons dated before {cutoff} can be deleted")]
    TooRecent {
        coupon_id: String,
        effective_date: String,
        cutoff: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., a month/year pair that is not a real date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date lies before the earliest allowed date.
    #[error("{field} cannot be earlier than {min}")]
    DateTooEarly { field: String, min: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
