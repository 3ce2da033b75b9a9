//! # Money Module
//!
//! Provides the `Money` type for coupon amounts.
//!
//! ## Whole Pesos
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The Chilean peso has no minor unit in everyday billing.               │
//! │                                                                         │
//! │    amount          = 1000       (stored as i64 pesos)                  │
//! │    discount (20 %) = 200        (rounded to the nearest peso)          │
//! │    displayed as      "$ 1.000"  (es-CL grouping)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vecinal_core::money::Money;
//!
//! let amount = Money::from_pesos(2000);
//! let discount = amount.percentage(20);
//! assert_eq!(discount.pesos(), 400);
//! assert_eq!((amount - discount).to_string(), "$ 1.600");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole Chilean pesos.
///
/// ## Where Money is Used
/// ```text
/// GenerationOptions.amount ──► Coupon.amount ──► displayed "$ 1.000"
///          │
///          └── percentage(discount %) ──► Coupon.discount_amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the value in pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `percent`% of this amount, rounded to the nearest peso.
    ///
    /// Halves round towards positive infinity: 1005 × 10 % = 100.5 → 101,
    /// and -1005 × 10 % = -100.5 → -100.
    ///
    /// ## Example
    /// ```rust
    /// use vecinal_core::money::Money;
    ///
    /// assert_eq!(Money::from_pesos(1000).percentage(20).pesos(), 200);
    /// assert_eq!(Money::from_pesos(1005).percentage(10).pesos(), 101);
    /// assert_eq!(Money::from_pesos(1000).percentage(0).pesos(), 0);
    /// ```
    pub fn percentage(&self, percent: u32) -> Money {
        // i128 keeps `amount * percent` from overflowing
        let scaled = self.0 as i128 * percent as i128;
        let rounded = (scaled + 50).div_euclid(100);
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Chilean peso format: `$ 1.234.567`, negatives as `$ -500`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "$ {}{}", sign, group_thousands(self.0.unsigned_abs()))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (e.g. twelve months of a quota).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pesos() {
        let money = Money::from_pesos(1500);
        assert_eq!(money.pesos(), 1500);
        assert!(!money.is_zero());
        assert!(!money.is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_pesos(0).to_string(), "$ 0");
        assert_eq!(Money::from_pesos(999).to_string(), "$ 999");
        assert_eq!(Money::from_pesos(1000).to_string(), "$ 1.000");
        assert_eq!(Money::from_pesos(1234567).to_string(), "$ 1.234.567");
        assert_eq!(Money::from_pesos(-500).to_string(), "$ -500");
        assert_eq!(Money::from_pesos(-1_234_567).to_string(), "$ -1.234.567");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pesos(1000);
        let b = Money::from_pesos(300);

        assert_eq!((a + b).pesos(), 1300);
        assert_eq!((a - b).pesos(), 700);
        assert_eq!((a * 12).pesos(), 12000);

        let mut c = a;
        c += b;
        c -= Money::from_pesos(100);
        assert_eq!(c.pesos(), 1200);
    }

    #[test]
    fn test_percentage_default_discounts() {
        let amount = Money::from_pesos(1000);
        assert_eq!(amount.percentage(20).pesos(), 200);
        assert_eq!(amount.percentage(30).pesos(), 300);
        assert_eq!(amount.percentage(0).pesos(), 0);
        assert_eq!(amount.percentage(100).pesos(), 1000);
    }

    #[test]
    fn test_percentage_rounding() {
        // 333 × 15 % = 49.95 → 50
        assert_eq!(Money::from_pesos(333).percentage(15).pesos(), 50);
        // 1005 × 10 % = 100.5 → 101
        assert_eq!(Money::from_pesos(1005).percentage(10).pesos(), 101);
        // 1004 × 10 % = 100.4 → 100
        assert_eq!(Money::from_pesos(1004).percentage(10).pesos(), 100);
        // -1005 × 10 % = -100.5 → -100
        assert_eq!(Money::from_pesos(-1005).percentage(10).pesos(), -100);
    }
}
