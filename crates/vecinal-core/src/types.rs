//! # Domain Types
//!
//! Core domain types used throughout Vecinal.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Coupon      │   │  CouponStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  vecino_id (FK) │   │  Pending        │       │
//! │  │  full_name      │   │  month, year    │   │  Paid           │       │
//! │  │  rut, email     │   │  coupon_type    │   │  Committed      │       │
//! │  │  role           │   │  amount         │   │  Hidden         │       │
//! │  └─────────────────┘   │  due_date       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  Payloads: NewCoupon, CouponPatch, GenerationOptions                   │
//! │  Views:    VecinoSummary, CouponWithVecino                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_MONTHLY_AMOUNT, VECINO_ROLE};

// =============================================================================
// User
// =============================================================================

/// A user from the directory. Only users with role `vecino` own coupons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// Chilean national id (RUT), e.g. `12.345.678-5`.
    pub rut: String,
    pub role: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Checks whether this user may own coupons.
    #[inline]
    pub fn is_vecino(&self) -> bool {
        self.role == VECINO_ROLE
    }
}

/// Minimal, non-sensitive view of a vecino.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VecinoSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub rut: String,
}

impl From<User> for VecinoSummary {
    fn from(user: User) -> Self {
        VecinoSummary {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            rut: user.rut,
        }
    }
}

// =============================================================================
// Coupon Status
// =============================================================================

/// Payment state of a coupon.
///
/// ```text
/// Pending ──commit_payment──► Committed
///    │                            │
///    └──────── update ────────────┴──► Paid / Hidden ──(2 years)──► deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    /// Issued and awaiting payment.
    Pending,
    /// Payment registered.
    Paid,
    /// The vecino pledged a payment date.
    Committed,
    /// Hidden from the vecino's view.
    Hidden,
}

impl CouponStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [CouponStatus; 4] = [
        CouponStatus::Pending,
        CouponStatus::Paid,
        CouponStatus::Committed,
        CouponStatus::Hidden,
    ];

    /// Returns the stored/serialized name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Pending => "pending",
            CouponStatus::Paid => "paid",
            CouponStatus::Committed => "committed",
            CouponStatus::Hidden => "hidden",
        }
    }

    /// Statuses from which a coupon may be deleted.
    #[inline]
    pub const fn is_deletable(&self) -> bool {
        matches!(self, CouponStatus::Paid | CouponStatus::Hidden)
    }

    /// Statuses that accept a payment commitment.
    #[inline]
    pub const fn accepts_commitment(&self) -> bool {
        matches!(self, CouponStatus::Pending | CouponStatus::Committed)
    }

    /// Parses an optional listing filter. Unknown values mean "no filter".
    ///
    /// ## Example
    /// ```rust
    /// use vecinal_core::CouponStatus;
    ///
    /// assert_eq!(CouponStatus::parse_filter(Some("paid")), Some(CouponStatus::Paid));
    /// assert_eq!(CouponStatus::parse_filter(Some("archived")), None);
    /// assert_eq!(CouponStatus::parse_filter(None), None);
    /// ```
    pub fn parse_filter(filter: Option<&str>) -> Option<CouponStatus> {
        filter.and_then(|s| s.parse().ok())
    }
}

impl Default for CouponStatus {
    fn default() -> Self {
        CouponStatus::Pending
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown coupon status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for CouponStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CouponStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A billing record for one period owed by one vecino.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner; always a user with role `vecino`.
    pub vecino_id: String,

    /// Covered month, 1-12.
    pub month: u32,

    /// Covered year.
    pub year: i32,

    /// `"mensual"` or an ad-hoc type.
    #[serde(rename = "type")]
    pub coupon_type: String,

    /// Amount owed, in pesos.
    pub amount: i64,

    /// Discount granted for paying this period, in pesos.
    pub discount_amount: i64,

    pub description: String,

    /// Payment due date (no time component).
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    pub status: CouponStatus,

    /// Date the vecino pledged to pay by.
    #[ts(as = "Option<String>")]
    pub commitment_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_pesos(self.amount)
    }

    /// Returns the discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_pesos(self.discount_amount)
    }

    /// Amount payable when the discount applies.
    #[inline]
    pub fn discounted_amount(&self) -> Money {
        self.amount() - self.discount()
    }

    /// Checks whether this is a monthly coupon.
    #[inline]
    pub fn is_monthly(&self) -> bool {
        self.coupon_type == crate::MONTHLY_COUPON_TYPE
    }
}

/// A coupon together with its owning vecino.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponWithVecino {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub vecino: VecinoSummary,
}

// =============================================================================
// Payloads
// =============================================================================

/// Input for creating a single coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    pub vecino_id: String,
    pub month: u32,
    pub year: i32,
    /// Defaults to `"mensual"`.
    #[serde(default, rename = "type")]
    pub coupon_type: Option<String>,
    pub amount: i64,
    #[serde(default)]
    pub discount_amount: i64,
    /// Defaults to `"Pago cuota mensual {month}/{year}"`.
    #[serde(default)]
    pub description: Option<String>,
    /// Computed for monthly coupons when absent.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
}

impl NewCoupon {
    /// Creates a monthly coupon request with no extra fields.
    pub fn monthly(vecino_id: impl Into<String>, month: u32, year: i32, amount: i64) -> Self {
        NewCoupon {
            vecino_id: vecino_id.into(),
            month,
            year,
            coupon_type: None,
            amount,
            discount_amount: 0,
            description: None,
            due_date: None,
        }
    }
}

/// Partial update of a coupon.
///
/// The field set is closed: unknown keys are rejected when deserializing.
/// `vecino_id` reassigns ownership and is checked against the user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CouponPatch {
    #[serde(default)]
    pub vecino_id: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "type")]
    pub coupon_type: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub discount_amount: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` clears the due date; absent leaves it untouched.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<CouponStatus>,
    /// `null` clears the commitment; absent leaves it untouched.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub commitment_date: Option<Option<NaiveDate>>,
}

/// Reads a present field as `Some(value)`, keeping an explicit `null` as
/// `Some(None)`. Absent fields fall back to `None` through `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Options for bulk monthly generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Amount for every generated coupon, in pesos.
    pub amount: i64,
    /// Shared description; empty means the per-month default text.
    pub description: String,
    /// Target year; `None` means the current year.
    pub year: Option<i32>,
    /// Discount percentage keyed by month (1-12). Missing months get 0 %.
    pub discount_percent_by_month: BTreeMap<u32, u32>,
}

impl GenerationOptions {
    /// Default options for a specific year.
    pub fn for_year(year: i32) -> Self {
        GenerationOptions {
            year: Some(year),
            ..Default::default()
        }
    }

    /// Discount percentage for a month.
    pub fn discount_percent(&self, month: u32) -> u32 {
        self.discount_percent_by_month
            .get(&month)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            amount: DEFAULT_MONTHLY_AMOUNT,
            description: String::new(),
            year: None,
            discount_percent_by_month: default_discounts(),
        }
    }
}

/// March 20 %, December 30 %.
pub fn default_discounts() -> BTreeMap<u32, u32> {
    BTreeMap::from([(3, 20), (12, 30)])
}

// =============================================================================
// Unit Tests
// =============================================================================
