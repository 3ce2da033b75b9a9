//! # Coupon Lifecycle Rules
//!
//! Pure decisions behind every coupon operation. The service in `vecinal-db`
//! reads the stores, calls into this module, and writes back the result.
//!
//! ## Monthly Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each vecino                                                        │
//! │    for month in 1..=12                                                  │
//! │      exists (vecino, month, year, "mensual")?  ── yes ──► skip         │
//! │           │ no                                                          │
//! │           ▼                                                             │
//! │      build_monthly_coupon()                                             │
//! │        due_date = {year}-{month}-25   (December: day 20)                │
//! │        discount = round(amount × percent[month] / 100)                  │
//! │        status   = pending                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deletion Window
//! ```text
//!   today            = 2026-10-17
//!   cutoff           = 2024-10-17   (today - 2 years)
//!   effective date   = due_date, else 1st of (year, month)
//!
//!   2024-10-16 ──► deletable       2024-10-17 ──► TooRecent
//! ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Coupon, CouponPatch, CouponStatus, GenerationOptions, NewCoupon};
use crate::validation;
use crate::{DELETION_MIN_AGE_YEARS, MONTHLY_COUPON_TYPE};

// =============================================================================
// Dates and Amounts
// =============================================================================

/// Due date of a monthly coupon: the 25th, or the 20th in December.
///
/// Returns `None` for a month outside 1-12.
///
/// ## Example
/// ```rust
/// use vecinal_core::coupon::monthly_due_date;
///
/// assert_eq!(monthly_due_date(2024, 3).unwrap().to_string(), "2024-03-25");
/// assert_eq!(monthly_due_date(2024, 12).unwrap().to_string(), "2024-12-20");
/// assert!(monthly_due_date(2024, 13).is_none());
/// ```
pub fn monthly_due_date(year: i32, month: u32) -> Option<NaiveDate> {
    let day = if month == 12 { 20 } else { 25 };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Default description text for a period.
pub fn default_description(month: u32, year: i32) -> String {
    format!("Pago cuota mensual {}/{}", month, year)
}

/// Date used to age a coupon: its due date, or the 1st of its month.
pub fn effective_payment_date(coupon: &Coupon) -> Option<NaiveDate> {
    coupon
        .due_date
        .or_else(|| NaiveDate::from_ymd_opt(coupon.year, coupon.month, 1))
}

/// Coupons dated strictly before this day may be deleted.
///
/// Same month and day two years back. February 29 has no counterpart two
/// years earlier and rolls over to March 1.
pub fn deletion_cutoff(today: NaiveDate) -> NaiveDate {
    let year = today.year() - DELETION_MIN_AGE_YEARS as i32;
    NaiveDate::from_ymd_opt(year, today.month(), today.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(NaiveDate::MIN)
}

// =============================================================================
// Builders
// =============================================================================

/// Builds a pending monthly coupon for bulk generation.
///
/// The caller is responsible for the existence check.
pub fn build_monthly_coupon(
    vecino_id: &str,
    month: u32,
    year: i32,
    options: &GenerationOptions,
    now: DateTime<Utc>,
) -> Coupon {
    let amount = crate::Money::from_pesos(options.amount);
    let discount = amount.percentage(options.discount_percent(month));
    let description = if options.description.trim().is_empty() {
        default_description(month, year)
    } else {
        options.description.clone()
    };

    Coupon {
        id: Uuid::new_v4().to_string(),
        vecino_id: vecino_id.to_string(),
        month,
        year,
        coupon_type: MONTHLY_COUPON_TYPE.to_string(),
        amount: amount.pesos(),
        discount_amount: discount.pesos(),
        description,
        due_date: monthly_due_date(year, month),
        status: CouponStatus::Pending,
        commitment_date: None,
        created_at: now,
        updated_at: now,
    }
}

/// Builds a pending coupon from a creation request.
///
/// Validates the period and amounts, then fills defaults: type `"mensual"`,
/// the generated description, and for monthly coupons the computed due date.
pub fn build_coupon(request: NewCoupon, now: DateTime<Utc>) -> CoreResult<Coupon> {
    validation::validate_user_id(&request.vecino_id)?;
    validation::validate_month(request.month)?;
    validation::validate_year(request.year)?;
    validation::validate_amount("amount", request.amount)?;
    validation::validate_amount("discount_amount", request.discount_amount)?;

    let coupon_type = match request.coupon_type {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => MONTHLY_COUPON_TYPE.to_string(),
    };
    validation::validate_coupon_type(&coupon_type)?;

    let description = match request.description {
        Some(d) if !d.trim().is_empty() => d,
        _ => default_description(request.month, request.year),
    };
    validation::validate_description(&description)?;

    let due_date = match request.due_date {
        Some(date) => Some(date),
        None if coupon_type == MONTHLY_COUPON_TYPE => monthly_due_date(request.year, request.month),
        None => None,
    };

    Ok(Coupon {
        id: Uuid::new_v4().to_string(),
        vecino_id: request.vecino_id,
        month: request.month,
        year: request.year,
        coupon_type,
        amount: request.amount,
        discount_amount: request.discount_amount,
        description,
        due_date,
        status: CouponStatus::Pending,
        commitment_date: None,
        created_at: now,
        updated_at: now,
    })
}

/// Merges every supplied patch field onto the coupon.
///
/// `vecino_id` is copied as-is; the caller checks the new owner's role first.
pub fn apply_patch(coupon: &mut Coupon, patch: CouponPatch, now: DateTime<Utc>) {
    let CouponPatch {
        vecino_id,
        month,
        year,
        coupon_type,
        amount,
        discount_amount,
        description,
        due_date,
        status,
        commitment_date,
    } = patch;

    if let Some(v) = vecino_id {
        coupon.vecino_id = v;
    }
    if let Some(v) = month {
        coupon.month = v;
    }
    if let Some(v) = year {
        coupon.year = v;
    }
    if let Some(v) = coupon_type {
        coupon.coupon_type = v;
    }
    if let Some(v) = amount {
        coupon.amount = v;
    }
    if let Some(v) = discount_amount {
        coupon.discount_amount = v;
    }
    if let Some(v) = description {
        coupon.description = v;
    }
    if let Some(v) = due_date {
        coupon.due_date = v;
    }
    if let Some(v) = status {
        coupon.status = v;
    }
    if let Some(v) = commitment_date {
        coupon.commitment_date = v;
    }
    coupon.updated_at = now;
}

// =============================================================================
// Guards
// =============================================================================

/// Checks whether a coupon may be permanently deleted on `today`.
///
/// ## Rules
/// 1. Status must be `paid` or `hidden` → else `IneligibleStatus`
/// 2. Effective payment date must be strictly before [`deletion_cutoff`]
///    → else `TooRecent`
pub fn check_deletable(coupon: &Coupon, today: NaiveDate) -> CoreResult<()> {
    if !coupon.status.is_deletable() {
        return Err(CoreError::IneligibleStatus {
            coupon_id: coupon.id.clone(),
            status: coupon.status.to_string(),
            allowed: "paid, hidden".to_string(),
        });
    }

    let cutoff = deletion_cutoff(today);
    let effective = effective_payment_date(coupon).ok_or_else(|| {
        CoreError::Validation(ValidationError::InvalidFormat {
            field: "month".to_string(),
            reason: format!("{}/{} is not a valid period", coupon.month, coupon.year),
        })
    })?;

    if effective >= cutoff {
        return Err(CoreError::TooRecent {
            coupon_id: coupon.id.clone(),
            effective_date: effective.to_string(),
            cutoff: cutoff.to_string(),
        });
    }

    Ok(())
}

/// Records a payment commitment made by `vecino_id` on `today`.
///
/// ## Rules
/// 1. The coupon must belong to the acting vecino → else `NotOwner`
/// 2. Status must be `pending` or `committed` → else `IneligibleStatus`
/// 3. The date cannot be in the past → else `Validation`
///
/// On success the coupon is `committed` with the new date.
pub fn commit_payment(
    coupon: &mut Coupon,
    vecino_id: &str,
    date: NaiveDate,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if coupon.vecino_id != vecino_id {
        return Err(CoreError::NotOwner {
            coupon_id: coupon.id.clone(),
            vecino_id: vecino_id.to_string(),
        });
    }

    if !coupon.status.accepts_commitment() {
        return Err(CoreError::IneligibleStatus {
            coupon_id: coupon.id.clone(),
            status: coupon.status.to_string(),
            allowed: "pending, committed".to_string(),
        });
    }

    validation::validate_commitment_date(date, today)?;

    coupon.commitment_date = Some(date);
    coupon.status = CouponStatus::Committed;
    coupon.updated_at = now;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paid_coupon(due: Option<NaiveDate>) -> Coupon {
        let mut c = build_monthly_coupon("v-1", 10, 2024, &GenerationOptions::for_year(2024), Utc::now());
        c.status = CouponStatus::Paid;
        c.due_date = due;
        c
    }

    #[test]
    fn test_monthly_due_dates() {
        for month in 1..=11 {
            assert_eq!(monthly_due_date(2025, month), Some(date(2025, month, 25)));
        }
        assert_eq!(monthly_due_date(2025, 12), Some(date(2025, 12, 20)));
        assert_eq!(monthly_due_date(2025, 0), None);
    }

    #[test]
    fn test_build_monthly_coupon_discounts() {
        let opts = GenerationOptions::for_year(2024);
        let now = Utc::now();

        let march = build_monthly_coupon("v-1", 3, 2024, &opts, now);
        let december = build_monthly_coupon("v-1", 12, 2024, &opts, now);
        let june = build_monthly_coupon("v-1", 6, 2024, &opts, now);

        assert_eq!(march.discount_amount, 200);
        assert_eq!(december.discount_amount, 300);
        assert_eq!(june.discount_amount, 0);
        assert_eq!(june.description, "Pago cuota mensual 6/2024");
        assert_eq!(december.due_date, Some(date(2024, 12, 20)));
        assert_eq!(june.status, CouponStatus::Pending);
        assert!(june.is_monthly());
    }

    #[test]
    fn test_build_monthly_coupon_custom_description() {
        let opts = GenerationOptions {
            description: "Cuota junta vecinal".to_string(),
            ..GenerationOptions::for_year(2024)
        };
        let c = build_monthly_coupon("v-1", 1, 2024, &opts, Utc::now());
        assert_eq!(c.description, "Cuota junta vecinal");
    }

    #[test]
    fn test_build_coupon_defaults() {
        let c = build_coupon(NewCoupon::monthly("v-1", 4, 2025, 1500), Utc::now()).unwrap();
        assert_eq!(c.coupon_type, "mensual");
        assert_eq!(c.description, "Pago cuota mensual 4/2025");
        assert_eq!(c.due_date, Some(date(2025, 4, 25)));
        assert_eq!(c.status, CouponStatus::Pending);

        let mut req = NewCoupon::monthly("v-1", 4, 2025, 500);
        req.coupon_type = Some("extraordinaria".to_string());
        let c = build_coupon(req, Utc::now()).unwrap();
        assert_eq!(c.coupon_type, "extraordinaria");
        assert_eq!(c.due_date, None);
    }

    #[test]
    fn test_build_coupon_rejects_bad_month() {
        let err = build_coupon(NewCoupon::monthly("v-1", 13, 2025, 1000), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_apply_patch_merges_supplied_fields_only() {
        let mut c = paid_coupon(Some(date(2024, 10, 25)));
        let before = c.clone();
        apply_patch(
            &mut c,
            CouponPatch {
                amount: Some(5000),
                status: Some(CouponStatus::Hidden),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(c.amount, 5000);
        assert_eq!(c.status, CouponStatus::Hidden);
        assert_eq!(c.description, before.description);
        assert_eq!(c.due_date, before.due_date);
        assert_eq!(c.vecino_id, before.vecino_id);
    }

    #[test]
    fn test_apply_patch_clears_dates() {
        let mut c = paid_coupon(Some(date(2024, 10, 25)));
        c.commitment_date = Some(date(2024, 10, 20));

        apply_patch(
            &mut c,
            CouponPatch {
                due_date: Some(None),
                commitment_date: Some(None),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(c.due_date, None);
        assert_eq!(c.commitment_date, None);

        apply_patch(
            &mut c,
            CouponPatch {
                due_date: Some(Some(date(2024, 11, 25))),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(c.due_date, Some(date(2024, 11, 25)));
        assert_eq!(c.commitment_date, None);
    }

    #[test]
    fn test_deletion_cutoff() {
        assert_eq!(deletion_cutoff(date(2026, 10, 17)), date(2024, 10, 17));
        assert_eq!(deletion_cutoff(date(2028, 2, 29)), date(2026, 3, 1));
        assert_eq!(deletion_cutoff(date(2028, 2, 28)), date(2026, 2, 28));
    }

    #[test]
    fn test_check_deletable_on_leap_day() {
        let today = date(2028, 2, 29);

        // 2026-02-28 is before the 2026-03-01 cutoff
        let feb = paid_coupon(Some(date(2026, 2, 28)));
        assert!(check_deletable(&feb, today).is_ok());

        let march = paid_coupon(Some(date(2026, 3, 1)));
        assert!(matches!(
            check_deletable(&march, today),
            Err(CoreError::TooRecent { .. })
        ));
    }

    #[test]
    fn test_check_deletable_age_window() {
        let today = date(2026, 10, 17);

        // one day inside the window
        let recent = paid_coupon(Some(date(2024, 10, 18)));
        assert!(matches!(
            check_deletable(&recent, today),
            Err(CoreError::TooRecent { .. })
        ));

        // exactly on the cutoff is still too recent
        let boundary = paid_coupon(Some(date(2024, 10, 17)));
        assert!(matches!(
            check_deletable(&boundary, today),
            Err(CoreError::TooRecent { .. })
        ));

        let old = paid_coupon(Some(date(2024, 10, 16)));
        assert!(check_deletable(&old, today).is_ok());
    }

    #[test]
    fn test_check_deletable_without_due_date_uses_first_of_month() {
        let today = date(2026, 10, 17);
        let mut c = paid_coupon(None);
        c.month = 10;
        c.year = 2024;
        // 2024-10-01 < 2024-10-17
        assert!(check_deletable(&c, today).is_ok());

        c.month = 11;
        assert!(check_deletable(&c, today).is_err());
    }

    #[test]
    fn test_check_deletable_status() {
        let today = date(2030, 1, 1);
        for status in [CouponStatus::Pending, CouponStatus::Committed] {
            let mut c = paid_coupon(Some(date(2000, 1, 25)));
            c.status = status;
            assert!(matches!(
                check_deletable(&c, today),
                Err(CoreError::IneligibleStatus { .. })
            ));
        }

        let mut hidden = paid_coupon(Some(date(2000, 1, 25)));
        hidden.status = CouponStatus::Hidden;
        assert!(check_deletable(&hidden, today).is_ok());
    }

    #[test]
    fn test_commit_payment() {
        let today = date(2024, 10, 1);
        let mut c = paid_coupon(Some(date(2024, 10, 25)));
        c.status = CouponStatus::Pending;

        let err = commit_payment(&mut c, "someone-else", date(2024, 10, 20), today, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotOwner { .. }));

        let err = commit_payment(&mut c, "v-1", date(2024, 9, 30), today, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        commit_payment(&mut c, "v-1", date(2024, 10, 20), today, Utc::now()).unwrap();
        assert_eq!(c.status, CouponStatus::Committed);
        assert_eq!(c.commitment_date, Some(date(2024, 10, 20)));

        c.status = CouponStatus::Paid;
        let err = commit_payment(&mut c, "v-1", date(2024, 10, 21), today, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::IneligibleStatus { .. }));
    }
}
