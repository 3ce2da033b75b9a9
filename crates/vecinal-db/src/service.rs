//! # Coupon Service
//!
//! Coupon lifecycle operations: creation, bulk monthly generation, listing,
//! update, commitment-to-pay and deletion.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller ──► CouponService ──► UserDirectory / CouponStore (reads)      │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            vecinal_core::coupon (pure rules)                           │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            CouponStore (one write or one batch transaction)            │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            Result<T, ServiceError>                                      │
//! │              ├── Core(CoreError)          rule rejected   (warn!)      │
//! │              └── Persistence { .. }       store failed    (error!)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Local, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::error::DbError;
use crate::repository::{CouponStore, UserDirectory};
use vecinal_core::coupon;
use vecinal_core::validation;
use vecinal_core::{
    Coupon, CouponPatch, CouponStatus, CouponWithVecino, CoreError, GenerationOptions, NewCoupon,
    User, VecinoSummary, MONTHLY_COUPON_TYPE, VECINO_ROLE,
};

// =============================================================================
// Errors
// =============================================================================

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A coupon rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed unexpectedly.
    #[error("Error in {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: DbError,
    },
}

/// Machine-readable error codes for callers.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'DUPLICATE_COUPON': showWarning(e.message); break;
///   case 'TOO_RECENT':       showInfo(e.message);    break;
///   default:                 showError(e.message);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// User missing or not a vecino (400)
    InvalidUser,

    /// Monthly coupon already exists for the period (409)
    DuplicateCoupon,

    /// Coupon or vecino not found (404)
    NotFound,

    /// Coupon belongs to another vecino (403)
    NotOwner,

    /// Status does not allow the operation (422)
    IneligibleStatus,

    /// Coupon is inside the deletion window (422)
    TooRecent,

    /// Input validation failed (400)
    ValidationError,

    /// Store failure (500)
    PersistenceFailure,
}

impl ServiceError {
    /// Returns the error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(err) => match err {
                CoreError::InvalidUser { .. } => ErrorCode::InvalidUser,
                CoreError::DuplicateCoupon { .. } => ErrorCode::DuplicateCoupon,
                CoreError::CouponNotFound(_) | CoreError::VecinoNotFound(_) => ErrorCode::NotFound,
                CoreError::NotOwner { .. } => ErrorCode::NotOwner,
                CoreError::IneligibleStatus { .. } => ErrorCode::IneligibleStatus,
                CoreError::TooRecent { .. } => ErrorCode::TooRecent,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            ServiceError::Persistence { .. } => ErrorCode::PersistenceFailure,
        }
    }

    /// Converts into the serializable response shape.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Error payload handed to transports.
///
/// ```json
/// { "code": "NOT_OWNER", "message": "Coupon c-1 does not belong to vecino v-2" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

fn rejected(operation: &'static str, err: impl Into<CoreError>) -> ServiceError {
    let err = err.into();
    warn!(operation, error = %err, "Coupon operation rejected");
    ServiceError::Core(err)
}

fn persistence(operation: &'static str, source: DbError) -> ServiceError {
    error!(operation, error = %source, "Coupon store failure");
    ServiceError::Persistence { operation, source }
}

fn system_today() -> NaiveDate {
    Local::now().date_naive()
}

// =============================================================================
// Service
// =============================================================================

/// Coupon lifecycle service over a user directory and a coupon store.
///
/// ## Example
/// ```rust,ignore
/// let service = db.coupon_service();
///
/// let created = service.generate_monthly(GenerationOptions::for_year(2025)).await?;
/// let pending = service.list_coupons(Some("pending")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponService<U, C> {
    users: U,
    coupons: C,
    today: fn() -> NaiveDate,
}

impl<U: UserDirectory, C: CouponStore> CouponService<U, C> {
    /// Creates a service that reads the local date from the system clock.
    pub fn new(users: U, coupons: C) -> Self {
        CouponService {
            users,
            coupons,
            today: system_today,
        }
    }

    /// Replaces the clock used for "today" (deletion window, commitments,
    /// default generation year).
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the user if it exists and has the vecino role.
    async fn find_vecino(&self, operation: &'static str, id: &str) -> ServiceResult<Option<User>> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(|e| persistence(operation, e))?;

        Ok(user.filter(User::is_vecino))
    }

    async fn find_coupon(&self, operation: &'static str, id: &str) -> ServiceResult<Coupon> {
        self.coupons
            .find_by_id(id)
            .await
            .map_err(|e| persistence(operation, e))?
            .ok_or_else(|| rejected(operation, CoreError::CouponNotFound(id.to_string())))
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a single coupon with status `pending`.
    ///
    /// ## Errors
    /// - `InvalidUser` if `vecino_id` is not a vecino
    /// - `DuplicateCoupon` if a monthly coupon already exists for the period
    /// - `Validation` for out-of-range period or amounts
    pub async fn create_coupon(&self, request: NewCoupon) -> ServiceResult<Coupon> {
        const OP: &str = "create_coupon";

        let coupon = coupon::build_coupon(request, Utc::now()).map_err(|e| rejected(OP, e))?;

        if self.find_vecino(OP, &coupon.vecino_id).await?.is_none() {
            return Err(rejected(
                OP,
                CoreError::InvalidUser {
                    user_id: coupon.vecino_id.clone(),
                },
            ));
        }

        let duplicate = || CoreError::DuplicateCoupon {
            vecino_id: coupon.vecino_id.clone(),
            month: coupon.month,
            year: coupon.year,
        };

        if coupon.is_monthly() {
            let existing = self
                .coupons
                .find_by_period(&coupon.vecino_id, coupon.month, coupon.year, MONTHLY_COUPON_TYPE)
                .await
                .map_err(|e| persistence(OP, e))?;

            if existing.is_some() {
                return Err(rejected(OP, duplicate()));
            }
        }

        match self.coupons.insert(&coupon).await {
            Ok(()) => {}
            // lost a race against another writer for the same period
            Err(e) if e.is_coupon_period_conflict() => return Err(rejected(OP, duplicate())),
            Err(e) => return Err(persistence(OP, e)),
        }

        info!(
            id = %coupon.id,
            vecino_id = %coupon.vecino_id,
            month = coupon.month,
            year = coupon.year,
            coupon_type = %coupon.coupon_type,
            "Coupon created"
        );

        Ok(coupon)
    }

    /// Generates the missing monthly coupons of a year for every vecino.
    ///
    /// Periods that already have a monthly coupon are skipped, so running it
    /// twice creates nothing the second time. All new rows are written in one
    /// transaction. Returns the coupons actually created.
    pub async fn generate_monthly(&self, options: GenerationOptions) -> ServiceResult<Vec<Coupon>> {
        const OP: &str = "generate_monthly";

        validation::validate_generation_options(&options).map_err(|e| rejected(OP, e))?;

        let year = options.year.unwrap_or_else(|| (self.today)().year());
        let vecinos = self
            .users
            .find_by_role(VECINO_ROLE)
            .await
            .map_err(|e| persistence(OP, e))?;

        debug!(year, vecinos = vecinos.len(), "Generating monthly coupons");

        let now = Utc::now();
        let mut pending = Vec::new();

        for vecino in &vecinos {
            for month in 1..=12 {
                let existing = self
                    .coupons
                    .find_by_period(&vecino.id, month, year, MONTHLY_COUPON_TYPE)
                    .await
                    .map_err(|e| persistence(OP, e))?;

                if existing.is_none() {
                    pending.push(coupon::build_monthly_coupon(
                        &vecino.id, month, year, &options, now,
                    ));
                }
            }
        }

        let candidates = pending.len();
        let created = self
            .coupons
            .insert_batch(pending)
            .await
            .map_err(|e| persistence(OP, e))?;

        info!(
            year,
            vecinos = vecinos.len(),
            candidates,
            created = created.len(),
            "Monthly coupon generation finished"
        );

        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Lists coupons, newest period first.
    ///
    /// An unrecognised status filter is ignored.
    pub async fn list_coupons(&self, status: Option<&str>) -> ServiceResult<Vec<CouponWithVecino>> {
        let filter = CouponStatus::parse_filter(status);
        if filter.is_none() && status.is_some() {
            debug!(status = ?status, "Ignoring unknown status filter");
        }

        self.coupons
            .list(filter)
            .await
            .map_err(|e| persistence("list_coupons", e))
    }

    /// Lists one vecino's coupons, newest period first.
    pub async fn list_vecino_coupons(&self, vecino_id: &str) -> ServiceResult<Vec<CouponWithVecino>> {
        const OP: &str = "list_vecino_coupons";

        if self.find_vecino(OP, vecino_id).await?.is_none() {
            return Err(rejected(OP, CoreError::VecinoNotFound(vecino_id.to_string())));
        }

        self.coupons
            .list_by_vecino(vecino_id)
            .await
            .map_err(|e| persistence(OP, e))
    }

    /// Lists every vecino as a directory summary.
    pub async fn list_vecinos(&self) -> ServiceResult<Vec<VecinoSummary>> {
        let users = self
            .users
            .find_by_role(VECINO_ROLE)
            .await
            .map_err(|e| persistence("list_vecinos", e))?;

        Ok(users.into_iter().map(VecinoSummary::from).collect())
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Merges a patch onto a coupon and persists it.
    ///
    /// ## Errors
    /// - `CouponNotFound` if the id does not resolve
    /// - `InvalidUser` if `vecino_id` is supplied and is not a vecino
    /// - `DuplicateCoupon` if the patch collides with another monthly coupon
    pub async fn update_coupon(&self, id: &str, patch: CouponPatch) -> ServiceResult<Coupon> {
        const OP: &str = "update_coupon";

        let mut coupon = self.find_coupon(OP, id).await?;

        validate_patch(&patch).map_err(|e| rejected(OP, e))?;

        if let Some(new_owner) = patch.vecino_id.as_deref() {
            if self.find_vecino(OP, new_owner).await?.is_none() {
                return Err(rejected(
                    OP,
                    CoreError::InvalidUser {
                        user_id: new_owner.to_string(),
                    },
                ));
            }
        }

        coupon::apply_patch(&mut coupon, patch, Utc::now());

        match self.coupons.update(&coupon).await {
            Ok(()) => {}
            Err(e) if e.is_coupon_period_conflict() => {
                return Err(rejected(
                    OP,
                    CoreError::DuplicateCoupon {
                        vecino_id: coupon.vecino_id.clone(),
                        month: coupon.month,
                        year: coupon.year,
                    },
                ))
            }
            Err(DbError::NotFound { .. }) => {
                return Err(rejected(OP, CoreError::CouponNotFound(id.to_string())))
            }
            Err(e) => return Err(persistence(OP, e)),
        }

        info!(id = %coupon.id, status = %coupon.status, "Coupon updated");
        Ok(coupon)
    }

    /// Records the date on which the owning vecino promises to pay.
    ///
    /// The coupon moves to `committed`.
    pub async fn commit_payment(
        &self,
        vecino_id: &str,
        coupon_id: &str,
        date: NaiveDate,
    ) -> ServiceResult<Coupon> {
        const OP: &str = "commit_payment";

        let mut coupon = self.find_coupon(OP, coupon_id).await?;

        coupon::commit_payment(&mut coupon, vecino_id, date, (self.today)(), Utc::now())
            .map_err(|e| rejected(OP, e))?;

        match self.coupons.update(&coupon).await {
            Ok(()) => {}
            Err(DbError::NotFound { .. }) => {
                return Err(rejected(OP, CoreError::CouponNotFound(coupon_id.to_string())))
            }
            Err(e) => return Err(persistence(OP, e)),
        }

        info!(
            id = %coupon.id,
            vecino_id = %vecino_id,
            commitment_date = %date,
            "Payment commitment recorded"
        );
        Ok(coupon)
    }

    /// Permanently deletes a settled coupon older than the deletion window.
    ///
    /// Returns the removed coupon.
    ///
    /// ## Errors
    /// - `CouponNotFound` if the id does not resolve
    /// - `IneligibleStatus` unless the coupon is `paid` or `hidden`
    /// - `TooRecent` unless its effective date is before today minus two years
    pub async fn delete_coupon(&self, id: &str) -> ServiceResult<Coupon> {
        const OP: &str = "delete_coupon";

        let coupon = self.find_coupon(OP, id).await?;

        coupon::check_deletable(&coupon, (self.today)()).map_err(|e| rejected(OP, e))?;

        let deleted = self
            .coupons
            .delete(id)
            .await
            .map_err(|e| persistence(OP, e))?;

        if !deleted {
            return Err(rejected(OP, CoreError::CouponNotFound(id.to_string())));
        }

        info!(
            id = %coupon.id,
            vecino_id = %coupon.vecino_id,
            month = coupon.month,
            year = coupon.year,
            "Coupon deleted"
        );
        Ok(coupon)
    }
}

/// Field-level checks for the supplied patch values.
fn validate_patch(patch: &CouponPatch) -> Result<(), CoreError> {
    if let Some(id) = patch.vecino_id.as_deref() {
        validation::validate_user_id(id)?;
    }
    if let Some(month) = patch.month {
        validation::validate_month(month)?;
    }
    if let Some(year) = patch.year {
        validation::validate_year(year)?;
    }
    if let Some(coupon_type) = patch.coupon_type.as_deref() {
        validation::validate_coupon_type(coupon_type)?;
    }
    if let Some(amount) = patch.amount {
        validation::validate_amount("amount", amount)?;
    }
    if let Some(discount) = patch.discount_amount {
        validation::validate_amount("discount_amount", discount)?;
    }
    if let Some(description) = patch.description.as_deref() {
        validation::validate_description(description)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
