//! # Repository Module
//!
//! Store abstractions consumed by [`CouponService`](crate::service::CouponService)
//! and their SQLite implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CouponService<U: UserDirectory, C: CouponStore>                       │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  UserDirectory (trait)              CouponStore (trait)                │
//! │  ├── find_by_id                     ├── find_by_id                     │
//! │  └── find_by_role                   ├── find_by_period                 │
//! │       │                             ├── list / list_by_vecino          │
//! │       │                             ├── insert / insert_batch          │
//! │       │                             ├── update                         │
//! │       │                             └── delete                         │
//! │       ▼                                  ▼                              │
//! │  UserRepository (SQLite)            CouponRepository (SQLite)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod coupon;
pub mod user;

use async_trait::async_trait;

use crate::error::DbResult;
use vecinal_core::{Coupon, CouponStatus, CouponWithVecino, User};

/// Read-only access to the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Gets a user by id.
    async fn find_by_id(&self, id: &str) -> DbResult<Option<User>>;

    /// Lists users with the given role, ordered by name.
    async fn find_by_role(&self, role: &str) -> DbResult<Vec<User>>;
}

/// Persistence for coupons.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Gets a coupon by id.
    async fn find_by_id(&self, id: &str) -> DbResult<Option<Coupon>>;

    /// Gets the coupon of a type for a vecino's period, if any.
    async fn find_by_period(
        &self,
        vecino_id: &str,
        month: u32,
        year: i32,
        coupon_type: &str,
    ) -> DbResult<Option<Coupon>>;

    /// Lists coupons (optionally by status), newest period first, with owners.
    async fn list(&self, status: Option<CouponStatus>) -> DbResult<Vec<CouponWithVecino>>;

    /// Lists a vecino's coupons, newest period first, with owner.
    async fn list_by_vecino(&self, vecino_id: &str) -> DbResult<Vec<CouponWithVecino>>;

    /// Inserts one coupon.
    async fn insert(&self, coupon: &Coupon) -> DbResult<()>;

    /// Inserts coupons in one transaction, skipping rows that conflict with an
    /// existing monthly period. Returns the rows actually inserted.
    async fn insert_batch(&self, coupons: Vec<Coupon>) -> DbResult<Vec<Coupon>>;

    /// Persists every field of an existing coupon.
    async fn update(&self, coupon: &Coupon) -> DbResult<()>;

    /// Deletes a coupon. Returns `false` if no row matched.
    async fn delete(&self, id: &str) -> DbResult<bool>;
}
