//! # vecinal-core: Pure Business Logic for Vecinal
//!
//! Domain rules for monthly payment coupons ("cupones de pago") issued to
//! neighbours ("vecinos"). Everything here is a pure function or a plain
//! type; persistence lives in `vecinal-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vecinal Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Controllers (outside this workspace)               │   │
//! │  │    POST /cupones, PATCH /cupones/:id, POST /cupones/generar     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              vecinal-db: CouponService + repositories           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vecinal-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  coupon   │  │ validation│  │   │
//! │  │   │  Coupon   │  │   Money   │  │ due dates │  │   rules   │  │   │
//! │  │   │   User    │  │  (pesos)  │  │ deletion  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, User, CouponStatus, payloads)
//! - [`money`] - Money type in whole Chilean pesos
//! - [`coupon`] - Coupon lifecycle rules (due dates, discounts, deletion window)
//! - [`validation`] - Input validation
//! - [`display`] - Currency and date formatting for presentation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vecinal_core::coupon::monthly_due_date;
//! use vecinal_core::money::Money;
//!
//! let due = monthly_due_date(2024, 12).unwrap();
//! assert_eq!(due.to_string(), "2024-12-20");
//!
//! let discount = Money::from_pesos(1000).percentage(30);
//! assert_eq!(discount.pesos(), 300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coupon;
pub mod display;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Role value identifying neighbour users in the user directory.
pub const VECINO_ROLE: &str = "vecino";

/// Coupon type that is unique per (vecino, month, year).
pub const MONTHLY_COUPON_TYPE: &str = "mensual";

/// Default amount for generated monthly coupons, in pesos.
pub const DEFAULT_MONTHLY_AMOUNT: i64 = 1000;

/// Minimum age, in years, before a settled coupon may be deleted.
pub const DELETION_MIN_AGE_YEARS: u32 = 2;
