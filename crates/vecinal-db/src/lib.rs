//! # vecinal-db: Persistence and Coupon Service for Vecinal
//!
//! SQLite storage for users and coupons, plus the [`CouponService`] that
//! applies the rules from `vecinal-core` on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vecinal Data Flow                                │
//! │                                                                         │
//! │  Controller (POST /cupones/generar)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   vecinal-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ CouponService │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │───►│ UserRepo      │    │  (embedded)  │  │   │
//! │  │   │               │    │ CouponRepo    │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │                        ┌───────▼───────┐                        │   │
//! │  │                        │   Database    │                        │   │
//! │  │                        │   (pool.rs)   │                        │   │
//! │  │                        └───────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (VECINAL_DB_PATH, default ./vecinal.db)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - `UserDirectory` / `CouponStore` and their SQLite impls
//! - [`service`] - Coupon lifecycle operations
//! - [`config`] - Environment configuration
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vecinal_db::{Database, VecinalConfig};
//!
//! let config = VecinalConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let created = db
//!     .coupon_service()
//!     .generate_monthly(config.generation_options(Some(2025)))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, VecinalConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{CouponService, ErrorCode, ErrorResponse, ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::coupon::CouponRepository;
pub use repository::user::UserRepository;
pub use repository::{CouponStore, UserDirectory};
