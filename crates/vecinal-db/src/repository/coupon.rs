//! # Coupon Repository
//!
//! Database operations for payment coupons.
//!
//! ## Monthly Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UNIQUE INDEX idx_coupons_monthly_period                               │
//! │      ON coupons(vecino_id, month, year) WHERE coupon_type = 'mensual'  │
//! │                                                                         │
//! │  insert()        → second monthly coupon fails with UniqueViolation    │
//! │  insert_batch()  → conflicting rows are skipped (ON CONFLICT DO NOTHING)│
//! │                    inside one transaction                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::debug;

use super::CouponStore;
use crate::error::{DbError, DbResult};
use vecinal_core::{Coupon, CouponStatus, CouponWithVecino, VecinoSummary};

const SELECT_WITH_VECINO: &str = r#"
    SELECT
        c.id,
        c.vecino_id,
        c.month,
        c.year,
        c.coupon_type,
        c.amount,
        c.discount_amount,
        c.description,
        c.due_date,
        c.status,
        c.commitment_date,
        c.created_at,
        c.updated_at,
        u.full_name AS vecino_full_name,
        u.email AS vecino_email,
        u.rut AS vecino_rut
    FROM coupons c
    INNER JOIN users u ON u.id = c.vecino_id
"#;

const INSERT_COUPON: &str = r#"
    INSERT INTO coupons (
        id, vecino_id, month, year, coupon_type,
        amount, discount_amount, description,
        due_date, status, commitment_date,
        created_at, updated_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5,
        ?6, ?7, ?8,
        ?9, ?10, ?11,
        ?12, ?13
    )
"#;

/// Repository for coupon database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CouponRepository::new(pool);
///
/// let march = repo.find_by_period(&vecino_id, 3, 2025, "mensual").await?;
/// let paid = repo.list(Some(CouponStatus::Paid)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Counts all coupons.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Binds every coupon column in `INSERT_COUPON` order.
fn bind_insert<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    coupon: &'q Coupon,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&coupon.id)
        .bind(&coupon.vecino_id)
        .bind(coupon.month)
        .bind(coupon.year)
        .bind(&coupon.coupon_type)
        .bind(coupon.amount)
        .bind(coupon.discount_amount)
        .bind(&coupon.description)
        .bind(coupon.due_date)
        .bind(coupon.status)
        .bind(coupon.commitment_date)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
}

fn map_with_vecino(row: &SqliteRow) -> Result<CouponWithVecino, sqlx::Error> {
    let coupon = Coupon::from_row(row)?;
    let vecino = VecinoSummary {
        id: coupon.vecino_id.clone(),
        full_name: row.try_get("vecino_full_name")?,
        email: row.try_get("vecino_email")?,
        rut: row.try_get("vecino_rut")?,
    };
    Ok(CouponWithVecino { coupon, vecino })
}

#[async_trait]
impl CouponStore for CouponRepository {
    async fn find_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    async fn find_by_period(
        &self,
        vecino_id: &str,
        month: u32,
        year: i32,
        coupon_type: &str,
    ) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT * FROM coupons
            WHERE vecino_id = ?1 AND month = ?2 AND year = ?3 AND coupon_type = ?4
            LIMIT 1
            "#,
        )
        .bind(vecino_id)
        .bind(month)
        .bind(year)
        .bind(coupon_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    async fn list(&self, status: Option<CouponStatus>) -> DbResult<Vec<CouponWithVecino>> {
        debug!(status = ?status, "Listing coupons");

        let sql = format!(
            "{} WHERE (?1 IS NULL OR c.status = ?1) ORDER BY c.year DESC, c.month DESC, u.full_name",
            SELECT_WITH_VECINO
        );

        let rows = sqlx::query(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        let coupons = rows
            .iter()
            .map(map_with_vecino)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = coupons.len(), "Listed coupons");
        Ok(coupons)
    }

    async fn list_by_vecino(&self, vecino_id: &str) -> DbResult<Vec<CouponWithVecino>> {
        let sql = format!(
            "{} WHERE c.vecino_id = ?1 ORDER BY c.year DESC, c.month DESC",
            SELECT_WITH_VECINO
        );

        let rows = sqlx::query(&sql)
            .bind(vecino_id)
            .fetch_all(&self.pool)
            .await?;

        let coupons = rows
            .iter()
            .map(map_with_vecino)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(coupons)
    }

    async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(
            id = %coupon.id,
            vecino_id = %coupon.vecino_id,
            month = coupon.month,
            year = coupon.year,
            "Inserting coupon"
        );

        bind_insert(sqlx::query(INSERT_COUPON), coupon)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_batch(&self, coupons: Vec<Coupon>) -> DbResult<Vec<Coupon>> {
        if coupons.is_empty() {
            return Ok(coupons);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sql = format!("{} ON CONFLICT DO NOTHING", INSERT_COUPON);
        let mut inserted = Vec::with_capacity(coupons.len());

        for coupon in coupons {
            let result = bind_insert(sqlx::query(&sql), &coupon)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 1 {
                inserted.push(coupon);
            } else {
                debug!(
                    vecino_id = %coupon.vecino_id,
                    month = coupon.month,
                    year = coupon.year,
                    "Coupon period already taken, skipped"
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = inserted.len(), "Inserted coupon batch");
        Ok(inserted)
    }

    async fn update(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, "Updating coupon");

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                vecino_id = ?2,
                month = ?3,
                year = ?4,
                coupon_type = ?5,
                amount = ?6,
                discount_amount = ?7,
                description = ?8,
                due_date = ?9,
                status = ?10,
                commitment_date = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.vecino_id)
        .bind(coupon.month)
        .bind(coupon.year)
        .bind(&coupon.coupon_type)
        .bind(coupon.amount)
        .bind(coupon.discount_amount)
        .bind(&coupon.description)
        .bind(coupon.due_date)
        .bind(coupon.status)
        .bind(coupon.commitment_date)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", &coupon.id));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting coupon");

        let result = sqlx::query("DELETE FROM coupons WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use vecinal_core::coupon::build_monthly_coupon;
    use vecinal_core::{GenerationOptions, User};

    async fn setup() -> (Database, CouponRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (id, name) in [("v1", "Ana Rojas"), ("v2", "Berta Soto")] {
            db.users()
                .insert(&User {
                    id: id.to_string(),
                    full_name: name.to_string(),
                    email: format!("{}@example.cl", id),
                    rut: format!("rut-{}", id),
                    role: "vecino".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let repo = db.coupons();
        (db, repo)
    }

    fn monthly(vecino: &str, month: u32, year: i32) -> Coupon {
        build_monthly_coupon(vecino, month, year, &GenerationOptions::for_year(year), Utc::now())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (_db, repo) = setup().await;
        let coupon = monthly("v1", 3, 2025);
        repo.insert(&coupon).await.unwrap();

        let found = repo.find_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(found, coupon);

        let by_period = repo
            .find_by_period("v1", 3, 2025, "mensual")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_period.id, coupon.id);

        assert!(repo.find_by_period("v1", 4, 2025, "mensual").await.unwrap().is_none());
        assert!(repo.find_by_period("v2", 3, 2025, "mensual").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_monthly_coupon_violates_unique_index() {
        let (_db, repo) = setup().await;
        repo.insert(&monthly("v1", 5, 2025)).await.unwrap();

        let err = repo.insert(&monthly("v1", 5, 2025)).await.unwrap_err();
        assert!(err.is_coupon_period_conflict(), "got {err:?}");

        // ad-hoc types are not restricted
        let mut extra = monthly("v1", 5, 2025);
        extra.coupon_type = "extraordinaria".to_string();
        repo.insert(&extra).await.unwrap();
        let mut extra2 = monthly("v1", 5, 2025);
        extra2.coupon_type = "extraordinaria".to_string();
        repo.insert(&extra2).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_vecino_violates_foreign_key() {
        let (_db, repo) = setup().await;
        let err = repo.insert(&monthly("ghost", 1, 2025)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_by_period_desc_and_filters() {
        let (_db, repo) = setup().await;
        repo.insert(&monthly("v1", 2, 2024)).await.unwrap();
        repo.insert(&monthly("v1", 11, 2025)).await.unwrap();
        let mut paid = monthly("v2", 6, 2025);
        paid.status = CouponStatus::Paid;
        repo.insert(&paid).await.unwrap();

        let all = repo.list(None).await.unwrap();
        let periods: Vec<_> = all.iter().map(|c| (c.coupon.year, c.coupon.month)).collect();
        assert_eq!(periods, vec![(2025, 11), (2025, 6), (2024, 2)]);
        assert_eq!(all[1].vecino.full_name, "Berta Soto");
        assert_eq!(all[0].vecino.rut, "rut-v1");

        let only_paid = repo.list(Some(CouponStatus::Paid)).await.unwrap();
        assert_eq!(only_paid.len(), 1);
        assert_eq!(only_paid[0].coupon.id, paid.id);

        assert!(repo.list(Some(CouponStatus::Hidden)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_vecino() {
        let (_db, repo) = setup().await;
        repo.insert(&monthly("v1", 1, 2025)).await.unwrap();
        repo.insert(&monthly("v1", 2, 2025)).await.unwrap();
        repo.insert(&monthly("v2", 1, 2025)).await.unwrap();

        let mine = repo.list_by_vecino("v1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.vecino.id == "v1"));
        assert_eq!(mine[0].coupon.month, 2);
    }

    #[tokio::test]
    async fn test_insert_batch_skips_taken_periods() {
        let (_db, repo) = setup().await;
        let existing = monthly("v1", 1, 2025);
        repo.insert(&existing).await.unwrap();

        let batch = vec![monthly("v1", 1, 2025), monthly("v1", 2, 2025), monthly("v2", 1, 2025)];
        let inserted = repo.insert_batch(batch).await.unwrap();

        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|c| !(c.vecino_id == "v1" && c.month == 1)));
        assert_eq!(repo.count().await.unwrap(), 3);

        assert!(repo.insert_batch(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_db, repo) = setup().await;
        let mut coupon = monthly("v1", 7, 2025);
        repo.insert(&coupon).await.unwrap();

        coupon.status = CouponStatus::Hidden;
        coupon.vecino_id = "v2".to_string();
        repo.update(&coupon).await.unwrap();

        let stored = repo.find_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CouponStatus::Hidden);
        assert_eq!(stored.vecino_id, "v2");

        assert!(repo.delete(&coupon.id).await.unwrap());
        assert!(!repo.delete(&coupon.id).await.unwrap());
        assert!(repo.find_by_id(&coupon.id).await.unwrap().is_none());

        let err = repo.update(&coupon).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
