//! # User Repository
//!
//! SQLite-backed user directory. Users are owned by the identity module;
//! `insert` exists for seeding and tests.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::UserDirectory;
use crate::error::DbResult;
use vecinal_core::User;

/// Repository for user directory lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, rut, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.rut)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts users with a role.
    pub async fn count_by_role(&self, role: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, rut, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_role(&self, role: &str) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, rut, role, created_at
            FROM users
            WHERE role = ?1
            ORDER BY full_name
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        debug!(role = %role, count = users.len(), "Loaded users by role");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    fn user(id: &str, name: &str, role: &str) -> User {
        User {
            id: id.to_string(),
            full_name: name.to_string(),
            email: format!("{}@example.cl", id),
            rut: format!("rut-{}", id),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&user("u1", "Berta Soto", "vecino")).await.unwrap();
        repo.insert(&user("u2", "Ana Rojas", "vecino")).await.unwrap();
        repo.insert(&user("u3", "Carla Díaz", "administrador")).await.unwrap();

        let found = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(found.full_name, "Berta Soto");
        assert!(repo.find_by_id("missing").await.unwrap().is_none());

        let vecinos = repo.find_by_role("vecino").await.unwrap();
        let names: Vec<_> = vecinos.iter().map(|u| u.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Rojas", "Berta Soto"]);

        assert_eq!(repo.count_by_role("vecino").await.unwrap(), 2);
        assert_eq!(repo.count_by_role("administrador").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&user("u1", "Ana", "vecino")).await.unwrap();
        let mut dup = user("u2", "Ana bis", "vecino");
        dup.email = "u1@example.cl".to_string();

        let err = repo.insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
