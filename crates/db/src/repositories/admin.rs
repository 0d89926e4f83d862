use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::{AdminRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAdminRepository {
    pool: DbPool,
}

impl SqlAdminRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for SqlAdminRepository {
    async fn add(&self, user_id: i64, added_by: i64) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO admins (user_id, added_by, added_at) VALUES (?, ?, ?) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(added_by)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<i64>, RepositoryError> {
        let rows = sqlx::query("SELECT user_id FROM admins ORDER BY added_at, user_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::{AdminRepository, SqlAdminRepository};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlAdminRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlAdminRepository::new(pool)
    }

    #[tokio::test]
    async fn grant_and_revoke_round_trip() {
        let repo = repo().await;
        repo.add(100, 1).await.expect("add");
        assert!(repo.is_admin(100).await.expect("check"));
        assert_eq!(repo.list().await.expect("list"), vec![100]);

        assert!(repo.remove(100).await.expect("remove"));
        assert!(!repo.is_admin(100).await.expect("check"));
        assert!(!repo.remove(100).await.expect("second remove is a no-op"));
    }

    #[tokio::test]
    async fn re_adding_an_admin_is_idempotent() {
        let repo = repo().await;
        repo.add(100, 1).await.expect("add");
        repo.add(100, 2).await.expect("re-add");
        assert_eq!(repo.list().await.expect("list").len(), 1);
    }
}
