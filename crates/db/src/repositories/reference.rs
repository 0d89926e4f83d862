use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use super::{ReferenceRepository, RepositoryError};
use crate::DbPool;

/// One entry of the "useful information" base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceNote {
    pub id: i64,
    pub keyword: String,
    pub content: String,
}

fn note_from_row(row: &SqliteRow) -> ReferenceNote {
    ReferenceNote {
        id: row.get("id"),
        keyword: row.get("keyword"),
        content: row.get("content"),
    }
}

pub struct SqlReferenceRepository {
    pool: DbPool,
}

impl SqlReferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for SqlReferenceRepository {
    async fn add_note(&self, keyword: &str, content: &str) -> Result<i64, RepositoryError> {
        let result = sqlx::query("INSERT INTO reference_notes (keyword, content) VALUES (?, ?)")
            .bind(keyword.trim().to_lowercase())
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn remove_note(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reference_notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &str) -> Result<Vec<ReferenceNote>, RepositoryError> {
        let pattern = format!("%{}%", query.trim().to_lowercase());
        let rows = sqlx::query(
            "SELECT id, keyword, content FROM reference_notes \
             WHERE keyword LIKE ? ORDER BY keyword, id",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(note_from_row).collect())
    }
}
