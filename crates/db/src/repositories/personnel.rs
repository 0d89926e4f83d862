use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crewdesk_core::domain::fields::{FieldId, FieldKind};
use crewdesk_core::domain::person::{PersonId, PersonRecord};
use crewdesk_core::eligibility::normalize::FieldValue;

use super::{PersonnelRepository, RepositoryError};
use crate::DbPool;

const RECORD_COLUMNS: &str = "person_id, username, full_name, rank, qualification, \
     leave_start, leave_end, medical_date, secondary_date, \
     kbp4_md_m, kbp7_md_m, kbp4_md90a, kbp7_md90a, parachute_date, onboarded";

pub struct SqlPersonnelRepository {
    pool: DbPool,
}

impl SqlPersonnelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn date_value(row: &SqliteRow, field: FieldId) -> FieldValue {
    let raw: Option<String> = row.get(field.as_key());
    FieldValue::from_raw_for(field.kind(), raw.as_deref())
}

fn record_from_row(row: &SqliteRow) -> PersonRecord {
    PersonRecord {
        person_id: PersonId(row.get("person_id")),
        username: row.get("username"),
        full_name: row.get("full_name"),
        rank: row.get("rank"),
        qualification: row.get("qualification"),
        leave_start: date_value(row, FieldId::LeaveStart),
        leave_end: date_value(row, FieldId::LeaveEnd),
        medical: date_value(row, FieldId::Medical),
        secondary: date_value(row, FieldId::Secondary),
        kbp4_md_m: date_value(row, FieldId::Kbp4MdM),
        kbp7_md_m: date_value(row, FieldId::Kbp7MdM),
        kbp4_md90a: date_value(row, FieldId::Kbp4Md90a),
        kbp7_md90a: date_value(row, FieldId::Kbp7Md90a),
        parachute: date_value(row, FieldId::Parachute),
        onboarded: row.get::<i64, _>("onboarded") != 0,
    }
}

/// Canonical storage text for a field write. Date fields round-trip through
/// normalization so the column only ever holds the canonical date text, the
/// canonical sentinel spelling, or NULL.
fn storage_text(field: FieldId, raw: &str) -> Option<String> {
    match field.kind() {
        FieldKind::Text => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        FieldKind::Date | FieldKind::DateOrExempt => {
            FieldValue::from_raw_for(field.kind(), Some(raw)).to_raw()
        }
    }
}

#[async_trait]
impl PersonnelRepository for SqlPersonnelRepository {
    async fn upsert_contact(
        &self,
        person_id: PersonId,
        username: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO personnel (person_id, username) VALUES (?, ?) \
             ON CONFLICT (person_id) DO UPDATE SET username = excluded.username",
        )
        .bind(person_id.0)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, person_id: PersonId) -> Result<Option<PersonRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel WHERE person_id = ?"
        ))
        .bind(person_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn list_all(&self) -> Result<Vec<PersonRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel ORDER BY full_name, person_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn list_onboarded(&self) -> Result<Vec<PersonRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel WHERE onboarded = 1 \
             ORDER BY full_name, person_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn update_field(
        &self,
        person_id: PersonId,
        field: FieldId,
        raw: &str,
    ) -> Result<(), RepositoryError> {
        // The column name comes from the closed FieldId enum, never from
        // user input.
        let statement =
            format!("UPDATE personnel SET {} = ? WHERE person_id = ?", field.as_key());
        sqlx::query(&statement)
            .bind(storage_text(field, raw))
            .bind(person_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_onboarded(&self, person_id: PersonId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE personnel SET onboarded = 1 WHERE person_id = ?")
            .bind(person_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<PersonRecord>, RepositoryError> {
        let pattern = format!("%{}%", fragment.trim().to_lowercase());
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel \
             WHERE LOWER(full_name) LIKE ? ORDER BY full_name, person_id"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn delete(&self, person_id: PersonId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM personnel WHERE person_id = ?")
            .bind(person_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crewdesk_core::domain::fields::FieldId;
    use crewdesk_core::domain::person::PersonId;
    use crewdesk_core::eligibility::normalize::FieldValue;

    use crate::repositories::{PersonnelRepository, SqlPersonnelRepository};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlPersonnelRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlPersonnelRepository::new(pool)
    }

    #[tokio::test]
    async fn first_contact_creates_a_bare_row() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(1), Some("pilot")).await.expect("upsert");

        let record = repo.find(PersonId(1)).await.expect("find").expect("row exists");
        assert_eq!(record.username.as_deref(), Some("pilot"));
        assert!(!record.onboarded);
        assert!(record.medical.is_missing());
    }

    #[tokio::test]
    async fn upsert_refreshes_username_without_clobbering_fields() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(1), Some("old")).await.expect("upsert");
        repo.update_field(PersonId(1), FieldId::FullName, "Иванов И. И.").await.expect("update");
        repo.upsert_contact(PersonId(1), Some("new")).await.expect("re-upsert");

        let record = repo.find(PersonId(1)).await.expect("find").expect("row exists");
        assert_eq!(record.username.as_deref(), Some("new"));
        assert_eq!(record.full_name.as_deref(), Some("Иванов И. И."));
    }

    #[tokio::test]
    async fn date_fields_store_canonical_text_and_normalize_on_read() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(2), None).await.expect("upsert");

        repo.update_field(PersonId(2), FieldId::Medical, "01.02.2025").await.expect("date");
        repo.update_field(PersonId(2), FieldId::Parachute, "ОСВОБОЖДЁН").await.expect("exempt");
        repo.update_field(PersonId(2), FieldId::Secondary, "нет").await.expect("marker");
        repo.update_field(PersonId(2), FieldId::Kbp4MdM, "не дата").await.expect("garbage");

        let record = repo.find(PersonId(2)).await.expect("find").expect("row exists");
        assert!(record.medical.date().is_some());
        assert_eq!(record.parachute, FieldValue::Exempt);
        assert!(record.secondary.is_missing());
        assert!(record.kbp4_md_m.is_missing());
    }

    #[tokio::test]
    async fn onboarding_flag_gates_the_onboarded_listing() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(1), None).await.expect("upsert");
        repo.upsert_contact(PersonId(2), None).await.expect("upsert");
        repo.set_onboarded(PersonId(2)).await.expect("flag");

        assert_eq!(repo.list_all().await.expect("all").len(), 2);
        let onboarded = repo.list_onboarded().await.expect("onboarded");
        assert_eq!(onboarded.len(), 1);
        assert_eq!(onboarded[0].person_id, PersonId(2));
        assert!(onboarded[0].onboarded);
    }

    #[tokio::test]
    async fn search_matches_name_fragments_case_insensitively() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(1), None).await.expect("upsert");
        repo.update_field(PersonId(1), FieldId::FullName, "Петров Пётр Петрович")
            .await
            .expect("name");
        repo.upsert_contact(PersonId(2), None).await.expect("upsert");
        repo.update_field(PersonId(2), FieldId::FullName, "Сидоров Иван").await.expect("name");

        let found = repo.search_by_name("петров").await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].person_id, PersonId(1));
    }

    #[tokio::test]
    async fn delete_removes_the_whole_row() {
        let repo = repo().await;
        repo.upsert_contact(PersonId(9), None).await.expect("upsert");
        repo.delete(PersonId(9)).await.expect("delete");
        assert!(repo.find(PersonId(9)).await.expect("find").is_none());
    }
}
