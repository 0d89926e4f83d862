use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::domain::person::{PersonId, PersonRecord};

use super::{
    AdminRepository, PersonnelRepository, ReferenceNote, ReferenceRepository, RepositoryError,
};

/// In-memory record store used by unit tests and handler tests.
#[derive(Default)]
pub struct InMemoryPersonnelRepository {
    records: RwLock<HashMap<i64, PersonRecord>>,
}

impl InMemoryPersonnelRepository {
    pub async fn insert(&self, record: PersonRecord) {
        self.records.write().await.insert(record.person_id.0, record);
    }
}

#[async_trait]
impl PersonnelRepository for InMemoryPersonnelRepository {
    async fn upsert_contact(
        &self,
        person_id: PersonId,
        username: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records
            .entry(person_id.0)
            .and_modify(|record| record.username = username.map(str::to_owned))
            .or_insert_with(|| PersonRecord::new(person_id, username.map(str::to_owned)));
        Ok(())
    }

    async fn find(&self, person_id: PersonId) -> Result<Option<PersonRecord>, RepositoryError> {
        Ok(self.records.read().await.get(&person_id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PersonRecord>, RepositoryError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            (a.full_name.as_deref(), a.person_id.0).cmp(&(b.full_name.as_deref(), b.person_id.0))
        });
        Ok(records)
    }

    async fn list_onboarded(&self) -> Result<Vec<PersonRecord>, RepositoryError> {
        Ok(self.list_all().await?.into_iter().filter(|record| record.onboarded).collect())
    }

    async fn update_field(
        &self,
        person_id: PersonId,
        field: FieldId,
        raw: &str,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&person_id.0) {
            record.set_field(field, Some(raw));
        }
        Ok(())
    }

    async fn set_onboarded(&self, person_id: PersonId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&person_id.0) {
            record.onboarded = true;
        }
        Ok(())
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<PersonRecord>, RepositoryError> {
        let needle = fragment.trim().to_lowercase();
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|record| {
                record
                    .full_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect())
    }

    async fn delete(&self, person_id: PersonId) -> Result<(), RepositoryError> {
        self.records.write().await.remove(&person_id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminRepository {
    admins: RwLock<Vec<i64>>,
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn add(&self, user_id: i64, _added_by: i64) -> Result<(), RepositoryError> {
        let mut admins = self.admins.write().await;
        if !admins.contains(&user_id) {
            admins.push(user_id);
        }
        Ok(())
    }

    async fn remove(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let mut admins = self.admins.write().await;
        let before = admins.len();
        admins.retain(|id| *id != user_id);
        Ok(admins.len() < before)
    }

    async fn list(&self) -> Result<Vec<i64>, RepositoryError> {
        Ok(self.admins.read().await.clone())
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, RepositoryError> {
        Ok(self.admins.read().await.contains(&user_id))
    }
}

#[derive(Default)]
pub struct InMemoryReferenceRepository {
    notes: RwLock<Vec<ReferenceNote>>,
}

#[async_trait]
impl ReferenceRepository for InMemoryReferenceRepository {
    async fn add_note(&self, keyword: &str, content: &str) -> Result<i64, RepositoryError> {
        let mut notes = self.notes.write().await;
        let id = notes.last().map_or(1, |note| note.id + 1);
        notes.push(ReferenceNote {
            id,
            keyword: keyword.trim().to_lowercase(),
            content: content.to_owned(),
        });
        Ok(id)
    }

    async fn remove_note(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        Ok(notes.len() < before)
    }

    async fn search(&self, query: &str) -> Result<Vec<ReferenceNote>, RepositoryError> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .notes
            .read()
            .await
            .iter()
            .filter(|note| note.keyword.contains(&needle))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crewdesk_core::domain::fields::FieldId;
    use crewdesk_core::domain::person::PersonId;

    use crate::repositories::{InMemoryPersonnelRepository, PersonnelRepository};

    #[tokio::test]
    async fn in_memory_store_round_trips_field_updates() {
        let repo = InMemoryPersonnelRepository::default();
        repo.upsert_contact(PersonId(5), Some("nav")).await.expect("upsert");
        repo.update_field(PersonId(5), FieldId::FullName, "Смирнов А. А.").await.expect("name");
        repo.update_field(PersonId(5), FieldId::Medical, "05.05.2025").await.expect("date");
        repo.set_onboarded(PersonId(5)).await.expect("flag");

        let record = repo.find(PersonId(5)).await.expect("find").expect("exists");
        assert!(record.onboarded);
        assert!(record.medical.date().is_some());

        let found = repo.search_by_name("смирнов").await.expect("search");
        assert_eq!(found.len(), 1);
    }
}
