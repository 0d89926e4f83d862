use async_trait::async_trait;
use thiserror::Error;

use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::domain::person::{PersonId, PersonRecord};

pub mod admin;
pub mod memory;
pub mod personnel;
pub mod reference;

pub use admin::SqlAdminRepository;
pub use memory::{
    InMemoryAdminRepository, InMemoryPersonnelRepository, InMemoryReferenceRepository,
};
pub use personnel::SqlPersonnelRepository;
pub use reference::{ReferenceNote, SqlReferenceRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The record store: point lookup, full scan, single-field update. Field
/// identity is the closed [`FieldId`] enum, so unknown-field rejection has
/// already happened by the time a call reaches a repository.
#[async_trait]
pub trait PersonnelRepository: Send + Sync {
    /// Create the row on first contact, or refresh the username.
    async fn upsert_contact(
        &self,
        person_id: PersonId,
        username: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn find(&self, person_id: PersonId) -> Result<Option<PersonRecord>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<PersonRecord>, RepositoryError>;

    /// Only rows that completed onboarding; the set listings and reminders
    /// operate on.
    async fn list_onboarded(&self) -> Result<Vec<PersonRecord>, RepositoryError>;

    async fn update_field(
        &self,
        person_id: PersonId,
        field: FieldId,
        raw: &str,
    ) -> Result<(), RepositoryError>;

    /// One-way flag set by the final onboarding step.
    async fn set_onboarded(&self, person_id: PersonId) -> Result<(), RepositoryError>;

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<PersonRecord>, RepositoryError>;

    /// Deletion is whole-row only; records are never partially removed.
    async fn delete(&self, person_id: PersonId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn add(&self, user_id: i64, added_by: i64) -> Result<(), RepositoryError>;
    async fn remove(&self, user_id: i64) -> Result<bool, RepositoryError>;
    async fn list(&self) -> Result<Vec<i64>, RepositoryError>;
    async fn is_admin(&self, user_id: i64) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn add_note(&self, keyword: &str, content: &str) -> Result<i64, RepositoryError>;
    async fn remove_note(&self, id: i64) -> Result<bool, RepositoryError>;
    async fn search(&self, query: &str) -> Result<Vec<ReferenceNote>, RepositoryError>;
}
