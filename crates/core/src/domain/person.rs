use serde::{Deserialize, Serialize};

use crate::domain::fields::FieldId;
use crate::eligibility::normalize::FieldValue;

/// Externally assigned messenger user id. Stable, used as the primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub i64);

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Snapshot of one personnel row.
///
/// Date-bearing fields are already normalized; the engine only ever sees the
/// tagged union, never raw column text. The engine reads snapshots, it never
/// creates or persists them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person_id: PersonId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub rank: Option<String>,
    pub qualification: Option<String>,
    pub leave_start: FieldValue,
    pub leave_end: FieldValue,
    pub medical: FieldValue,
    pub secondary: FieldValue,
    pub kbp4_md_m: FieldValue,
    pub kbp7_md_m: FieldValue,
    pub kbp4_md90a: FieldValue,
    pub kbp7_md90a: FieldValue,
    pub parachute: FieldValue,
    pub onboarded: bool,
}

impl PersonRecord {
    /// Fresh row as created on first contact: identity only.
    pub fn new(person_id: PersonId, username: Option<String>) -> Self {
        Self {
            person_id,
            username,
            full_name: None,
            rank: None,
            qualification: None,
            leave_start: FieldValue::Missing,
            leave_end: FieldValue::Missing,
            medical: FieldValue::Missing,
            secondary: FieldValue::Missing,
            kbp4_md_m: FieldValue::Missing,
            kbp7_md_m: FieldValue::Missing,
            kbp4_md90a: FieldValue::Missing,
            kbp7_md90a: FieldValue::Missing,
            parachute: FieldValue::Missing,
            onboarded: false,
        }
    }

    pub fn text_field(&self, field: FieldId) -> Option<&str> {
        match field {
            FieldId::FullName => self.full_name.as_deref(),
            FieldId::Rank => self.rank.as_deref(),
            FieldId::Qualification => self.qualification.as_deref(),
            _ => None,
        }
    }

    pub fn date_field(&self, field: FieldId) -> Option<&FieldValue> {
        match field {
            FieldId::LeaveStart => Some(&self.leave_start),
            FieldId::LeaveEnd => Some(&self.leave_end),
            FieldId::Medical => Some(&self.medical),
            FieldId::Secondary => Some(&self.secondary),
            FieldId::Kbp4MdM => Some(&self.kbp4_md_m),
            FieldId::Kbp7MdM => Some(&self.kbp7_md_m),
            FieldId::Kbp4Md90a => Some(&self.kbp4_md90a),
            FieldId::Kbp7Md90a => Some(&self.kbp7_md90a),
            FieldId::Parachute => Some(&self.parachute),
            FieldId::FullName | FieldId::Rank | FieldId::Qualification => None,
        }
    }

    /// Apply one field write to the snapshot. Raw text goes through the same
    /// kind-aware normalization the store uses on read.
    pub fn set_field(&mut self, field: FieldId, raw: Option<&str>) {
        let owned = raw.map(str::trim).filter(|value| !value.is_empty()).map(str::to_owned);
        let kind = field.kind();
        match field {
            FieldId::FullName => self.full_name = owned,
            FieldId::Rank => self.rank = owned,
            FieldId::Qualification => self.qualification = owned,
            FieldId::LeaveStart => self.leave_start = FieldValue::from_raw_for(kind, raw),
            FieldId::LeaveEnd => self.leave_end = FieldValue::from_raw_for(kind, raw),
            FieldId::Medical => self.medical = FieldValue::from_raw_for(kind, raw),
            FieldId::Secondary => self.secondary = FieldValue::from_raw_for(kind, raw),
            FieldId::Kbp4MdM => self.kbp4_md_m = FieldValue::from_raw_for(kind, raw),
            FieldId::Kbp7MdM => self.kbp7_md_m = FieldValue::from_raw_for(kind, raw),
            FieldId::Kbp4Md90a => self.kbp4_md90a = FieldValue::from_raw_for(kind, raw),
            FieldId::Kbp7Md90a => self.kbp7_md90a = FieldValue::from_raw_for(kind, raw),
            FieldId::Parachute => self.parachute = FieldValue::from_raw_for(kind, raw),
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Не указано")
    }
}
