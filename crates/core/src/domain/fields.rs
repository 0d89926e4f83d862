use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Closed set of editable record fields.
///
/// Field keys arriving from the wire (callback payloads, edit commands) are
/// resolved through [`FieldId::from_key`]; unknown keys are rejected at the
/// boundary instead of ever reaching a query string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    FullName,
    Rank,
    Qualification,
    LeaveStart,
    LeaveEnd,
    Medical,
    Secondary,
    Kbp4MdM,
    Kbp7MdM,
    Kbp4Md90a,
    Kbp7Md90a,
    Parachute,
}

/// How a field's stored value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text (identity fields).
    Text,
    /// `DD.MM.YYYY` date.
    Date,
    /// `DD.MM.YYYY` date or the exemption sentinel.
    DateOrExempt,
}

impl FieldId {
    /// Report order: identity first, leave, medical pair, the КБП checks,
    /// parachute last. Ban-list order is this order filtered to banning
    /// fields, so downstream output is deterministic.
    pub const ALL: [FieldId; 12] = [
        FieldId::FullName,
        FieldId::Rank,
        FieldId::Qualification,
        FieldId::LeaveStart,
        FieldId::LeaveEnd,
        FieldId::Medical,
        FieldId::Secondary,
        FieldId::Kbp4MdM,
        FieldId::Kbp7MdM,
        FieldId::Kbp4Md90a,
        FieldId::Kbp7Md90a,
        FieldId::Parachute,
    ];

    /// Stable wire key; doubles as the storage column name.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Rank => "rank",
            Self::Qualification => "qualification",
            Self::LeaveStart => "leave_start",
            Self::LeaveEnd => "leave_end",
            Self::Medical => "medical_date",
            Self::Secondary => "secondary_date",
            Self::Kbp4MdM => "kbp4_md_m",
            Self::Kbp7MdM => "kbp7_md_m",
            Self::Kbp4Md90a => "kbp4_md90a",
            Self::Kbp7Md90a => "kbp7_md90a",
            Self::Parachute => "parachute_date",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_key() == key)
            .ok_or_else(|| DomainError::UnknownField { key: key.to_owned() })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "ФИО",
            Self::Rank => "Звание",
            Self::Qualification => "Квалификационный разряд",
            Self::LeaveStart => "Отпуск (начало)",
            Self::LeaveEnd => "Отпуск (конец)",
            Self::Medical => "ВЛК",
            Self::Secondary => "УМО",
            Self::Kbp4MdM => "КБП-4 (Ил-76 МД-М)",
            Self::Kbp7MdM => "КБП-7 (Ил-76 МД-М)",
            Self::Kbp4Md90a => "КБП-4 (Ил-76 МД-90А)",
            Self::Kbp7Md90a => "КБП-7 (Ил-76 МД-90А)",
            Self::Parachute => "Прыжки с ПДС",
        }
    }

    /// Input hint shown when the field is edited.
    pub fn input_hint(&self) -> &'static str {
        match self.kind() {
            FieldKind::Text => "текст",
            FieldKind::Date => "ДД.ММ.ГГГГ",
            FieldKind::DateOrExempt => "ДД.ММ.ГГГГ или «освобожден»",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::FullName | Self::Rank | Self::Qualification => FieldKind::Text,
            Self::LeaveStart
            | Self::LeaveEnd
            | Self::Medical
            | Self::Kbp4MdM
            | Self::Kbp7MdM
            | Self::Kbp4Md90a
            | Self::Kbp7Md90a => FieldKind::Date,
            Self::Secondary | Self::Parachute => FieldKind::DateOrExempt,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind(), FieldKind::Text)
    }
}
