use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::fields::FieldKind;

/// Wire format for every date field the bot collects.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Spellings of the exemption sentinel accepted from chat input. The set is
/// fixed; matching is case-insensitive, never fuzzy.
pub const EXEMPT_MARKERS: &[&str] = &["освобожден", "освобождён", "осв"];

/// Explicit "not done" markers that normalize to `Missing`.
pub const MISSING_MARKERS: &[&str] = &["нет", "не пройдено", "б/к"];

/// Normalized value of a single date-bearing record field.
///
/// Raw chat input is total-function normalized: anything that is not a
/// `DD.MM.YYYY` date or a recognized exemption spelling becomes `Missing`.
/// Bad input degrades to "no data", it never surfaces as an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    #[default]
    Missing,
    Exempt,
    OnDate(NaiveDate),
}

impl FieldValue {
    /// Normalize a raw stored or typed value. Absent and unparseable input
    /// both map to `Missing`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }

        let lowered = trimmed.to_lowercase();
        if EXEMPT_MARKERS.contains(&lowered.as_str()) {
            return Self::Exempt;
        }
        if MISSING_MARKERS.contains(&lowered.as_str()) {
            return Self::Missing;
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_or(Self::Missing, Self::OnDate)
    }

    /// Normalize honoring the field's kind: the exemption sentinel is only
    /// valid on fields declared [`FieldKind::DateOrExempt`]; on a plain date
    /// field it degrades to `Missing` like any other non-date text.
    pub fn from_raw_for(kind: FieldKind, raw: Option<&str>) -> Self {
        match (kind, Self::from_raw(raw)) {
            (FieldKind::Date, Self::Exempt) => Self::Missing,
            (_, value) => value,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::OnDate(date)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self, Self::Exempt)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::OnDate(date) => Some(*date),
            Self::Missing | Self::Exempt => None,
        }
    }

    /// Canonical storage text. `None` means the column stays NULL.
    pub fn to_raw(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Exempt => Some(EXEMPT_MARKERS[0].to_owned()),
            Self::OnDate(date) => Some(date.format(DATE_FORMAT).to_string()),
        }
    }
}
