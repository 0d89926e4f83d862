use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::eligibility::normalize::FieldValue;

/// Months are a fixed 30 days everywhere. Calendar-accurate month arithmetic
/// would shift window boundaries between fields; the approximation is part of
/// the contract.
pub const MONTH_DAYS: i64 = 30;

/// Days of remaining validity below which a field turns into a warning.
pub const WARNING_DAYS: i64 = 30;

/// The medical clearance (ВЛК) window. Also the anchor length for the
/// dependent secondary check, so it stays 365 rather than 12 * 30.
pub const MEDICAL_WINDOW_DAYS: i64 = 365;

/// Age of the medical clearance past which the secondary check (УМО)
/// becomes mandatory.
pub const SECONDARY_TRIGGER_DAYS: i64 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Expired,
    Exempt,
    Unknown,
}

impl Severity {
    /// Status symbol used by the terse list-view summary.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Ok => "🟢",
            Self::Warning => "🟡",
            Self::Expired => "🔴",
            Self::Exempt => "⚪",
            Self::Unknown => "⚫",
        }
    }

    pub fn is_banning(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Validity window of a recurring field, in whole months.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityWindow {
    months: u32,
}

impl ValidityWindow {
    /// Windows are internal constants, never user input; a zero window is a
    /// programming error and panics at construction.
    pub fn months(months: u32) -> Self {
        assert!(months > 0, "validity window must be at least one month");
        Self { months }
    }

    pub fn days(&self) -> i64 {
        i64::from(self.months) * MONTH_DAYS
    }
}

/// Outcome of classifying one field.
///
/// `days_remaining` is the raw signed delta (negative = overdue) the reminder
/// scheduler matches against its checkpoints; `None` when no date anchors the
/// field (missing, exempt, or a mandatory check that was never done).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldStatus {
    pub severity: Severity,
    pub days_remaining: Option<i64>,
    pub message: String,
}

impl FieldStatus {
    fn unknown() -> Self {
        Self { severity: Severity::Unknown, days_remaining: None, message: "нет данных".to_owned() }
    }

    fn exempt() -> Self {
        Self { severity: Severity::Exempt, days_remaining: None, message: "освобожден".to_owned() }
    }

    fn from_remaining(remaining: i64) -> Self {
        if remaining <= 0 {
            Self {
                severity: Severity::Expired,
                days_remaining: Some(remaining),
                message: format!("просрочено на {} дн.", -remaining),
            }
        } else if remaining < WARNING_DAYS {
            Self {
                severity: Severity::Warning,
                days_remaining: Some(remaining),
                message: format!("осталось {remaining} дн."),
            }
        } else {
            Self {
                severity: Severity::Ok,
                days_remaining: Some(remaining),
                message: format!("действует (осталось {remaining} дн.)"),
            }
        }
    }
}

fn elapsed_days(completed: NaiveDate, today: NaiveDate) -> i64 {
    (today - completed).num_days()
}

/// Generic per-field rule: remaining validity against the field's own window.
/// Future-dated completions yield a negative elapsed time and classify `Ok`.
pub fn classify_window(value: &FieldValue, window: ValidityWindow, today: NaiveDate) -> FieldStatus {
    match value {
        FieldValue::Missing => FieldStatus::unknown(),
        FieldValue::Exempt => FieldStatus::exempt(),
        FieldValue::OnDate(date) => {
            FieldStatus::from_remaining(window.days() - elapsed_days(*date, today))
        }
    }
}

/// The medical clearance classifies against its 365-day window, matching the
/// thresholds of the dependency rule below.
pub fn classify_medical(medical: &FieldValue, today: NaiveDate) -> FieldStatus {
    match medical {
        FieldValue::Missing | FieldValue::Exempt => FieldStatus::unknown(),
        FieldValue::OnDate(date) => {
            FieldStatus::from_remaining(MEDICAL_WINDOW_DAYS - elapsed_days(*date, today))
        }
    }
}

/// Dependency rule for the secondary check (УМО).
///
/// The secondary check is never evaluated against its own date. It becomes
/// mandatory once the medical clearance is older than 180 days, and its
/// validity is anchored at `medical_date + 365`:
///
/// - no medical date: nothing to anchor on, status is unknown;
/// - an exemption on the secondary check always wins;
/// - medical expired (>= 365 days): a dated secondary check inherits the
///   expiry, an absent one remains unknown (the medical ban already blocks
///   duty);
/// - 180 < elapsed < 365: an absent secondary check is a hard block, a dated
///   one classifies against the anchor;
/// - elapsed <= 180: not yet required, remaining days count to the trigger.
pub fn classify_secondary(
    medical: &FieldValue,
    secondary: &FieldValue,
    today: NaiveDate,
) -> FieldStatus {
    let Some(medical_date) = medical.date() else {
        return FieldStatus::unknown();
    };
    if secondary.is_exempt() {
        return FieldStatus::exempt();
    }

    let elapsed = elapsed_days(medical_date, today);
    let anchor_remaining = MEDICAL_WINDOW_DAYS - elapsed;

    if elapsed >= MEDICAL_WINDOW_DAYS {
        match secondary {
            FieldValue::OnDate(_) => FieldStatus {
                severity: Severity::Expired,
                days_remaining: Some(anchor_remaining),
                message: format!("просрочено на {} дн. (вместе с ВЛК)", -anchor_remaining),
            },
            FieldValue::Missing | FieldValue::Exempt => FieldStatus::unknown(),
        }
    } else if elapsed > SECONDARY_TRIGGER_DAYS {
        match secondary {
            FieldValue::Missing | FieldValue::Exempt => FieldStatus {
                severity: Severity::Expired,
                days_remaining: None,
                message: "обязательно после 6 мес. с ВЛК — не пройдено".to_owned(),
            },
            FieldValue::OnDate(_) => FieldStatus::from_remaining(anchor_remaining),
        }
    } else {
        FieldStatus {
            severity: Severity::Ok,
            days_remaining: Some(SECONDARY_TRIGGER_DAYS - elapsed),
            message: format!("не требуется (ещё {} дн.)", SECONDARY_TRIGGER_DAYS - elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{
        classify_medical, classify_secondary, classify_window, FieldValue, Severity,
        ValidityWindow,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid test date")
    }

    fn dated(days_ago: i64) -> FieldValue {
        FieldValue::OnDate(today() - Duration::days(days_ago))
    }

    #[test]
    fn missing_is_unknown_regardless_of_window() {
        for months in [6, 12] {
            let status =
                classify_window(&FieldValue::Missing, ValidityWindow::months(months), today());
            assert_eq!(status.severity, Severity::Unknown);
            assert_eq!(status.days_remaining, None);
        }
    }

    #[test]
    fn exempt_never_expires() {
        let status = classify_window(&FieldValue::Exempt, ValidityWindow::months(12), today());
        assert_eq!(status.severity, Severity::Exempt);
    }

    #[test]
    fn expiry_boundary_is_expired_not_ok() {
        let window = ValidityWindow::months(6);
        let status = classify_window(&dated(window.days()), window, today());
        assert_eq!(status.severity, Severity::Expired);
        assert_eq!(status.days_remaining, Some(0));
    }

    #[test]
    fn one_day_past_boundary_is_expired_with_overdue_count() {
        let window = ValidityWindow::months(6);
        let status = classify_window(&dated(window.days() + 1), window, today());
        assert_eq!(status.severity, Severity::Expired);
        assert_eq!(status.days_remaining, Some(-1));
        assert!(status.message.contains("1 дн."));
    }

    #[test]
    fn warning_band_is_exactly_the_last_29_days() {
        let window = ValidityWindow::months(6);
        assert_eq!(classify_window(&dated(window.days() - 29), window, today()).severity, Severity::Warning);
        assert_eq!(classify_window(&dated(window.days() - 30), window, today()).severity, Severity::Ok);
        assert_eq!(classify_window(&dated(window.days() - 31), window, today()).severity, Severity::Ok);
    }

    #[test]
    fn future_dates_classify_ok() {
        let window = ValidityWindow::months(12);
        let status = classify_window(&dated(-10), window, today());
        assert_eq!(status.severity, Severity::Ok);
        assert_eq!(status.days_remaining, Some(window.days() + 10));
    }

    #[test]
    #[should_panic(expected = "validity window")]
    fn zero_window_panics_at_construction() {
        let _ = ValidityWindow::months(0);
    }

    #[test]
    fn medical_uses_the_365_day_window() {
        assert_eq!(classify_medical(&dated(365), today()).severity, Severity::Expired);
        assert_eq!(classify_medical(&dated(364), today()).severity, Severity::Warning);
        assert_eq!(classify_medical(&dated(300), today()).severity, Severity::Ok);
        assert_eq!(classify_medical(&FieldValue::Missing, today()).severity, Severity::Unknown);
    }

    #[test]
    fn secondary_unknown_when_medical_missing() {
        let status = classify_secondary(&FieldValue::Missing, &dated(10), today());
        assert_eq!(status.severity, Severity::Unknown);
    }

    #[test]
    fn secondary_not_yet_required_inside_trigger_window() {
        let status = classify_secondary(&dated(100), &FieldValue::Missing, today());
        assert_eq!(status.severity, Severity::Ok);
        assert_eq!(status.days_remaining, Some(80));
    }

    #[test]
    fn missing_secondary_blocks_once_mandatory() {
        let status = classify_secondary(&dated(200), &FieldValue::Missing, today());
        assert_eq!(status.severity, Severity::Expired);
        assert_eq!(status.days_remaining, None);
        assert!(status.message.contains("не пройдено"));
    }

    #[test]
    fn completed_secondary_is_anchored_to_the_medical_date() {
        // Medical 200 days old: anchor sits 165 days out, regardless of how
        // recently the secondary check itself was completed.
        let status = classify_secondary(&dated(200), &dated(10), today());
        assert_eq!(status.severity, Severity::Ok);
        assert_eq!(status.days_remaining, Some(165));

        let status = classify_secondary(&dated(340), &dated(10), today());
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.days_remaining, Some(25));
    }

    #[test]
    fn dated_secondary_inherits_expired_medical() {
        let status = classify_secondary(&dated(400), &dated(10), today());
        assert_eq!(status.severity, Severity::Expired);
        assert_eq!(status.days_remaining, Some(-35));
    }

    #[test]
    fn absent_secondary_stays_unknown_past_expired_medical() {
        let status = classify_secondary(&dated(400), &FieldValue::Missing, today());
        assert_eq!(status.severity, Severity::Unknown);
    }

    #[test]
    fn exempt_secondary_wins_in_every_band() {
        for medical_age in [100, 200, 400] {
            let status = classify_secondary(&dated(medical_age), &FieldValue::Exempt, today());
            assert_eq!(status.severity, Severity::Exempt, "medical age {medical_age}");
        }
    }
}
