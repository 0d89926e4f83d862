use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::fields::FieldId;
use crate::domain::person::PersonRecord;
use crate::eligibility::classify::{
    classify_medical, classify_secondary, classify_window, FieldStatus, Severity, ValidityWindow,
};
use crate::eligibility::normalize::FieldValue;

/// One line of the status report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub field: FieldId,
    pub label: &'static str,
    pub severity: Severity,
    /// Date text, the exemption label, the no-data label, or identity text.
    pub display: String,
    pub message: String,
    /// Raw signed day delta for the reminder checkpoints; negative = overdue.
    pub days_remaining: Option<i64>,
    /// Whether the field participates in ban aggregation and the terse
    /// summary (identity and leave-start rows are display-only).
    pub classified: bool,
}

/// Result of the single classification pass over one record.
///
/// The full profile, the terse list-view summary, and the ban list are all
/// derived from the same rows; nothing downstream re-runs classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    today: NaiveDate,
    rows: Vec<ReportRow>,
}

fn window_for(field: FieldId) -> Option<ValidityWindow> {
    match field {
        FieldId::LeaveEnd | FieldId::Kbp7MdM | FieldId::Kbp7Md90a | FieldId::Parachute => {
            Some(ValidityWindow::months(12))
        }
        FieldId::Kbp4MdM | FieldId::Kbp4Md90a => Some(ValidityWindow::months(6)),
        _ => None,
    }
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Missing => "нет данных".to_owned(),
        FieldValue::Exempt => "освобожден".to_owned(),
        FieldValue::OnDate(date) => date.format(crate::eligibility::normalize::DATE_FORMAT).to_string(),
    }
}

fn identity_row(field: FieldId, value: Option<&str>) -> ReportRow {
    let severity = if value.is_some() { Severity::Ok } else { Severity::Unknown };
    ReportRow {
        field,
        label: field.label(),
        severity,
        display: value.unwrap_or("Не указано").to_owned(),
        message: String::new(),
        days_remaining: None,
        classified: false,
    }
}

fn status_row(field: FieldId, value: &FieldValue, status: FieldStatus, classified: bool) -> ReportRow {
    ReportRow {
        field,
        label: field.label(),
        severity: status.severity,
        display: display_value(value),
        message: status.message,
        days_remaining: status.days_remaining,
        classified,
    }
}

impl Evaluation {
    /// Run the classification pass. `today` is captured by the caller once
    /// and threaded through every rule so a report stays internally
    /// consistent across a day boundary.
    pub fn evaluate(record: &PersonRecord, today: NaiveDate) -> Self {
        let mut rows = Vec::with_capacity(FieldId::ALL.len());

        for field in FieldId::ALL {
            let row = match field {
                FieldId::FullName | FieldId::Rank | FieldId::Qualification => {
                    identity_row(field, record.text_field(field))
                }
                FieldId::LeaveStart => {
                    // Display-only: the ban set tracks the leave end date.
                    let value = &record.leave_start;
                    let severity =
                        if value.is_missing() { Severity::Unknown } else { Severity::Ok };
                    ReportRow {
                        field,
                        label: field.label(),
                        severity,
                        display: display_value(value),
                        message: String::new(),
                        days_remaining: None,
                        classified: false,
                    }
                }
                FieldId::Medical => {
                    status_row(field, &record.medical, classify_medical(&record.medical, today), true)
                }
                FieldId::Secondary => status_row(
                    field,
                    &record.secondary,
                    classify_secondary(&record.medical, &record.secondary, today),
                    true,
                ),
                _ => {
                    let value = record
                        .date_field(field)
                        .expect("remaining report fields carry dates");
                    let window = window_for(field).expect("classified fields have a window");
                    status_row(field, value, classify_window(value, window, today), true)
                }
            };
            rows.push(row);
        }

        Self { today, rows }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn row(&self, field: FieldId) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.field == field)
    }

    /// Ordered flight-duty ban reasons; empty means cleared.
    pub fn ban_reasons(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| row.classified && row.severity.is_banning())
            .map(|row| format!("🔴 {}: {}", row.label, row.message))
            .collect()
    }

    pub fn is_cleared(&self) -> bool {
        self.rows.iter().all(|row| !(row.classified && row.severity.is_banning()))
    }

    /// Terse one-symbol-per-field summary for list views, in report order.
    pub fn summary_line(&self) -> String {
        self.rows
            .iter()
            .filter(|row| row.classified)
            .map(|row| row.severity.symbol())
            .collect()
    }

    /// Short labels of the banning fields, for the list-view problems suffix.
    pub fn problem_labels(&self) -> Vec<&'static str> {
        self.rows
            .iter()
            .filter(|row| row.classified && row.severity.is_banning())
            .map(|row| row.label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::domain::fields::FieldId;
    use crate::domain::person::{PersonId, PersonRecord};
    use crate::eligibility::classify::Severity;
    use crate::eligibility::normalize::FieldValue;

    use super::Evaluation;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid test date")
    }

    fn dated(days_ago: i64) -> FieldValue {
        FieldValue::OnDate(today() - Duration::days(days_ago))
    }

    fn record() -> PersonRecord {
        let mut record = PersonRecord::new(PersonId(7), Some("pilot".to_owned()));
        record.full_name = Some("Иванов Иван Иванович".to_owned());
        record.rank = Some("капитан".to_owned());
        record.qualification = Some("1 класс".to_owned());
        record
    }

    #[test]
    fn rows_follow_the_fixed_field_order() {
        let evaluation = Evaluation::evaluate(&record(), today());
        let order: Vec<FieldId> = evaluation.rows().iter().map(|row| row.field).collect();
        assert_eq!(order, FieldId::ALL.to_vec());
    }

    #[test]
    fn evaluation_is_deterministic_for_the_same_snapshot() {
        let mut record = record();
        record.medical = dated(100);
        record.kbp4_md_m = dated(170);
        record.parachute = FieldValue::Exempt;

        let first = Evaluation::evaluate(&record, today());
        let second = Evaluation::evaluate(&record, today());
        assert_eq!(first.rows(), second.rows());
        assert_eq!(first.ban_reasons(), second.ban_reasons());
        assert_eq!(first.summary_line(), second.summary_line());
    }

    #[test]
    fn empty_record_has_no_bans_only_unknowns() {
        let evaluation = Evaluation::evaluate(&record(), today());
        assert!(evaluation.is_cleared());
        assert!(evaluation.ban_reasons().is_empty());
        for row in evaluation.rows().iter().filter(|row| row.classified) {
            assert_eq!(row.severity, Severity::Unknown, "{}", row.label);
        }
    }

    #[test]
    fn exempt_fields_render_the_exemption_label_and_never_ban() {
        let mut record = record();
        record.parachute = FieldValue::Exempt;
        let evaluation = Evaluation::evaluate(&record, today());
        let row = evaluation.row(FieldId::Parachute).expect("parachute row");
        assert_eq!(row.severity, Severity::Exempt);
        assert_eq!(row.display, "освобожден");
        assert!(evaluation.ban_reasons().is_empty());
    }

    #[test]
    fn mandatory_missing_secondary_produces_a_ban() {
        let mut record = record();
        record.medical = dated(200);
        let evaluation = Evaluation::evaluate(&record, today());

        let row = evaluation.row(FieldId::Secondary).expect("secondary row");
        assert_eq!(row.severity, Severity::Expired);

        let bans = evaluation.ban_reasons();
        assert_eq!(bans.len(), 1);
        assert!(bans[0].contains("УМО"), "{bans:?}");
    }

    #[test]
    fn end_to_end_ban_list_matches_the_reference_scenario() {
        // Medical 400 days old, parachute exempt, КБП-4 at 200 days on its
        // 180-day window: exactly the two dated expiries ban.
        let mut record = record();
        record.medical = dated(400);
        record.parachute = FieldValue::Exempt;
        record.kbp4_md_m = dated(200);

        let evaluation = Evaluation::evaluate(&record, today());
        let bans = evaluation.ban_reasons();
        assert_eq!(bans.len(), 2, "{bans:?}");
        assert!(bans[0].contains("ВЛК"));
        assert!(bans[1].contains("КБП-4"));
        assert!(!evaluation.is_cleared());
    }

    #[test]
    fn ban_order_is_the_report_order() {
        let mut record = record();
        record.leave_end = dated(400);
        record.medical = dated(400);
        record.kbp7_md90a = dated(400);

        let bans = Evaluation::evaluate(&record, today()).ban_reasons();
        assert_eq!(bans.len(), 3);
        assert!(bans[0].contains("Отпуск"));
        assert!(bans[1].contains("ВЛК"));
        assert!(bans[2].contains("КБП-7 (Ил-76 МД-90А)"));
    }

    #[test]
    fn summary_line_has_one_symbol_per_classified_field() {
        let mut record = record();
        record.medical = dated(10);
        record.parachute = FieldValue::Exempt;

        let evaluation = Evaluation::evaluate(&record, today());
        let summary = evaluation.summary_line();
        assert_eq!(summary.chars().count(), 8);
        assert!(summary.contains('🟢'));
        assert!(summary.contains('⚪'));
    }

    #[test]
    fn scheduler_day_deltas_are_exposed_per_row() {
        let mut record = record();
        record.kbp7_md_m = dated(330); // 360-day window: 30 days remaining
        let evaluation = Evaluation::evaluate(&record, today());
        let row = evaluation.row(FieldId::Kbp7MdM).expect("kbp7 row");
        assert_eq!(row.days_remaining, Some(30));
    }

    #[test]
    fn one_bad_field_never_aborts_the_rest() {
        let mut record = record();
        record.medical = FieldValue::from_raw(Some("не дата"));
        record.kbp4_md_m = dated(10);
        let evaluation = Evaluation::evaluate(&record, today());
        assert_eq!(
            evaluation.row(FieldId::Medical).expect("medical row").severity,
            Severity::Unknown
        );
        assert_eq!(
            evaluation.row(FieldId::Kbp4MdM).expect("kbp row").severity,
            Severity::Ok
        );
    }
}
