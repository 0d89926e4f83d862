use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::domain::person::PersonRecord;
use crewdesk_core::eligibility::report::Evaluation;

/// Full profile text. Everything is read from the evaluation rows so the
/// profile, the roster summary, and the ban block can never disagree.
pub fn profile_text(evaluation: &Evaluation) -> String {
    let display = |field: FieldId| {
        evaluation.row(field).map(|row| row.display.clone()).unwrap_or_else(|| "—".to_owned())
    };

    let mut text = format!("👤 <b>{}</b>\n\n", display(FieldId::FullName));
    text.push_str(&format!("🎖 <b>Звание:</b> {}\n", display(FieldId::Rank)));
    text.push_str(&format!("📊 <b>Квалификация:</b> {}\n\n", display(FieldId::Qualification)));
    text.push_str(&format!(
        "📅 <b>Отпуск:</b> {} — {}\n\n",
        display(FieldId::LeaveStart),
        display(FieldId::LeaveEnd)
    ));

    for row in evaluation.rows().iter().filter(|row| row.classified) {
        text.push_str(&format!(
            "{} <b>{}:</b> {} ({})\n",
            row.severity.symbol(),
            row.label,
            row.display,
            row.message
        ));
    }

    text
}

/// Ban block appended after onboarding and in the profile view; `None` when
/// the person is cleared.
pub fn ban_block(evaluation: &Evaluation) -> Option<String> {
    let reasons = evaluation.ban_reasons();
    if reasons.is_empty() {
        return None;
    }
    Some(format!("🚫 <b>ПОЛЕТЫ ЗАПРЕЩЕНЫ!</b>\n{}", reasons.join("\n")))
}

/// One roster line for the admin listing: name, rank, terse status symbols,
/// a problems suffix when something bans, and the full-profile command.
pub fn roster_entry(record: &PersonRecord, evaluation: &Evaluation) -> String {
    let rank = record.rank.as_deref().unwrap_or("—");
    let mut entry = format!(
        "👤 {} ({rank}) {}\n",
        record.display_name(),
        evaluation.summary_line()
    );

    let problems = evaluation.problem_labels();
    if !problems.is_empty() {
        entry.push_str(&format!("   ⚠️ <b>ПРОБЛЕМЫ:</b> {}\n", problems.join(", ")));
    }
    entry.push_str(&format!("   /user{}\n", record.person_id.0));
    entry
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crewdesk_core::domain::person::{PersonId, PersonRecord};
    use crewdesk_core::eligibility::normalize::FieldValue;
    use crewdesk_core::eligibility::report::Evaluation;

    use super::{ban_block, profile_text, roster_entry};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid test date")
    }

    fn record() -> PersonRecord {
        let mut record = PersonRecord::new(PersonId(99), None);
        record.full_name = Some("Иванов Иван".to_owned());
        record.rank = Some("майор".to_owned());
        record.medical = FieldValue::OnDate(today() - Duration::days(400));
        record.parachute = FieldValue::Exempt;
        record
    }

    #[test]
    fn profile_contains_identity_and_status_lines() {
        let record = record();
        let evaluation = Evaluation::evaluate(&record, today());
        let text = profile_text(&evaluation);

        assert!(text.contains("Иванов Иван"));
        assert!(text.contains("🎖 <b>Звание:</b> майор"));
        assert!(text.contains("🔴 <b>ВЛК:</b>"));
        assert!(text.contains("⚪ <b>Прыжки с ПДС:</b> освобожден"));
    }

    #[test]
    fn ban_block_lists_reasons_or_is_absent() {
        let record = record();
        let evaluation = Evaluation::evaluate(&record, today());
        let block = ban_block(&evaluation).expect("expired medical bans");
        assert!(block.contains("ПОЛЕТЫ ЗАПРЕЩЕНЫ"));
        assert!(block.contains("ВЛК"));

        let clean = PersonRecord::new(PersonId(1), None);
        assert!(ban_block(&Evaluation::evaluate(&clean, today())).is_none());
    }

    #[test]
    fn roster_entry_carries_problems_and_profile_command() {
        let record = record();
        let evaluation = Evaluation::evaluate(&record, today());
        let entry = roster_entry(&record, &evaluation);

        assert!(entry.contains("Иванов Иван (майор)"));
        assert!(entry.contains("ПРОБЛЕМЫ:"));
        assert!(entry.contains("ВЛК"));
        assert!(entry.contains("/user99"));
    }
}
