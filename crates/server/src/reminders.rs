use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::{info, warn};

use crewdesk_core::domain::person::{PersonId, PersonRecord};
use crewdesk_core::eligibility::report::Evaluation;
use crewdesk_telegram::api::{BotApi, OutgoingMessage};
use crewdesk_db::PersonnelRepository;

/// Days-before-expiry checkpoints that fire a notification. A hit requires
/// the exact day delta, so each checkpoint fires at most once per field.
pub const CHECKPOINT_DAYS: &[i64] = &[30, 14, 7, 0];

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam so the sweep is testable without a live bot.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify_person(&self, person_id: PersonId, text: &str) -> Result<(), NotifyError>;
    async fn notify_admin(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sends reminders through the Bot API; the admin copy goes to the root
/// admin's chat.
pub struct BotNotifier {
    api: Arc<dyn BotApi>,
    root_admin_id: i64,
}

impl BotNotifier {
    pub fn new(api: Arc<dyn BotApi>, root_admin_id: i64) -> Self {
        Self { api, root_admin_id }
    }
}

#[async_trait]
impl ReminderNotifier for BotNotifier {
    async fn notify_person(&self, person_id: PersonId, text: &str) -> Result<(), NotifyError> {
        self.api
            .send_message(OutgoingMessage::new(person_id.0, text))
            .await
            .map(|_| ())
            .map_err(|error| NotifyError::Delivery(error.to_string()))
    }

    async fn notify_admin(&self, text: &str) -> Result<(), NotifyError> {
        self.api
            .send_message(OutgoingMessage::new(self.root_admin_id, text))
            .await
            .map(|_| ())
            .map_err(|error| NotifyError::Delivery(error.to_string()))
    }
}

/// One reminder due today for one field of one person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reminder {
    pub person_id: PersonId,
    pub field_label: &'static str,
    pub days_left: i64,
    pub person_text: String,
    pub admin_text: String,
}

/// Pure part of the sweep: which reminders does this record owe today.
/// Consumes the raw per-row day deltas of a single evaluation pass.
pub fn due_reminders(record: &PersonRecord, today: NaiveDate) -> Vec<Reminder> {
    let evaluation = Evaluation::evaluate(record, today);
    let name = record.display_name();

    evaluation
        .rows()
        .iter()
        .filter(|row| row.classified)
        .filter_map(|row| row.days_remaining.map(|days| (row, days)))
        .filter(|(_, days)| CHECKPOINT_DAYS.contains(days))
        .map(|(row, days)| {
            let when = if days == 0 {
                "сегодня".to_owned()
            } else {
                format!("через {days} дн.")
            };
            Reminder {
                person_id: record.person_id,
                field_label: row.label,
                days_left: days,
                person_text: format!("⚠️ {name}, {when} истекает срок: {}", row.label),
                admin_text: format!("🚨 Админ: у {name} {when} выходит {}", row.label),
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub records_scanned: usize,
    pub reminders_sent: usize,
    pub delivery_failures: usize,
}

/// Scan every onboarded record once with a single captured `today` and push
/// the due notifications. Delivery failures are counted and skipped, never
/// fatal.
pub async fn run_sweep(
    personnel: &dyn PersonnelRepository,
    notifier: &dyn ReminderNotifier,
    today: NaiveDate,
) -> anyhow::Result<SweepStats> {
    let records = personnel.list_onboarded().await?;
    let mut stats = SweepStats { records_scanned: records.len(), ..SweepStats::default() };

    for record in &records {
        for reminder in due_reminders(record, today) {
            match notifier.notify_person(reminder.person_id, &reminder.person_text).await {
                Ok(()) => stats.reminders_sent += 1,
                Err(error) => {
                    stats.delivery_failures += 1;
                    warn!(
                        person_id = %reminder.person_id,
                        field = reminder.field_label,
                        error = %error,
                        "person reminder delivery failed"
                    );
                }
            }
            if let Err(error) = notifier.notify_admin(&reminder.admin_text).await {
                stats.delivery_failures += 1;
                warn!(
                    person_id = %reminder.person_id,
                    field = reminder.field_label,
                    error = %error,
                    "admin reminder delivery failed"
                );
            }
        }
    }

    info!(
        event_name = "scheduler.sweep.completed",
        records_scanned = stats.records_scanned,
        reminders_sent = stats.reminders_sent,
        delivery_failures = stats.delivery_failures,
        "deadline sweep completed"
    );
    Ok(stats)
}

/// Time left until the next daily sweep at `sweep_hour` local time.
pub fn next_sweep_delay(now: NaiveDateTime, sweep_hour: u8) -> Duration {
    let sweep_time =
        NaiveTime::from_hms_opt(u32::from(sweep_hour), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(sweep_time);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// Background loop: sleep until the configured hour, sweep, repeat.
pub fn spawn(
    personnel: Arc<dyn PersonnelRepository>,
    notifier: Arc<dyn ReminderNotifier>,
    sweep_hour: u8,
) {
    tokio::spawn(async move {
        loop {
            let delay = next_sweep_delay(chrono::Local::now().naive_local(), sweep_hour);
            info!(
                event_name = "scheduler.sweep.scheduled",
                delay_secs = delay.as_secs(),
                sweep_hour,
                "next deadline sweep scheduled"
            );
            tokio::time::sleep(delay).await;

            let today = chrono::Local::now().date_naive();
            if let Err(error) = run_sweep(personnel.as_ref(), notifier.as_ref(), today).await {
                warn!(error = %error, "deadline sweep failed; retrying at the next slot");
            }
        }
    });
}
