use crate::commands::CommandResult;
use crewdesk_core::config::{AppConfig, LoadOptions};
use crewdesk_core::eligibility::report::Evaluation;
use crewdesk_db::repositories::PersonnelRepository;
use crewdesk_db::{connect_with_settings, SqlPersonnelRepository};

/// Evaluate every onboarded record once and print a plain-text readiness
/// roster, one line per person.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "roster",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "roster",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repo = SqlPersonnelRepository::new(pool.clone());
        let records =
            repo.list_onboarded().await.map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(records)
    });

    let records = match result {
        Ok(records) => records,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("roster", error_class, message, exit_code);
        }
    };

    if records.is_empty() {
        return CommandResult::success("roster", "no onboarded personnel");
    }

    let today = chrono::Local::now().date_naive();
    let mut lines = Vec::with_capacity(records.len());
    for record in &records {
        let evaluation = Evaluation::evaluate(record, today);
        let bans = evaluation.ban_reasons();
        let status =
            if bans.is_empty() { "cleared".to_string() } else { format!("banned ({})", bans.len()) };
        lines.push(format!(
            "{} [{}] {} {}",
            record.person_id,
            status,
            evaluation.summary_line(),
            record.display_name()
        ));
    }

    CommandResult::success("roster", lines.join("\n"))
}
