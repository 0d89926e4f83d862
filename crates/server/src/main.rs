mod bootstrap;
mod health;
mod reminders;

use std::sync::Arc;

use anyhow::Result;
use crewdesk_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use crewdesk_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    if app.config.scheduler.enabled {
        reminders::spawn(
            app.personnel.clone(),
            Arc::new(reminders::BotNotifier::new(
                app.bot_api.clone(),
                app.config.telegram.root_admin_id,
            )),
            app.config.scheduler.sweep_hour,
        );
    } else {
        tracing::info!(
            event_name = "system.server.scheduler_disabled",
            correlation_id = "bootstrap",
            "deadline scheduler disabled by configuration"
        );
    }

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "crewdesk-server started"
    );

    tokio::select! {
        result = app.poll_runner.start() => {
            tracing::warn!(
                event_name = "system.server.poll_loop_ended",
                correlation_id = "shutdown",
                "long poll loop ended"
            );
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                "crewdesk-server stopping"
            );
        }
    }

    Ok(())
}
