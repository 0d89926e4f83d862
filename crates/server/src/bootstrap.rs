use std::sync::Arc;

use crewdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use crewdesk_db::{
    connect_with_settings, migrations, DbPool, SqlAdminRepository, SqlPersonnelRepository,
    SqlReferenceRepository,
};
use crewdesk_telegram::api::{BotApi, HttpBotApi};
use crewdesk_telegram::handlers::{build_dispatcher, BotContext};
use crewdesk_telegram::poll::{HttpUpdateTransport, LongPollRunner, ReconnectPolicy};
use crewdesk_db::PersonnelRepository;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub bot_api: Arc<dyn BotApi>,
    pub personnel: Arc<dyn PersonnelRepository>,
    pub poll_runner: LongPollRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let personnel: Arc<dyn PersonnelRepository> =
        Arc::new(SqlPersonnelRepository::new(db_pool.clone()));
    let bot_api: Arc<dyn BotApi> = Arc::new(HttpBotApi::new(
        config.telegram.api_base_url.clone(),
        config.telegram.bot_token.clone(),
    ));

    let bot_ctx = BotContext::new(
        bot_api.clone(),
        personnel.clone(),
        Arc::new(SqlAdminRepository::new(db_pool.clone())),
        Arc::new(SqlReferenceRepository::new(db_pool.clone())),
        config.telegram.root_admin_id,
    );

    let transport = Arc::new(HttpUpdateTransport::new(
        config.telegram.api_base_url.clone(),
        config.telegram.bot_token.clone(),
        config.telegram.poll_timeout_secs,
    ));
    let poll_runner =
        LongPollRunner::new(transport, build_dispatcher(bot_ctx), ReconnectPolicy::default());

    Ok(Application { config, db_pool, bot_api, personnel, poll_runner })
}
