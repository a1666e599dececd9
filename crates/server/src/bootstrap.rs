use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use wegroup_agent::{ChatCompletionClient, GuardrailPolicy, HttpChatClient};
use wegroup_core::config::{AppConfig, ConfigError, LoadOptions};
use wegroup_db::{connect_with_settings, migrations, DbPool};

use crate::api::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_client: Arc<dyn ChatCompletionClient>,
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState {
            db_pool: self.db_pool.clone(),
            chat: self.chat_client.clone(),
            guardrails: GuardrailPolicy::default(),
            weight_profile: self.config.scoring.weight_profile,
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("ai client initialization failed: {0}")]
    AiClient(String),
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

    let chat_client = HttpChatClient::from_config(&config.ai)
        .map_err(|error| BootstrapError::AiClient(error.to_string()))?;

    Ok(Application { config, db_pool, chat_client: Arc::new(chat_client) })
}
