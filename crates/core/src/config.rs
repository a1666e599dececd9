use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::WeightProfile;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub server: ServerConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub api_port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub weight_profile: WeightProfile,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub ai_provider: Option<AiProvider>,
    pub ai_model: Option<String>,
    pub ai_api_key: Option<String>,
    pub weight_profile: Option<WeightProfile>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://wegroup.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            ai: AiConfig {
                provider: AiProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                api_port: 8090,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            scoring: ScoringConfig { weight_profile: WeightProfile::Standard },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for AiProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported ai provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("wegroup.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(ai) = patch.ai {
            if let Some(provider) = ai.provider {
                self.ai.provider = provider;
            }
            if let Some(api_key_value) = ai.api_key {
                self.ai.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = ai.base_url {
                self.ai.base_url = Some(base_url);
            }
            if let Some(model) = ai.model {
                self.ai.model = model;
            }
            if let Some(timeout_secs) = ai.timeout_secs {
                self.ai.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = ai.max_retries {
                self.ai.max_retries = max_retries;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(api_port) = server.api_port {
                self.server.api_port = api_port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(scoring) = patch.scoring {
            if let Some(weight_profile) = scoring.weight_profile {
                self.scoring.weight_profile = weight_profile;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("WEGROUP_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = env::var("WEGROUP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("WEGROUP_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "WEGROUP_LOG_FORMAT".to_string(),
                value: format,
            })?;
        }
        if let Ok(provider) = env::var("WEGROUP_AI_PROVIDER") {
            self.ai.provider =
                provider.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "WEGROUP_AI_PROVIDER".to_string(),
                    value: provider,
                })?;
        }
        if let Ok(model) = env::var("WEGROUP_AI_MODEL") {
            self.ai.model = model;
        }
        if let Ok(api_key) = env::var("WEGROUP_AI_API_KEY") {
            self.ai.api_key = Some(secret_value(api_key));
        }
        if let Ok(base_url) = env::var("WEGROUP_AI_BASE_URL") {
            self.ai.base_url = Some(base_url);
        }
        if let Ok(profile) = env::var("WEGROUP_WEIGHT_PROFILE") {
            self.scoring.weight_profile =
                profile.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "WEGROUP_WEIGHT_PROFILE".to_string(),
                    value: profile,
                })?;
        }
        if let Ok(port) = env::var("WEGROUP_API_PORT") {
            self.server.api_port =
                port.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "WEGROUP_API_PORT".to_string(),
                    value: port,
                })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(ai_provider) = overrides.ai_provider {
            self.ai.provider = ai_provider;
        }
        if let Some(ai_model) = overrides.ai_model {
            self.ai.model = ai_model;
        }
        if let Some(ai_api_key) = overrides.ai_api_key {
            self.ai.api_key = Some(secret_value(ai_api_key));
        }
        if let Some(weight_profile) = overrides.weight_profile {
            self.scoring.weight_profile = weight_profile;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.ai.model.trim().is_empty() {
            return Err(ConfigError::Validation("ai.model must not be empty".to_string()));
        }
        if self.ai.provider != AiProvider::Ollama && self.ai.api_key.is_none() {
            return Err(ConfigError::Validation(format!(
                "ai.api_key is required for provider {:?}",
                self.ai.provider
            )));
        }
        if self.server.api_port == self.server.health_check_port {
            return Err(ConfigError::Validation(
                "server.api_port and server.health_check_port must differ".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let default = PathBuf::from("wegroup.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    ai: Option<AiPatch>,
    server: Option<ServerPatch>,
    scoring: Option<ScoringPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AiPatch {
    provider: Option<AiProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    api_port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ScoringPatch {
    weight_profile: Option<WeightProfile>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use crate::scoring::WeightProfile;

    use super::{AiProvider, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("wegroup.toml");
        let mut file = std::fs::File::create(&path).expect("create config file");
        file.write_all(contents.as_bytes()).expect("write config file");
        (dir, path)
    }

    #[test]
    fn defaults_load_without_a_config_file() {
        let config = AppConfig::load(LoadOptions::default()).expect("load defaults");
        assert_eq!(config.database.url, "sqlite://wegroup.db");
        assert_eq!(config.ai.provider, AiProvider::Ollama);
        assert_eq!(config.scoring.weight_profile, WeightProfile::Standard);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let (_dir, path) = write_config(
            r#"
[database]
url = "sqlite://tenant.db"
max_connections = 9

[ai]
provider = "open_ai"
api_key = "sk-test"
model = "gpt-4o-mini"

[scoring]
weight_profile = "carbon_aware"

[logging]
level = "debug"
format = "json"
"#,
        );

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load from file");

        assert_eq!(config.database.url, "sqlite://tenant.db");
        assert_eq!(config.database.max_connections, 9);
        assert_eq!(config.ai.provider, AiProvider::OpenAi);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(
            config.ai.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            Some("sk-test".to_string())
        );
        assert_eq!(config.scoring.weight_profile, WeightProfile::CarbonAware);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/wegroup.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let (_dir, path) = write_config(
            r#"
[database]
url = "sqlite://from-file.db"
"#,
        );

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                weight_profile: Some(WeightProfile::CarbonAware),
                ..ConfigOverrides::default()
            },
        })
        .expect("load with overrides");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.scoring.weight_profile, WeightProfile::CarbonAware);
    }

    #[test]
    fn non_ollama_provider_requires_an_api_key() {
        let (_dir, path) = write_config(
            r#"
[ai]
provider = "anthropic"
model = "claude-sonnet"
"#,
        );

        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });

        assert!(matches!(result, Err(ConfigError::Validation(message)) if message.contains("api_key")));
    }

    #[test]
    fn colliding_ports_fail_validation() {
        let (_dir, path) = write_config(
            r#"
[server]
api_port = 8080
health_check_port = 8080
"#,
        );

        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });

        assert!(matches!(result, Err(ConfigError::Validation(message)) if message.contains("must differ")));
    }
}
