use secrecy::ExposeSecret;

use wegroup_core::config::{AppConfig, LoadOptions};

/// Render the effective configuration with secrets redacted. Values follow
/// the load precedence (overrides > env > file > default); the env var
/// column names the override hook for each field.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let api_key = match &config.ai.api_key {
        Some(key) => redact_secret(key.expose_secret()),
        None => "(unset)".to_string(),
    };

    let lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        render_line("database.url", &config.database.url, "WEGROUP_DATABASE_URL"),
        render_line(
            "database.max_connections",
            &config.database.max_connections.to_string(),
            "-",
        ),
        render_line("ai.provider", &format!("{:?}", config.ai.provider), "WEGROUP_AI_PROVIDER"),
        render_line("ai.model", &config.ai.model, "WEGROUP_AI_MODEL"),
        render_line("ai.api_key", &api_key, "WEGROUP_AI_API_KEY"),
        render_line(
            "ai.base_url",
            config.ai.base_url.as_deref().unwrap_or("(provider default)"),
            "WEGROUP_AI_BASE_URL",
        ),
        render_line(
            "scoring.weight_profile",
            config.scoring.weight_profile.as_str(),
            "WEGROUP_WEIGHT_PROFILE",
        ),
        render_line("server.bind_address", &config.server.bind_address, "-"),
        render_line("server.api_port", &config.server.api_port.to_string(), "WEGROUP_API_PORT"),
        render_line(
            "server.health_check_port",
            &config.server.health_check_port.to_string(),
            "-",
        ),
        render_line("logging.level", &config.logging.level, "WEGROUP_LOG_LEVEL"),
        render_line("logging.format", &format!("{:?}", config.logging.format), "WEGROUP_LOG_FORMAT"),
    ];

    lines.join("\n")
}

fn render_line(key: &str, value: &str, env_var: &str) -> String {
    format!("  {key} = {value} (env: {env_var})")
}

fn redact_secret(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &secret[..4])
}
