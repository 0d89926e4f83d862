use crewdesk_core::config::{AppConfig, LoadOptions, LogFormat};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line("database.url", &config.database.url));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
    ));
    lines.push(render_line("database.timeout_secs", &config.database.timeout_secs.to_string()));

    lines.push(render_line(
        "telegram.bot_token",
        &redact_token(config.telegram.bot_token.expose_secret()),
    ));
    lines.push(render_line("telegram.api_base_url", &config.telegram.api_base_url));
    lines.push(render_line(
        "telegram.root_admin_id",
        &config.telegram.root_admin_id.to_string(),
    ));
    lines.push(render_line(
        "telegram.poll_timeout_secs",
        &config.telegram.poll_timeout_secs.to_string(),
    ));

    lines.push(render_line("scheduler.enabled", &config.scheduler.enabled.to_string()));
    lines.push(render_line("scheduler.sweep_hour", &config.scheduler.sweep_hour.to_string()));

    lines.push(render_line("server.bind_address", &config.server.bind_address));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
    ));

    lines.push(render_line("logging.level", &config.logging.level));
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };
    lines.push(render_line("logging.format", format));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

/// Keep only the bot id prefix; the secret half never reaches a terminal.
fn redact_token(token: &str) -> String {
    if token.is_empty() {
        return "<unset>".to_string();
    }
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{bot_id}:***"),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn token_secret_half_is_redacted() {
        assert_eq!(redact_token("123456:abcdef"), "123456:***");
        assert_eq!(redact_token("malformed"), "***");
        assert_eq!(redact_token(""), "<unset>");
    }
}
