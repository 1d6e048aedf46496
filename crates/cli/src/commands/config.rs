use secrecy::ExposeSecret;
use serde_json::json;

use medbook_core::config::{AppConfig, LoadOptions};

const REDACTED: &str = "<redacted>";

/// Render the effective configuration (defaults + file + env + overrides)
/// with secrets redacted.
pub fn run() -> String {
    run_with(LoadOptions::default())
}

pub fn run_with(options: LoadOptions) -> String {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "message": format!("configuration issue: {error}"),
            })
            .to_string();
        }
    };

    let api_key = config.llm.api_key.as_ref().map(|key| {
        if key.expose_secret().is_empty() { "" } else { REDACTED }
    });
    let sender_password = if config.smtp.sender_password.expose_secret().is_empty() {
        ""
    } else {
        REDACTED
    };

    let payload = json!({
        "command": "config",
        "status": "ok",
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "smtp": {
            "enabled": config.smtp.enabled,
            "server": config.smtp.server,
            "port": config.smtp.port,
            "sender_email": config.smtp.sender_email,
            "sender_password": sender_password,
        },
        "clinic": {
            "name": config.clinic.name,
            "phone": config.clinic.phone,
            "address": config.clinic.address,
        },
        "llm": {
            "provider": config.llm.provider,
            "api_key": api_key,
            "base_url": config.llm.base_url,
            "model": config.llm.model,
            "timeout_secs": config.llm.timeout_secs,
            "max_retries": config.llm.max_retries,
        },
        "limits": {
            "max_messages_per_minute": config.limits.max_messages_per_minute,
            "max_bookings_per_hour": config.limits.max_bookings_per_hour,
            "cooldown_secs": config.limits.cooldown_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": config.logging.format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        json!({
            "command": "config",
            "status": "error",
            "message": format!("serialization failed: {error}"),
        })
        .to_string()
    })
}
