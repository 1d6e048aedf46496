use secrecy::ExposeSecret;
use serde::Serialize;

use medbook_core::config::{AppConfig, LlmProvider, LoadOptions};
use medbook_db::{connect_with_settings, ping};

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: &'static str,
    detail: String,
}

/// Run preflight checks: configuration, database connectivity, email and
/// llm readiness.
pub fn run(json: bool) -> String {
    run_with(LoadOptions::default(), json)
}

pub fn run_with(options: LoadOptions, json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(options) {
        Ok(config) => {
            checks.push(Check {
                name: "config",
                status: "ok",
                detail: "configuration loaded and validated".to_string(),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(Check { name: "config", status: "fail", detail: error.to_string() });
            None
        }
    };

    if let Some(config) = &config {
        checks.push(database_check(config));
        checks.push(smtp_check(config));
        checks.push(llm_check(config));
    }

    render(checks, json)
}

fn database_check(config: &AppConfig) -> Check {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return Check {
                name: "database",
                status: "fail",
                detail: format!("async runtime unavailable: {error}"),
            };
        }
    };

    let probe = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| error.to_string())?;
        ping(&pool).await.map_err(|error| error.to_string())?;
        pool.close().await;
        Ok::<(), String>(())
    });

    match probe {
        Ok(()) => Check {
            name: "database",
            status: "ok",
            detail: format!("connected to {}", config.database.url),
        },
        Err(detail) => Check { name: "database", status: "fail", detail },
    }
}

fn smtp_check(config: &AppConfig) -> Check {
    if !config.smtp.enabled {
        return Check {
            name: "smtp",
            status: "skip",
            detail: "email delivery disabled; confirmations will be reported as undelivered"
                .to_string(),
        };
    }

    if config.smtp.sender_email.is_empty()
        || config.smtp.sender_password.expose_secret().is_empty()
    {
        return Check {
            name: "smtp",
            status: "fail",
            detail: "smtp enabled but sender credentials are missing".to_string(),
        };
    }

    Check {
        name: "smtp",
        status: "ok",
        detail: format!("sender configured via {}:{}", config.smtp.server, config.smtp.port),
    }
}

fn llm_check(config: &AppConfig) -> Check {
    let detail = match config.llm.provider {
        LlmProvider::Ollama => format!(
            "ollama at {} (model {})",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            config.llm.model
        ),
        LlmProvider::OpenAi | LlmProvider::Groq => {
            format!("hosted provider with api key (model {})", config.llm.model)
        }
    };
    Check { name: "llm", status: "ok", detail }
}

fn render(checks: Vec<Check>, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(&serde_json::json!({
            "command": "doctor",
            "status": if checks.iter().any(|check| check.status == "fail") { "error" } else { "ok" },
            "checks": checks,
        }))
        .unwrap_or_else(|error| format!("{{\"command\":\"doctor\",\"status\":\"error\",\"message\":\"{error}\"}}"));
    }

    let mut lines = vec!["medbook doctor".to_string()];
    for check in &checks {
        lines.push(format!("[{}] {} - {}", check.status, check.name, check.detail));
    }
    lines.join("\n")
}
