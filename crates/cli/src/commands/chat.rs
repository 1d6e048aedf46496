//! Interactive chat REPL: one local session wired to the real store,
//! notifier, and completion client.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use medbook_agent::llm::HttpCompletionClient;
use medbook_agent::retrieval::NoopRetriever;
use medbook_agent::session::{SessionDeps, SessionRegistry};
use medbook_core::config::{AppConfig, LoadOptions, LogFormat};
use medbook_core::notify::ConfirmationNotifier;
use medbook_db::{connect_with_settings, migrations, SqlBookingStore};
use medbook_mailer::{DisabledNotifier, SmtpMailer};

use crate::commands::CommandResult;

const LOCAL_SESSION_ID: &str = "local";

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(chat_loop(config)) {
        Ok(turns) => CommandResult::success("chat", format!("chat session ended after {turns} turns")),
        Err(error) => CommandResult::failure("chat", "runtime", error.to_string(), 4),
    }
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .compact()
                .try_init();
        }
        LogFormat::Pretty => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .pretty()
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .json()
                .try_init();
        }
    }
}

async fn chat_loop(config: AppConfig) -> anyhow::Result<u64> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await?;
    migrations::run_pending(&pool).await?;

    let notifier: Arc<dyn ConfirmationNotifier> = if config.smtp.enabled {
        Arc::new(SmtpMailer::from_config(&config.smtp, &config.clinic)?)
    } else {
        Arc::new(DisabledNotifier)
    };

    let deps = SessionDeps {
        store: Arc::new(SqlBookingStore::new(pool)),
        notifier,
        retriever: Arc::new(NoopRetriever),
        completions: Arc::new(HttpCompletionClient::from_config(&config.llm)?),
        clinic: config.clinic.clone(),
        limits: config.limits.clone(),
    };
    let mut registry = SessionRegistry::new(deps);

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(
            format!(
                "{} booking assistant. Type a message, or /status, /reset, /quit.\n",
                config.clinic.name
            )
            .as_bytes(),
        )
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut turns = 0u64;

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "/quit" | "/exit" => break,
            "/reset" => {
                registry.session(LOCAL_SESSION_ID).reset();
                stdout.write_all(b"Booking flow reset.\n").await?;
                continue;
            }
            "/status" => {
                let status = registry.session(LOCAL_SESSION_ID).status_summary();
                let text = if status.is_empty() { "No booking in progress.".to_string() } else { status };
                stdout.write_all(format!("{text}\n").as_bytes()).await?;
                continue;
            }
            "" => continue,
            _ => {}
        }

        let reply = registry.session(LOCAL_SESSION_ID).process_turn(&line).await;
        turns += 1;
        stdout.write_all(format!("medbook> {reply}\n").as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(turns)
}
