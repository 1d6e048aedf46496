use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub clinic: ClinicConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    /// Email delivery is optional; when disabled the booking flow runs with
    /// a no-op notifier and reports the degraded outcome to the user.
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_password: SecretString,
}

#[derive(Clone, Debug)]
pub struct ClinicConfig {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct LimitsConfig {
    pub max_messages_per_minute: u32,
    pub max_bookings_per_hour: u32,
    pub cooldown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Groq,
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
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub smtp_enabled: Option<bool>,
    pub smtp_sender_email: Option<String>,
    pub smtp_sender_password: Option<String>,
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
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://medbook.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                enabled: false,
                server: "smtp.gmail.com".to_string(),
                port: 587,
                sender_email: String::new(),
                sender_password: String::new().into(),
            },
            clinic: ClinicConfig {
                name: "HealthFirst Medical Center".to_string(),
                phone: "+1-555-0123".to_string(),
                address: "123 Health Street, Medical City".to_string(),
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434/v1".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            limits: LimitsConfig {
                max_messages_per_minute: 30,
                max_bookings_per_hour: 5,
                cooldown_secs: 2,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|groq|ollama)"
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("medbook.toml"));
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

        if let Some(smtp) = patch.smtp {
            if let Some(enabled) = smtp.enabled {
                self.smtp.enabled = enabled;
            }
            if let Some(server) = smtp.server {
                self.smtp.server = server;
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(sender_email) = smtp.sender_email {
                self.smtp.sender_email = sender_email;
            }
            if let Some(sender_password_value) = smtp.sender_password {
                self.smtp.sender_password = secret_value(sender_password_value);
            }
        }

        if let Some(clinic) = patch.clinic {
            if let Some(name) = clinic.name {
                self.clinic.name = name;
            }
            if let Some(phone) = clinic.phone {
                self.clinic.phone = phone;
            }
            if let Some(address) = clinic.address {
                self.clinic.address = address;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(limits) = patch.limits {
            if let Some(max_messages_per_minute) = limits.max_messages_per_minute {
                self.limits.max_messages_per_minute = max_messages_per_minute;
            }
            if let Some(max_bookings_per_hour) = limits.max_bookings_per_hour {
                self.limits.max_bookings_per_hour = max_bookings_per_hour;
            }
            if let Some(cooldown_secs) = limits.cooldown_secs {
                self.limits.cooldown_secs = cooldown_secs;
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
        if let Some(value) = read_env("MEDBOOK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MEDBOOK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("MEDBOOK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("MEDBOOK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MEDBOOK_SMTP_ENABLED") {
            self.smtp.enabled = parse_bool("MEDBOOK_SMTP_ENABLED", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_SMTP_SERVER") {
            self.smtp.server = value;
        }
        if let Some(value) = read_env("MEDBOOK_SMTP_PORT") {
            self.smtp.port = parse_u16("MEDBOOK_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_SMTP_SENDER_EMAIL") {
            self.smtp.sender_email = value;
        }
        if let Some(value) = read_env("MEDBOOK_SMTP_SENDER_PASSWORD") {
            self.smtp.sender_password = secret_value(value);
        }

        if let Some(value) = read_env("MEDBOOK_CLINIC_NAME") {
            self.clinic.name = value;
        }
        if let Some(value) = read_env("MEDBOOK_CLINIC_PHONE") {
            self.clinic.phone = value;
        }
        if let Some(value) = read_env("MEDBOOK_CLINIC_ADDRESS") {
            self.clinic.address = value;
        }

        if let Some(value) = read_env("MEDBOOK_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("MEDBOOK_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("MEDBOOK_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("MEDBOOK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MEDBOOK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MEDBOOK_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("MEDBOOK_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("MEDBOOK_LIMITS_MAX_MESSAGES_PER_MINUTE") {
            self.limits.max_messages_per_minute =
                parse_u32("MEDBOOK_LIMITS_MAX_MESSAGES_PER_MINUTE", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_LIMITS_MAX_BOOKINGS_PER_HOUR") {
            self.limits.max_bookings_per_hour =
                parse_u32("MEDBOOK_LIMITS_MAX_BOOKINGS_PER_HOUR", &value)?;
        }
        if let Some(value) = read_env("MEDBOOK_LIMITS_COOLDOWN_SECS") {
            self.limits.cooldown_secs = parse_u64("MEDBOOK_LIMITS_COOLDOWN_SECS", &value)?;
        }

        let log_level = read_env("MEDBOOK_LOGGING_LEVEL").or_else(|| read_env("MEDBOOK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MEDBOOK_LOGGING_FORMAT").or_else(|| read_env("MEDBOOK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
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
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(enabled) = overrides.smtp_enabled {
            self.smtp.enabled = enabled;
        }
        if let Some(sender_email) = overrides.smtp_sender_email {
            self.smtp.sender_email = sender_email;
        }
        if let Some(sender_password) = overrides.smtp_sender_password {
            self.smtp.sender_password = secret_value(sender_password);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_smtp(&self.smtp)?;
        validate_llm(&self.llm)?;
        validate_limits(&self.limits)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("medbook.toml"), PathBuf::from("config/medbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_smtp(smtp: &SmtpConfig) -> Result<(), ConfigError> {
    if !smtp.enabled {
        return Ok(());
    }

    if smtp.server.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp.server is required when smtp.enabled is true".to_string(),
        ));
    }
    if smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be non-zero".to_string()));
    }
    if smtp.sender_email.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp.sender_email is required when smtp.enabled is true".to_string(),
        ));
    }
    if smtp.sender_password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "smtp.sender_password is required when smtp.enabled is true".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    match llm.provider {
        LlmProvider::Ollama => {
            if llm.base_url.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider".to_string(),
                ));
            }
        }
        LlmProvider::OpenAi | LlmProvider::Groq => {
            let has_key =
                llm.api_key.as_ref().is_some_and(|key| !key.expose_secret().is_empty());
            if !has_key {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for hosted llm providers".to_string(),
                ));
            }
        }
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_limits(limits: &LimitsConfig) -> Result<(), ConfigError> {
    if limits.max_messages_per_minute == 0 {
        return Err(ConfigError::Validation(
            "limits.max_messages_per_minute must be greater than zero".to_string(),
        ));
    }
    if limits.max_bookings_per_hour == 0 {
        return Err(ConfigError::Validation(
            "limits.max_bookings_per_hour must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of trace|debug|info|warn|error, got `{}`",
            logging.level
        )));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    smtp: Option<SmtpPatch>,
    clinic: Option<ClinicPatch>,
    llm: Option<LlmPatch>,
    limits: Option<LimitsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    enabled: Option<bool>,
    server: Option<String>,
    port: Option<u16>,
    sender_email: Option<String>,
    sender_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClinicPatch {
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitsPatch {
    max_messages_per_minute: Option<u32>,
    max_bookings_per_hour: Option<u32>,
    cooldown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
