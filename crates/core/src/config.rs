use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

use crate::catalog::hotels::EligibilityPolicy;
use crate::lifecycle::LifecycleSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub booking: BookingConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// Unset means the catalog embedded in the binary.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub stay_nights: u32,
    pub refund_pct: u8,
    pub id_retry_limit: u32,
    pub low_budget_ceiling: Decimal,
    pub high_budget_floor: Decimal,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub sender_address: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub catalog_path: Option<PathBuf>,
    pub notifications_enabled: Option<bool>,
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
                url: "sqlite://yatra.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            catalog: CatalogConfig::default(),
            booking: BookingConfig {
                stay_nights: 3,
                refund_pct: 80,
                id_retry_limit: 3,
                low_budget_ceiling: Decimal::from(5000),
                high_budget_floor: Decimal::from(15000),
            },
            notification: NotificationConfig {
                enabled: false,
                webhook_url: None,
                api_key: None,
                sender_address: "bookings@yatra.local".to_string(),
                timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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

impl BookingConfig {
    pub fn eligibility_policy(&self) -> EligibilityPolicy {
        EligibilityPolicy {
            low_budget_ceiling: self.low_budget_ceiling,
            high_budget_floor: self.high_budget_floor,
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("yatra.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            stay_nights: self.booking.stay_nights,
            refund_pct: self.booking.refund_pct,
            id_retry_limit: self.booking.id_retry_limit,
            notification_timeout: Duration::from_secs(self.notification.timeout_secs),
        }
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

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(stay_nights) = booking.stay_nights {
                self.booking.stay_nights = stay_nights;
            }
            if let Some(refund_pct) = booking.refund_pct {
                self.booking.refund_pct = refund_pct;
            }
            if let Some(id_retry_limit) = booking.id_retry_limit {
                self.booking.id_retry_limit = id_retry_limit;
            }
            if let Some(ceiling) = booking.low_budget_ceiling {
                self.booking.low_budget_ceiling = ceiling;
            }
            if let Some(floor) = booking.high_budget_floor {
                self.booking.high_budget_floor = floor;
            }
        }

        if let Some(notification) = patch.notification {
            if let Some(enabled) = notification.enabled {
                self.notification.enabled = enabled;
            }
            if let Some(webhook_url) = notification.webhook_url {
                self.notification.webhook_url = Some(webhook_url);
            }
            if let Some(api_key_value) = notification.api_key {
                self.notification.api_key = Some(secret_value(api_key_value));
            }
            if let Some(sender_address) = notification.sender_address {
                self.notification.sender_address = sender_address;
            }
            if let Some(timeout_secs) = notification.timeout_secs {
                self.notification.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("YATRA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("YATRA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("YATRA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("YATRA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("YATRA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("YATRA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("YATRA_SERVER_PORT") {
            self.server.port = parse_u16("YATRA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("YATRA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("YATRA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("YATRA_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("YATRA_BOOKING_STAY_NIGHTS") {
            self.booking.stay_nights = parse_u32("YATRA_BOOKING_STAY_NIGHTS", &value)?;
        }
        if let Some(value) = read_env("YATRA_BOOKING_REFUND_PCT") {
            self.booking.refund_pct = parse_u8("YATRA_BOOKING_REFUND_PCT", &value)?;
        }
        if let Some(value) = read_env("YATRA_BOOKING_ID_RETRY_LIMIT") {
            self.booking.id_retry_limit = parse_u32("YATRA_BOOKING_ID_RETRY_LIMIT", &value)?;
        }
        if let Some(value) = read_env("YATRA_BOOKING_LOW_BUDGET_CEILING") {
            self.booking.low_budget_ceiling =
                parse_decimal("YATRA_BOOKING_LOW_BUDGET_CEILING", &value)?;
        }
        if let Some(value) = read_env("YATRA_BOOKING_HIGH_BUDGET_FLOOR") {
            self.booking.high_budget_floor =
                parse_decimal("YATRA_BOOKING_HIGH_BUDGET_FLOOR", &value)?;
        }

        if let Some(value) = read_env("YATRA_NOTIFICATION_ENABLED") {
            self.notification.enabled = parse_bool("YATRA_NOTIFICATION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("YATRA_NOTIFICATION_WEBHOOK_URL") {
            self.notification.webhook_url = Some(value);
        }
        if let Some(value) = read_env("YATRA_NOTIFICATION_API_KEY") {
            self.notification.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("YATRA_NOTIFICATION_SENDER_ADDRESS") {
            self.notification.sender_address = value;
        }
        if let Some(value) = read_env("YATRA_NOTIFICATION_TIMEOUT_SECS") {
            self.notification.timeout_secs = parse_u64("YATRA_NOTIFICATION_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("YATRA_LOGGING_LEVEL").or_else(|| read_env("YATRA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("YATRA_LOGGING_FORMAT").or_else(|| read_env("YATRA_LOG_FORMAT"));
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
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(enabled) = overrides.notifications_enabled {
            self.notification.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_booking(&self.booking)?;
        validate_notification(&self.notification)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("yatra.toml"), PathBuf::from("config/yatra.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if booking.stay_nights == 0 || booking.stay_nights > 30 {
        return Err(ConfigError::Validation(
            "booking.stay_nights must be in range 1..=30".to_string(),
        ));
    }

    if booking.refund_pct > 100 {
        return Err(ConfigError::Validation(
            "booking.refund_pct must be in range 0..=100".to_string(),
        ));
    }

    if booking.id_retry_limit == 0 || booking.id_retry_limit > 10 {
        return Err(ConfigError::Validation(
            "booking.id_retry_limit must be in range 1..=10".to_string(),
        ));
    }

    if booking.low_budget_ceiling <= Decimal::ZERO
        || booking.low_budget_ceiling >= booking.high_budget_floor
    {
        return Err(ConfigError::Validation(
            "booking.low_budget_ceiling must be positive and below booking.high_budget_floor"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_notification(notification: &NotificationConfig) -> Result<(), ConfigError> {
    if notification.timeout_secs == 0 || notification.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "notification.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if !notification.sender_address.as_str().validate_email() {
        return Err(ConfigError::Validation(
            "notification.sender_address must be an email address".to_string(),
        ));
    }

    if let Some(url) = &notification.webhook_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "notification.webhook_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if notification.enabled && notification.webhook_url.is_none() {
        return Err(ConfigError::Validation(
            "notification.enabled is true but notification.webhook_url is not set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| invalid_override(key, value))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    booking: Option<BookingPatch>,
    notification: Option<NotificationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    stay_nights: Option<u32>,
    refund_pct: Option<u8>,
    id_retry_limit: Option<u32>,
    low_budget_ceiling: Option<Decimal>,
    high_budget_floor: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    enabled: Option<bool>,
    webhook_url: Option<String>,
    api_key: Option<String>,
    sender_address: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
