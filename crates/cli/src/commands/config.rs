use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use yatra_core::config::{AppConfig, LoadOptions};

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key = match &config.notification.api_key {
        Some(key) => redact_key(key.expose_secret()),
        None => "<unset>".to_string(),
    };

    vec![
        Field {
            key: "database.url",
            env_keys: &["YATRA_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        Field {
            key: "database.max_connections",
            env_keys: &["YATRA_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        Field {
            key: "database.timeout_secs",
            env_keys: &["YATRA_DATABASE_TIMEOUT_SECS"],
            value: config.database.timeout_secs.to_string(),
        },
        Field {
            key: "server.bind_address",
            env_keys: &["YATRA_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key: "server.port",
            env_keys: &["YATRA_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key: "server.graceful_shutdown_secs",
            env_keys: &["YATRA_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key: "catalog.path",
            env_keys: &["YATRA_CATALOG_PATH"],
            value: config
                .catalog
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<embedded>".to_string()),
        },
        Field {
            key: "booking.stay_nights",
            env_keys: &["YATRA_BOOKING_STAY_NIGHTS"],
            value: config.booking.stay_nights.to_string(),
        },
        Field {
            key: "booking.refund_pct",
            env_keys: &["YATRA_BOOKING_REFUND_PCT"],
            value: config.booking.refund_pct.to_string(),
        },
        Field {
            key: "booking.id_retry_limit",
            env_keys: &["YATRA_BOOKING_ID_RETRY_LIMIT"],
            value: config.booking.id_retry_limit.to_string(),
        },
        Field {
            key: "booking.low_budget_ceiling",
            env_keys: &["YATRA_BOOKING_LOW_BUDGET_CEILING"],
            value: config.booking.low_budget_ceiling.to_string(),
        },
        Field {
            key: "booking.high_budget_floor",
            env_keys: &["YATRA_BOOKING_HIGH_BUDGET_FLOOR"],
            value: config.booking.high_budget_floor.to_string(),
        },
        Field {
            key: "notification.enabled",
            env_keys: &["YATRA_NOTIFICATION_ENABLED"],
            value: config.notification.enabled.to_string(),
        },
        Field {
            key: "notification.webhook_url",
            env_keys: &["YATRA_NOTIFICATION_WEBHOOK_URL"],
            value: config
                .notification
                .webhook_url
                .clone()
                .unwrap_or_else(|| "<unset>".to_string()),
        },
        Field {
            key: "notification.api_key",
            env_keys: &["YATRA_NOTIFICATION_API_KEY"],
            value: api_key,
        },
        Field {
            key: "notification.sender_address",
            env_keys: &["YATRA_NOTIFICATION_SENDER_ADDRESS"],
            value: config.notification.sender_address.clone(),
        },
        Field {
            key: "notification.timeout_secs",
            env_keys: &["YATRA_NOTIFICATION_TIMEOUT_SECS"],
            value: config.notification.timeout_secs.to_string(),
        },
        Field {
            key: "logging.level",
            env_keys: &["YATRA_LOGGING_LEVEL", "YATRA_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["YATRA_LOGGING_FORMAT", "YATRA_LOG_FORMAT"],
            value: config.logging.format.as_str().to_string(),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("yatra.toml"), PathBuf::from("config/yatra.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Shows at most the first four characters of a secret.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    format!("{}***", trimmed.chars().take(4).collect::<String>())
}
