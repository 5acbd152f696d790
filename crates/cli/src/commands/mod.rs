pub mod bookings;
pub mod catalog;
pub mod config;
pub mod doctor;
pub mod migrate;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

use yatra_core::catalog::ReferenceCatalog;
use yatra_core::config::{AppConfig, LoadOptions};
use yatra_core::lifecycle::BookingLifecycle;
use yatra_core::pricing::CatalogPricingEngine;
use yatra_db::{connect_with_config, migrations, DbPool, SqlBookingStore};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DB_CONNECT: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_CATALOG: u8 = 6;
pub const EXIT_NOT_FOUND: u8 = 7;
pub const EXIT_PERSISTENCE: u8 = 8;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}

pub(crate) fn load_catalog(
    command: &str,
    config: &AppConfig,
) -> Result<ReferenceCatalog, CommandResult> {
    let mut catalog = ReferenceCatalog::load(config.catalog.path.as_deref()).map_err(|error| {
        CommandResult::failure(command, "catalog", format!("catalog issue: {error}"), EXIT_CATALOG)
    })?;
    catalog.hotels = catalog.hotels.with_policy(config.booking.eligibility_policy());
    Ok(catalog)
}

/// Connects and applies pending migrations so every command sees the current schema.
pub(crate) async fn open_database(
    command: &str,
    config: &AppConfig,
) -> Result<DbPool, CommandResult> {
    let pool = connect_with_config(&config.database).await.map_err(|error| {
        CommandResult::failure(command, "db_connectivity", error.to_string(), EXIT_DB_CONNECT)
    })?;
    migrations::run_pending(&pool).await.map_err(|error| {
        CommandResult::failure(command, "migration", error.to_string(), EXIT_MIGRATION)
    })?;
    Ok(pool)
}

pub(crate) fn lifecycle(
    pool: DbPool,
    catalog: ReferenceCatalog,
    config: &AppConfig,
) -> BookingLifecycle {
    BookingLifecycle::new(
        Arc::new(SqlBookingStore::new(pool)),
        Arc::new(CatalogPricingEngine::new(Arc::new(catalog))),
    )
    .with_settings(config.lifecycle_settings())
}
