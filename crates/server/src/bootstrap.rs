use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use yatra_agent::{AgentRuntime, BookingServices};
use yatra_core::catalog::{CatalogError, ReferenceCatalog};
use yatra_core::config::{AppConfig, ConfigError, LoadOptions};
use yatra_core::lifecycle::BookingLifecycle;
use yatra_core::notification::{
    BookingCommitHook, DisabledNotifications, NotificationDispatcher, NotificationError,
};
use yatra_core::pricing::CatalogPricingEngine;
use yatra_db::{connect_with_config, migrations, DbPool, SqlBookingStore};

use crate::webhook::WebhookTransport;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<ReferenceCatalog>,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notification setup failed: {0}")]
    Notification(#[from] NotificationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let hotels_policy = config.booking.eligibility_policy();
    let mut catalog = ReferenceCatalog::load(config.catalog.path.as_deref())?;
    catalog.hotels = catalog.hotels.with_policy(hotels_policy);
    let catalog = Arc::new(catalog);

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let lifecycle = BookingLifecycle::new(
        Arc::new(SqlBookingStore::new(db_pool.clone())),
        Arc::new(CatalogPricingEngine::new(catalog.clone())),
    )
    .with_settings(config.lifecycle_settings())
    .with_commit_hook(commit_hook(&config)?);

    let services = BookingServices { catalog: catalog.clone(), lifecycle: Arc::new(lifecycle) };
    let agent_runtime = Arc::new(AgentRuntime::with_booking_tools(Arc::new(services)));

    Ok(Application { config, db_pool, catalog, agent_runtime })
}

fn commit_hook(config: &AppConfig) -> Result<Arc<dyn BookingCommitHook>, BootstrapError> {
    let notification = &config.notification;
    let webhook_url = match (notification.enabled, notification.webhook_url.as_deref()) {
        (true, Some(url)) => url,
        _ => {
            info!(
                event_name = "system.bootstrap.notifications_disabled",
                correlation_id = "bootstrap",
                "booking confirmations will not be sent"
            );
            return Ok(Arc::new(DisabledNotifications));
        }
    };

    let transport = WebhookTransport::new(
        webhook_url,
        notification.api_key.clone(),
        Duration::from_secs(notification.timeout_secs),
    )?;
    let dispatcher =
        NotificationDispatcher::new(Arc::new(transport), notification.sender_address.clone())?;
    info!(
        event_name = "system.bootstrap.notifications_enabled",
        correlation_id = "bootstrap",
        webhook_url,
        "booking confirmations will be posted to the relay"
    );
    Ok(Arc::new(dispatcher))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use yatra_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database() {
        let result = bootstrap(options("postgres://localhost/yatra")).await;
        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }

    #[tokio::test]
    async fn bootstrap_fails_on_missing_catalog_file() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                catalog_path: Some(PathBuf::from("/nonexistent/yatra-catalog.toml")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;
        let message = result.err().expect("error").to_string();
        assert!(message.contains("catalog load failed"));
    }

    #[tokio::test]
    async fn bootstrap_wires_a_working_booking_path() {
        let app = bootstrap(options("sqlite::memory:")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'bookings'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("bookings table");
        assert_eq!(table_count, 1);

        let runtime = &app.agent_runtime;
        let session = runtime.open_session().await;
        for (tool, input) in [
            ("set_destination", json!({"destination": "Goa"})),
            ("set_origin", json!({"origin": "Mumbai"})),
            ("set_travelers", json!({"adults": 2})),
            ("select_transport_mode", json!({"mode": "bus"})),
            ("select_hotel", json!({"hotel_name": "Sea Breeze Resort"})),
            (
                "set_contact_details",
                json!({"name": "Asha Rao", "phone": "9876543210", "email": "asha@example.com"}),
            ),
        ] {
            runtime.invoke(&session, tool, input).await.expect("tool");
        }

        let reply = runtime.invoke(&session, "confirm_booking", json!({})).await.expect("confirm");
        assert!(reply.contains("total 41320.00"), "unexpected reply: {reply}");

        let (stored,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings")
            .fetch_one(&app.db_pool)
            .await
            .expect("count");
        assert_eq!(stored, 1);

        app.db_pool.close().await;
    }
}
