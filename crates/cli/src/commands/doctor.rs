use serde::Serialize;
use yatra_core::catalog::ReferenceCatalog;
use yatra_core::config::{AppConfig, LoadOptions};
use yatra_db::{connect_with_config, connection::ping, migrations::MIGRATOR, DbPool};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 4] =
    ["catalog", "notification_relay", "database_connectivity", "schema_migrations"];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let checks = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let mut checks = vec![
                DoctorCheck::new("config_validation", CheckStatus::Pass, "configuration loaded"),
                catalog_check(&config),
                notification_check(&config),
            ];
            checks.extend(database_checks(&config));
            checks
        }
        Err(error) => std::iter::once(DoctorCheck::new(
            "config_validation",
            CheckStatus::Fail,
            error.to_string(),
        ))
        .chain(DEPENDENT_CHECKS.iter().map(|&name| {
            DoctorCheck::new(name, CheckStatus::Skipped, "configuration did not load")
        }))
        .collect(),
    };

    let failed = checks.iter().filter(|check| check.status == CheckStatus::Fail).count();
    let (overall_status, summary) = if failed == 0 {
        (CheckStatus::Pass, "doctor: yatra is ready".to_string())
    } else {
        (CheckStatus::Fail, format!("doctor: {failed} check(s) failed"))
    };

    DoctorReport { overall_status, summary, checks }
}

fn catalog_check(config: &AppConfig) -> DoctorCheck {
    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "embedded catalog".to_string());

    match ReferenceCatalog::load(config.catalog.path.as_deref()) {
        Ok(catalog) => {
            let empty: Vec<&str> = catalog
                .hotels
                .destinations()
                .iter()
                .filter(|entry| !entry.hotels.iter().any(|hotel| hotel.available))
                .map(|entry| entry.name.as_str())
                .collect();
            let summary = format!(
                "{source}: {} destinations, {} routes",
                catalog.hotels.destinations().len(),
                catalog.fares.route_count()
            );
            if empty.is_empty() {
                DoctorCheck::new("catalog", CheckStatus::Pass, summary)
            } else {
                DoctorCheck::new(
                    "catalog",
                    CheckStatus::Warn,
                    format!("{summary}; no available hotels in {}", empty.join(", ")),
                )
            }
        }
        Err(error) => DoctorCheck::new("catalog", CheckStatus::Fail, format!("{source}: {error}")),
    }
}

fn notification_check(config: &AppConfig) -> DoctorCheck {
    let notification = &config.notification;
    match (notification.enabled, notification.webhook_url.as_deref()) {
        (true, Some(url)) => DoctorCheck::new(
            "notification_relay",
            CheckStatus::Pass,
            format!("confirmations posted to {url} as {}", notification.sender_address),
        ),
        _ => DoctorCheck::new(
            "notification_relay",
            CheckStatus::Pass,
            "notifications disabled; confirmations are not sent",
        ),
    }
}

fn database_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::new(
                    "database_connectivity",
                    CheckStatus::Fail,
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::new("schema_migrations", CheckStatus::Skipped, "no async runtime"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::new(
                        "database_connectivity",
                        CheckStatus::Fail,
                        format!("failed to connect to `{}`: {error}", config.database.url),
                    ),
                    DoctorCheck::new(
                        "schema_migrations",
                        CheckStatus::Skipped,
                        "database unreachable",
                    ),
                ];
            }
        };

        let checks = match ping(&pool).await {
            Ok(()) => vec![
                DoctorCheck::new(
                    "database_connectivity",
                    CheckStatus::Pass,
                    format!("connected using `{}`", config.database.url),
                ),
                migrations_check(&pool).await,
            ],
            Err(error) => vec![
                DoctorCheck::new(
                    "database_connectivity",
                    CheckStatus::Fail,
                    format!("database check failed: {error}"),
                ),
                DoctorCheck::new(
                    "schema_migrations",
                    CheckStatus::Skipped,
                    "database check failed",
                ),
            ],
        };
        pool.close().await;
        checks
    })
}

async fn migrations_check(pool: &DbPool) -> DoctorCheck {
    let known = MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .count() as i64;

    let ledger = match sqlx::query_as::<_, (i64,)>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await
    {
        Ok(row) => row,
        Err(error) => {
            return DoctorCheck::new("schema_migrations", CheckStatus::Fail, error.to_string())
        }
    };

    let applied = if ledger.0 == 0 {
        0
    } else {
        match sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(pool)
        .await
        {
            Ok((count,)) => count,
            Err(error) => {
                return DoctorCheck::new("schema_migrations", CheckStatus::Fail, error.to_string())
            }
        }
    };

    if applied >= known {
        DoctorCheck::new(
            "schema_migrations",
            CheckStatus::Pass,
            format!("{applied} of {known} migrations applied"),
        )
    } else {
        DoctorCheck::new(
            "schema_migrations",
            CheckStatus::Warn,
            format!("{applied} of {known} migrations applied; run `yatra migrate`"),
        )
    }
}

fn render_human(report: &DoctorReport) -> String {
    std::iter::once(report.summary.clone())
        .chain(report.checks.iter().map(|check| {
            let marker = match check.status {
                CheckStatus::Pass => "ok",
                CheckStatus::Warn => "warn",
                CheckStatus::Fail => "fail",
                CheckStatus::Skipped => "skip",
            };
            format!("- [{marker}] {}: {}", check.name, check.details)
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
