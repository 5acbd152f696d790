use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use yatra_agent::AgentRuntime;
use yatra_db::{connection::ping, DbPool};

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: Readiness,
    pub database: Readiness,
    pub database_detail: Option<String>,
    pub open_sessions: usize,
    pub tools: usize,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Only the database decides readiness; sessions are reported for operators.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, database_detail) = match ping(&state.db_pool).await {
        Ok(()) => (Readiness::Ready, None),
        Err(error) => {
            tracing::warn!(event_name = "system.health.database_degraded", error = %error);
            (Readiness::Degraded, Some(format!("database query failed: {error}")))
        }
    };

    let status_code =
        if database == Readiness::Ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let payload = HealthResponse {
        status: database.clone(),
        database,
        database_detail,
        open_sessions: state.runtime.session_count().await,
        tools: state.runtime.registry().len(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (status_code, Json(payload))
}
