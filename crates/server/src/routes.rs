//! HTTP surface for the external dialogue orchestrator.
//!
//! - `POST   /sessions`                    open a conversation
//! - `DELETE /sessions/{id}`               abandon a conversation
//! - `POST   /sessions/{id}/tools/{tool}`  run one tool, returns `{ "reply": ... }`
//! - `GET    /tools`                       tool names and descriptions
//! - `GET    /bookings/{id}`               committed booking record

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};
use uuid::Uuid;

use yatra_agent::{AgentRuntime, RuntimeError, SessionId};
use yatra_core::domain::booking::BookingRecord;
use yatra_core::errors::InterfaceError;

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToolReply {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", delete(close_session))
        .route("/sessions/{id}/tools/{tool}", post(invoke_tool))
        .route("/tools", get(list_tools))
        .route("/bookings/{id}", get(get_booking))
        .with_state(ApiState { runtime })
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn api_error(
    status: StatusCode,
    error: impl Into<String>,
    correlation_id: String,
) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: error.into(), correlation_id }))
}

fn interface_response(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, error.user_message(), error.correlation_id().to_string())
}

async fn open_session(State(state): State<ApiState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.runtime.open_session().await;
    (StatusCode::CREATED, Json(SessionResponse { session_id: session_id.to_string() }))
}

async fn close_session(Path(id): Path<String>, State(state): State<ApiState>) -> Response {
    if state.runtime.close_session(&SessionId(id)).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, "session not found", correlation_id()).into_response()
    }
}

async fn invoke_tool(
    Path((id, tool)): Path<(String, String)>,
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<Json<ToolReply>> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|parse_error| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("request body must be JSON: {parse_error}"),
                correlation_id(),
            )
        })?
    };

    match state.runtime.invoke(&SessionId(id.clone()), &tool, input).await {
        Ok(reply) => Ok(Json(ToolReply { reply })),
        Err(RuntimeError::UnknownSession(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, "session not found", correlation_id()))
        }
        Err(RuntimeError::UnknownTool(name)) => {
            let message = format!("unknown tool `{name}`");
            Err(api_error(StatusCode::NOT_FOUND, message, correlation_id()))
        }
        Err(RuntimeError::Fatal(fatal)) => {
            let correlation_id = correlation_id();
            error!(
                event_name = "api.tool_failed",
                correlation_id = %correlation_id,
                session_id = %id,
                tool = %tool,
                error = %fatal,
                "tool invocation failed"
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected internal error occurred.",
                correlation_id,
            ))
        }
    }
}

async fn list_tools(State(state): State<ApiState>) -> Json<Vec<ToolInfo>> {
    Json(
        state
            .runtime
            .registry()
            .describe()
            .into_iter()
            .map(|(name, description)| ToolInfo {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect(),
    )
}

async fn get_booking(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> ApiResult<Json<BookingRecord>> {
    let correlation_id = correlation_id();
    state.runtime.services().lifecycle.retrieve(&id).await.map(Json).map_err(|application_error| {
        warn!(
            event_name = "api.booking_lookup_failed",
            correlation_id = %correlation_id,
            error = %application_error,
            "booking lookup failed"
        );
        interface_response(application_error.into_interface(correlation_id.clone()))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use yatra_agent::{AgentRuntime, BookingServices};
    use yatra_core::catalog::ReferenceCatalog;
    use yatra_core::lifecycle::BookingLifecycle;
    use yatra_core::pricing::CatalogPricingEngine;
    use yatra_core::store::InMemoryBookingStore;

    use super::router;

    fn app() -> Router {
        let catalog = Arc::new(ReferenceCatalog::embedded().expect("catalog"));
        let lifecycle = BookingLifecycle::new(
            Arc::new(InMemoryBookingStore::default()),
            Arc::new(CatalogPricingEngine::new(catalog.clone())),
        );
        let services = BookingServices { catalog, lifecycle: Arc::new(lifecycle) };
        router(Arc::new(AgentRuntime::with_booking_tools(Arc::new(services))))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    async fn open(app: &Router) -> String {
        let (status, payload) = send(app, Method::POST, "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        payload["session_id"].as_str().expect("session id").to_string()
    }

    #[tokio::test]
    async fn tool_call_returns_reply() {
        let app = app();
        let session = open(&app).await;

        let (status, payload) = send(
            &app,
            Method::POST,
            &format!("/sessions/{session}/tools/set_destination"),
            Some(json!({"destination": "jaipur"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            payload["reply"],
            "Destination set to Jaipur. Which city will you be travelling from?"
        );
    }

    #[tokio::test]
    async fn empty_body_is_accepted_for_argumentless_tools() {
        let app = app();
        let session = open(&app).await;

        let (status, payload) =
            send(&app, Method::POST, &format!("/sessions/{session}/tools/booking_status"), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        let reply = payload["reply"].as_str().expect("reply");
        assert!(reply.starts_with("Nothing has been collected yet."));
    }

    #[tokio::test]
    async fn full_trip_can_be_fetched_as_a_booking() {
        let app = app();
        let session = open(&app).await;
        for (tool, input) in [
            ("set_destination", json!({"destination": "Goa"})),
            ("set_origin", json!({"origin": "Mumbai"})),
            ("set_travelers", json!({"adults": 2})),
            ("select_transport_mode", json!({"mode": "bus"})),
            ("select_hotel", json!({"hotel_name": "Palm Grove Inn"})),
            (
                "set_contact_details",
                json!({"name": "Asha Rao", "phone": "9876543210", "email": "asha@example.com"}),
            ),
        ] {
            let (status, _) =
                send(&app, Method::POST, &format!("/sessions/{session}/tools/{tool}"), Some(input))
                    .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, payload) =
            send(&app, Method::POST, &format!("/sessions/{session}/tools/confirm_booking"), None)
                .await;
        let reply = payload["reply"].as_str().expect("reply");
        let booking_id = reply
            .split("Booking ID: ")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .expect("booking id in reply");

        let uri = format!("/bookings/{}", booking_id.to_lowercase());
        let (status, record) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["booking_id"], booking_id);
        assert_eq!(record["status"], "confirmed");
        assert_eq!(record["travel_mode"], "bus");
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let app = app();
        let (status, payload) = send(&app, Method::GET, "/bookings/ZZ99ZZ99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["error"], "The requested booking does not exist.");
        assert!(payload["correlation_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn unknown_session_or_tool_is_not_found() {
        let app = app();
        let (status, _) =
            send(&app, Method::POST, "/sessions/missing/tools/booking_status", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let session = open(&app).await;
        let (status, payload) =
            send(&app, Method::POST, &format!("/sessions/{session}/tools/teleport"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["error"], "unknown tool `teleport`");
    }

    #[tokio::test]
    async fn invalid_json_body_is_bad_request() {
        let app = app();
        let session = open(&app).await;
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri(format!("/sessions/{session}/tools/set_origin"))
            .body(Body::from("{not json"))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn closing_a_session_twice_reports_not_found() {
        let app = app();
        let session = open(&app).await;
        let (status, _) = send(&app, Method::DELETE, &format!("/sessions/{session}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &format!("/sessions/{session}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
