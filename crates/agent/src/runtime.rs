use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use yatra_core::domain::draft::BookingDraft;

use crate::tools::{BookingServices, ToolRegistry};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown session `{0}`")]
    UnknownSession(String),
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// One draft per conversation. Calls within a session run one at a time;
/// different sessions never share state.
pub struct AgentRuntime {
    services: Arc<BookingServices>,
    registry: ToolRegistry,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<BookingDraft>>>>,
}

impl AgentRuntime {
    pub fn new(services: Arc<BookingServices>, registry: ToolRegistry) -> Self {
        Self { services, registry, sessions: RwLock::new(HashMap::new()) }
    }

    pub fn with_booking_tools(services: Arc<BookingServices>) -> Self {
        Self::new(services, ToolRegistry::booking())
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn services(&self) -> &BookingServices {
        &self.services
    }

    pub async fn open_session(&self) -> SessionId {
        let session_id = SessionId::generate();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(BookingDraft::new())));
        tracing::info!(
            event_name = "session.opened",
            session_id = %session_id,
            "conversation started"
        );
        session_id
    }

    /// Drops the draft. An unconfirmed draft leaves nothing behind.
    pub async fn close_session(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        if let Some(draft) = &removed {
            let confirmed = draft.lock().await.booking_id().is_some();
            tracing::info!(
                event_name = "session.closed",
                session_id = %session_id,
                confirmed,
                "conversation ended"
            );
        }
        removed.is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn snapshot(&self, session_id: &SessionId) -> Result<BookingDraft, RuntimeError> {
        let draft = self.draft(session_id).await?;
        let guard = draft.lock().await;
        Ok(guard.clone())
    }

    pub async fn invoke(
        &self,
        session_id: &SessionId,
        tool: &str,
        input: Value,
    ) -> Result<String, RuntimeError> {
        if !self.registry.contains(tool) {
            tracing::warn!(event_name = "session.unknown_tool", session_id = %session_id, tool);
            return Err(RuntimeError::UnknownTool(tool.to_string()));
        }

        let draft = self.draft(session_id).await?;
        let mut draft = draft.lock().await;
        tracing::info!(event_name = "session.tool_invoked", session_id = %session_id, tool);

        let reply = self.registry.invoke(&self.services, &mut draft, tool, input).await?;
        Ok(reply)
    }

    async fn draft(
        &self,
        session_id: &SessionId,
    ) -> Result<Arc<Mutex<BookingDraft>>, RuntimeError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownSession(session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use yatra_core::catalog::ReferenceCatalog;
    use yatra_core::lifecycle::id::SequenceIdGenerator;
    use yatra_core::lifecycle::BookingLifecycle;
    use yatra_core::pricing::CatalogPricingEngine;
    use yatra_core::store::InMemoryBookingStore;

    use super::{AgentRuntime, RuntimeError, SessionId};
    use crate::tools::BookingServices;

    fn runtime(ids: &[&str]) -> (AgentRuntime, Arc<InMemoryBookingStore>) {
        let catalog = Arc::new(ReferenceCatalog::embedded().expect("catalog"));
        let store = Arc::new(InMemoryBookingStore::default());
        let lifecycle = BookingLifecycle::new(
            store.clone(),
            Arc::new(CatalogPricingEngine::new(catalog.clone())),
        )
        .with_id_generator(Arc::new(SequenceIdGenerator::new(ids.iter().copied())));
        let services = BookingServices { catalog, lifecycle: Arc::new(lifecycle) };
        (AgentRuntime::with_booking_tools(Arc::new(services)), store)
    }

    async fn book_goa(runtime: &AgentRuntime, session: &SessionId) -> String {
        let steps = [
            ("set_destination", json!({"destination": "Goa"})),
            ("set_origin", json!({"origin": "Mumbai"})),
            ("set_travelers", json!({"adults": 2})),
            ("select_transport_mode", json!({"mode": "bus"})),
            ("select_hotel", json!({"hotel_name": "Palm Grove Inn"})),
            (
                "set_contact_details",
                json!({"name": "Asha Rao", "phone": "9876543210", "email": "asha@example.com"}),
            ),
        ];
        for (tool, input) in steps {
            runtime.invoke(session, tool, input).await.expect("step");
        }
        runtime.invoke(session, "confirm_booking", json!({})).await.expect("confirm")
    }

    #[tokio::test]
    async fn sessions_keep_separate_drafts() {
        let (runtime, _) = runtime(&["AAAA1111"]);
        let first = runtime.open_session().await;
        let second = runtime.open_session().await;
        assert_ne!(first, second);

        runtime
            .invoke(&first, "set_destination", json!({"destination": "Jaipur"}))
            .await
            .expect("set destination");

        let other = runtime.snapshot(&second).await.expect("snapshot");
        assert!(other.destination().is_none());
        let mine = runtime.snapshot(&first).await.expect("snapshot");
        assert_eq!(mine.destination(), Some("Jaipur"));
    }

    #[tokio::test]
    async fn identical_drafts_get_distinct_ids() {
        let (runtime, store) = runtime(&["AAAA1111", "BBBB2222"]);
        let first = runtime.open_session().await;
        let second = runtime.open_session().await;

        let first_reply = book_goa(&runtime, &first).await;
        let second_reply = book_goa(&runtime, &second).await;

        assert!(first_reply.contains("Booking ID: AAAA1111"));
        assert!(second_reply.contains("Booking ID: BBBB2222"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn exhausted_ids_abort_the_turn() {
        let (runtime, _) = runtime(&["AAAA1111"]);
        let first = runtime.open_session().await;
        let second = runtime.open_session().await;
        book_goa(&runtime, &first).await;

        let steps = [
            ("set_destination", json!({"destination": "Goa"})),
            ("set_origin", json!({"origin": "Mumbai"})),
            ("set_travelers", json!({"adults": 2})),
            ("select_transport_mode", json!({"mode": "bus"})),
            ("select_hotel", json!({"hotel_name": "Palm Grove Inn"})),
            (
                "set_contact_details",
                json!({"name": "Asha Rao", "phone": "9876543210", "email": "asha@example.com"}),
            ),
        ];
        for (tool, input) in steps {
            runtime.invoke(&second, tool, input).await.expect("step");
        }
        let error = runtime
            .invoke(&second, "confirm_booking", json!({}))
            .await
            .expect_err("every id collides");
        assert!(matches!(error, RuntimeError::Fatal(_)));
    }

    #[tokio::test]
    async fn unknown_session_and_tool_are_typed_errors() {
        let (runtime, _) = runtime(&["AAAA1111"]);
        let missing = SessionId("no-such-session".to_string());
        let error =
            runtime.invoke(&missing, "booking_status", json!({})).await.expect_err("session");
        assert!(matches!(error, RuntimeError::UnknownSession(_)));

        let session = runtime.open_session().await;
        let error = runtime.invoke(&session, "teleport", json!({})).await.expect_err("tool");
        assert!(matches!(error, RuntimeError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn closing_an_unconfirmed_session_persists_nothing() {
        let (runtime, store) = runtime(&["AAAA1111"]);
        let session = runtime.open_session().await;
        runtime
            .invoke(&session, "set_destination", json!({"destination": "Goa"}))
            .await
            .expect("set destination");

        assert!(runtime.close_session(&session).await);
        assert!(!runtime.close_session(&session).await);
        assert_eq!(runtime.session_count().await, 0);
        assert!(store.is_empty().await);
    }
}
