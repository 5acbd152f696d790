//! Dialogue tool contract for the booking assistant.
//!
//! The language-model loop lives outside this crate. It calls named tools
//! with JSON arguments and speaks the returned string back to the user:
//! - `tools` - typed booking tools and the registry that dispatches them
//! - `conversation` - reply wording, corrective prompts, next-question hints
//! - `runtime` - per-conversation drafts keyed by session id
//!
//! The model never prices, filters or commits anything itself. Those
//! decisions come from `yatra-core`.

pub mod conversation;
pub mod runtime;
pub mod tools;

pub use runtime::{AgentRuntime, RuntimeError, SessionId};
pub use tools::{BookingServices, Tool, ToolError, ToolRegistry};
