//! Core of the service intake bot.
//!
//! This crate holds the order store, the per-user conversation state machine
//! that collects orders, the status lookup and the administrator's status
//! actions, plus the engine that routes transport updates to them and the
//! builder that assembles everything from configuration.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod input;
pub mod menus;
pub mod state;
pub mod texts;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{BuilderError, IntakeBuilder, IntakeFactories};
pub use engine::{EngineError, IntakeEngine};
pub use handlers::HandlerError;
pub use input::{parse_order_id, InputFormatError};
pub use state::{
	ConversationState, FormStep, MemorySessionStore, OrderStore, OrderStoreError, SessionStore,
};
