//! State owned by the core: the durable order collection and the ephemeral
//! per-user conversation sessions.

pub mod order;
pub mod session;

pub use order::{OrderStore, OrderStoreError, NOT_FOUND_TEXT};
pub use session::{ConversationState, FormStep, MemorySessionStore, SessionStore};
