//! Per-user conversation sessions.
//!
//! A session exists only while a user is inside a multi-step flow. No
//! session means the user is idle. Sessions live in memory and are lost on
//! restart.

use async_trait::async_trait;
use intake_types::{OrderDraft, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Field the order form expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
	FullName,
	Address,
	Phone,
	Reason,
}

impl FormStep {
	/// Step after this one, `None` after the reason.
	pub fn next(self) -> Option<FormStep> {
		match self {
			FormStep::FullName => Some(FormStep::Address),
			FormStep::Address => Some(FormStep::Phone),
			FormStep::Phone => Some(FormStep::Reason),
			FormStep::Reason => None,
		}
	}
}

/// What a user is in the middle of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
	/// Filling the order form.
	OrderForm { step: FormStep, draft: OrderDraft },
	/// Status lookup waiting for an order id.
	AwaitingRequestId,
	/// Admin panel waiting for the id of the order to act on.
	AwaitingAdminOrderId,
}

/// Mapping from user identity to conversation state.
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Returns the user's session, `None` when idle.
	async fn get(&self, user: UserId) -> Option<ConversationState>;

	/// Replaces the user's session.
	async fn set(&self, user: UserId, state: ConversationState);

	/// Ends the user's session and returns what it held.
	async fn clear(&self, user: UserId) -> Option<ConversationState>;
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
	sessions: RwLock<HashMap<UserId, ConversationState>>,
}

impl MemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SessionStore for MemorySessionStore {
	async fn get(&self, user: UserId) -> Option<ConversationState> {
		self.sessions.read().await.get(&user).cloned()
	}

	async fn set(&self, user: UserId, state: ConversationState) {
		self.sessions.write().await.insert(user, state);
	}

	async fn clear(&self, user: UserId) -> Option<ConversationState> {
		self.sessions.write().await.remove(&user)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_form_step_sequence() {
		let mut steps = vec![FormStep::FullName];
		while let Some(next) = steps.last().and_then(|s| s.next()) {
			steps.push(next);
		}
		assert_eq!(
			steps,
			vec![
				FormStep::FullName,
				FormStep::Address,
				FormStep::Phone,
				FormStep::Reason
			]
		);
	}

	#[tokio::test]
	async fn test_sessions_are_per_user() {
		let sessions = MemorySessionStore::new();
		sessions
			.set(UserId(1), ConversationState::AwaitingRequestId)
			.await;

		assert_eq!(
			sessions.get(UserId(1)).await,
			Some(ConversationState::AwaitingRequestId)
		);
		assert_eq!(sessions.get(UserId(2)).await, None);

		assert!(sessions.clear(UserId(1)).await.is_some());
		assert_eq!(sessions.get(UserId(1)).await, None);
		assert!(sessions.clear(UserId(1)).await.is_none());
	}
}
