//! Status lookup: one id in, one answer out.

use super::HandlerError;
use crate::input::parse_order_id;
use crate::state::{ConversationState, OrderStore, SessionStore};
use crate::texts;
use intake_transport::TransportService;
use intake_types::{ChatId, MessageId, Reply, UserId};
use std::sync::Arc;

pub struct StatusHandler {
	transport: Arc<TransportService>,
	orders: Arc<OrderStore>,
	sessions: Arc<dyn SessionStore>,
}

impl StatusHandler {
	pub fn new(
		transport: Arc<TransportService>,
		orders: Arc<OrderStore>,
		sessions: Arc<dyn SessionStore>,
	) -> Self {
		Self {
			transport,
			orders,
			sessions,
		}
	}

	pub async fn begin(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		user: UserId,
	) -> Result<(), HandlerError> {
		self.sessions
			.set(user, ConversationState::AwaitingRequestId)
			.await;
		self.transport
			.show(chat, message_id, &Reply::text(texts::ASK_REQUEST_ID))
			.await?;
		Ok(())
	}

	/// Answers the typed id. The lookup ends here whatever the outcome.
	pub async fn handle_input(
		&self,
		chat: ChatId,
		user: UserId,
		text: &str,
	) -> Result<(), HandlerError> {
		self.sessions.clear(user).await;

		let answer = match parse_order_id(text) {
			Err(e) => {
				tracing::debug!(user = %user, error = %e, "Malformed order id");
				texts::INVALID_ID.to_string()
			},
			Ok(id) => match self.orders.get_status_text(id).await {
				Ok(status) => status,
				Err(e) => {
					tracing::error!(order_id = %id, error = %e, "Status lookup failed");
					texts::STATUS_FAILED.to_string()
				},
			},
		};

		self.transport.send(chat, &Reply::text(answer)).await?;
		Ok(())
	}
}
