//! Order form flow.
//!
//! Collects full name, address, phone and reason one message at a time,
//! storing each answer verbatim, then commits the order.

use super::{AdminHandler, HandlerError};
use crate::state::{ConversationState, FormStep, OrderStore, SessionStore};
use crate::texts;
use intake_transport::TransportService;
use intake_types::{ChatId, MessageId, OrderDraft, Reply, UserId};
use std::sync::Arc;
use tracing::instrument;

/// Handler for the order form.
pub struct OrderFormHandler {
	transport: Arc<TransportService>,
	orders: Arc<OrderStore>,
	sessions: Arc<dyn SessionStore>,
	admin: Arc<AdminHandler>,
}

impl OrderFormHandler {
	pub fn new(
		transport: Arc<TransportService>,
		orders: Arc<OrderStore>,
		sessions: Arc<dyn SessionStore>,
		admin: Arc<AdminHandler>,
	) -> Self {
		Self {
			transport,
			orders,
			sessions,
			admin,
		}
	}

	/// Starts an empty form with the given name prompt.
	pub async fn begin(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		user: UserId,
		prompt: &str,
	) -> Result<(), HandlerError> {
		self.sessions
			.set(
				user,
				ConversationState::OrderForm {
					step: FormStep::FullName,
					draft: OrderDraft::default(),
				},
			)
			.await;
		self.transport
			.show(chat, message_id, &Reply::text(prompt))
			.await?;
		Ok(())
	}

	/// Jumps to a single field, keeping what an unfinished form collected.
	///
	/// The form then continues with the following steps and commits a new
	/// order.
	pub async fn edit(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		user: UserId,
		step: FormStep,
	) -> Result<(), HandlerError> {
		let draft = match self.sessions.get(user).await {
			Some(ConversationState::OrderForm { draft, .. }) => draft,
			_ => OrderDraft::default(),
		};
		let prompt = match step {
			FormStep::FullName => texts::ASK_NEW_NAME,
			FormStep::Address => texts::ASK_NEW_ADDRESS,
			FormStep::Phone => texts::ASK_NEW_PHONE,
			FormStep::Reason => texts::ASK_REASON,
		};

		self.sessions
			.set(user, ConversationState::OrderForm { step, draft })
			.await;
		self.transport
			.show(chat, message_id, &Reply::text(prompt))
			.await?;
		Ok(())
	}

	/// Stores the answer for the current step and moves on.
	#[instrument(skip_all, fields(user = %user, step = ?step))]
	pub async fn handle_input(
		&self,
		chat: ChatId,
		user: UserId,
		step: FormStep,
		mut draft: OrderDraft,
		text: &str,
	) -> Result<(), HandlerError> {
		let value = Some(text.to_string());
		match step {
			FormStep::FullName => draft.full_name = value,
			FormStep::Address => draft.address = value,
			FormStep::Phone => draft.phone_number = value,
			FormStep::Reason => draft.reason = value,
		}

		match step.next() {
			Some(next) => {
				let prompt = match next {
					FormStep::FullName => texts::ASK_FULL_NAME,
					FormStep::Address => texts::ASK_ADDRESS,
					FormStep::Phone => texts::ASK_PHONE,
					FormStep::Reason => texts::ASK_REASON,
				};
				self.sessions
					.set(user, ConversationState::OrderForm { step: next, draft })
					.await;
				self.transport.send(chat, &Reply::text(prompt)).await?;
				Ok(())
			},
			None => self.commit(chat, user, draft).await,
		}
	}

	async fn commit(
		&self,
		chat: ChatId,
		user: UserId,
		draft: OrderDraft,
	) -> Result<(), HandlerError> {
		self.sessions.clear(user).await;

		let id = match self.orders.append_order(draft.clone()).await {
			Ok(id) => id,
			Err(e) => {
				tracing::error!(error = %e, "Failed to store order");
				self.transport
					.send(chat, &Reply::text(texts::ORDER_FAILED))
					.await?;
				return Ok(());
			},
		};

		let order = draft.into_order(id);
		self.transport
			.send(chat, &Reply::text(texts::order_confirmation(&order)))
			.await?;

		if let Err(e) = self.admin.notify_new_order(&order).await {
			tracing::warn!(order_id = %id, error = %e, "Failed to notify administrator");
		}
		Ok(())
	}
}
