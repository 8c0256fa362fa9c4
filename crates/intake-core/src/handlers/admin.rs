//! Administrator panel and order status actions.
//!
//! Every entry point checks the sender against the configured administrator
//! before reading or changing anything.

use super::HandlerError;
use crate::input::parse_order_id;
use crate::menus::{self, Action};
use crate::state::{ConversationState, OrderStore, OrderStoreError, SessionStore, NOT_FOUND_TEXT};
use crate::texts;
use intake_transport::TransportService;
use intake_types::{ChatId, MessageId, Order, Reply, UserId};
use std::sync::Arc;
use tracing::instrument;

/// Handler for the administrator's view of orders.
pub struct AdminHandler {
	transport: Arc<TransportService>,
	orders: Arc<OrderStore>,
	sessions: Arc<dyn SessionStore>,
	admin_id: UserId,
}

impl AdminHandler {
	pub fn new(
		transport: Arc<TransportService>,
		orders: Arc<OrderStore>,
		sessions: Arc<dyn SessionStore>,
		admin_id: UserId,
	) -> Self {
		Self {
			transport,
			orders,
			sessions,
			admin_id,
		}
	}

	pub fn is_admin(&self, user: UserId) -> bool {
		user == self.admin_id
	}

	/// Opens the panel by asking for an order id.
	///
	/// Returns the notice to acknowledge the selection with.
	pub async fn open_panel(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		user: UserId,
	) -> Result<Option<String>, HandlerError> {
		if !self.is_admin(user) {
			tracing::warn!(user = %user, "Admin panel refused");
			return Ok(Some(texts::ACCESS_DENIED.to_string()));
		}

		self.sessions
			.set(user, ConversationState::AwaitingAdminOrderId)
			.await;
		self.transport
			.show(chat, message_id, &Reply::text(texts::ADMIN_PANEL))
			.await?;
		Ok(None)
	}

	/// Answers the order id typed into the panel with the order card.
	pub async fn handle_input(
		&self,
		chat: ChatId,
		user: UserId,
		text: &str,
	) -> Result<(), HandlerError> {
		self.sessions.clear(user).await;
		if !self.is_admin(user) {
			self.transport
				.send(chat, &Reply::text(texts::ACCESS_DENIED))
				.await?;
			return Ok(());
		}

		let reply = match parse_order_id(text) {
			Err(e) => {
				tracing::debug!(error = %e, "Admin entered a malformed id");
				Reply::text(texts::INVALID_ID)
			},
			Ok(id) => match self.orders.get_order(id).await {
				Ok(order) => {
					Reply::with_menu(texts::order_card(&order), menus::order_actions_menu(id))
				},
				Err(OrderStoreError::OrderNotFound(_)) => Reply::text(NOT_FOUND_TEXT),
				Err(e) => {
					tracing::error!(order_id = %id, error = %e, "Failed to load order");
					Reply::text(texts::STATUS_FAILED)
				},
			},
		};

		self.transport.send(chat, &reply).await?;
		Ok(())
	}

	/// Applies a status action and returns the notice for the selection.
	///
	/// On success the order card the action came from is redrawn with the
	/// new status.
	#[instrument(skip_all, fields(user = %user, action = %action.key()))]
	pub async fn apply(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		user: UserId,
		action: Action,
	) -> Result<String, HandlerError> {
		if !self.is_admin(user) {
			tracing::warn!("Status change refused");
			return Ok(texts::ACCESS_DENIED.to_string());
		}
		let Some((id, status)) = action.target_status() else {
			return Ok(texts::MALFORMED_ACTION.to_string());
		};

		match self.orders.update_status(id, status).await {
			Ok(order) => {
				if let Some(message_id) = message_id {
					let card = Reply::with_menu(
						texts::order_card(&order),
						menus::order_actions_menu(order.id),
					);
					if let Err(e) = self.transport.edit(chat, message_id, &card).await {
						tracing::warn!(error = %e, "Failed to refresh order card");
					}
				}
				Ok(texts::status_changed(id, status))
			},
			Err(e) => {
				tracing::warn!(order_id = %id, error = %e, "Status change failed");
				Ok(texts::status_change_failed(id))
			},
		}
	}

	/// Sends the administrator the new order with its action menu.
	pub async fn notify_new_order(&self, order: &Order) -> Result<(), HandlerError> {
		let reply = Reply::with_menu(
			texts::new_order_notice(order),
			menus::order_actions_menu(order.id),
		);
		self.transport.send(ChatId(self.admin_id.0), &reply).await?;
		tracing::debug!(order_id = %order.id, "Administrator notified");
		Ok(())
	}
}
