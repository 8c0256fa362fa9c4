//! Menu navigation.

use super::HandlerError;
use crate::menus;
use crate::state::SessionStore;
use crate::texts;
use intake_transport::TransportService;
use intake_types::{ChatId, Menu, MessageId, Reply, UserId};
use std::sync::Arc;

/// Handler for commands and selections that only redraw menus.
///
/// Selections edit the message that carried the menu. Navigation does not
/// touch an unfinished flow; only `/start` and `/cancel` end it.
pub struct MenuHandler {
	transport: Arc<TransportService>,
	sessions: Arc<dyn SessionStore>,
}

impl MenuHandler {
	pub fn new(transport: Arc<TransportService>, sessions: Arc<dyn SessionStore>) -> Self {
		Self {
			transport,
			sessions,
		}
	}

	/// `/start`: forgets any flow and greets the user.
	pub async fn start(&self, chat: ChatId, user: UserId) -> Result<(), HandlerError> {
		self.sessions.clear(user).await;
		self.transport
			.send(chat, &Reply::with_menu(texts::WELCOME, menus::start_menu()))
			.await?;
		Ok(())
	}

	/// `/cancel`: ends any flow and shows the main menu.
	pub async fn cancel(&self, chat: ChatId, user: UserId) -> Result<(), HandlerError> {
		if let Some(state) = self.sessions.clear(user).await {
			tracing::debug!(user = %user, ?state, "Session cancelled");
		}
		self.transport
			.send(
				chat,
				&Reply::with_menu(
					format!("{}\n{}", texts::CANCELLED, texts::MAIN_MENU),
					menus::main_menu(),
				),
			)
			.await?;
		Ok(())
	}

	pub async fn show_main(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
	) -> Result<(), HandlerError> {
		self.show(chat, message_id, texts::MAIN_MENU, menus::main_menu())
			.await
	}

	pub async fn show_services(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
	) -> Result<(), HandlerError> {
		self.show(chat, message_id, texts::SERVICES, menus::services_menu())
			.await
	}

	/// Shows a service description under the services menu.
	pub async fn show_service_info(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		description: &str,
	) -> Result<(), HandlerError> {
		self.show(chat, message_id, description, menus::services_menu())
			.await
	}

	pub async fn show_edit_menu(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
	) -> Result<(), HandlerError> {
		self.show(chat, message_id, texts::EDIT_MENU, menus::edit_menu())
			.await
	}

	/// Free text outside any flow.
	pub async fn idle_text(&self, chat: ChatId) -> Result<(), HandlerError> {
		self.transport
			.send(chat, &Reply::with_menu(texts::MAIN_MENU, menus::main_menu()))
			.await?;
		Ok(())
	}

	async fn show(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		text: &str,
		menu: Menu,
	) -> Result<(), HandlerError> {
		self.transport
			.show(chat, message_id, &Reply::with_menu(text, menu))
			.await?;
		Ok(())
	}
}
