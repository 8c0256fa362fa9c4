//! Intake engine that dispatches user updates.
//!
//! The engine receives updates from the transport and routes each one to a
//! handler: free text goes to the flow the user is in, commands and menu
//! selections go to navigation or start a flow. Updates are handled one at
//! a time, which keeps every user's updates in order.

use crate::handlers::{AdminHandler, HandlerError, MenuHandler, OrderFormHandler, StatusHandler};
use crate::menus::{Action, ActionParseError};
use crate::state::{ConversationState, FormStep, OrderStore, SessionStore};
use crate::texts;
use intake_config::Config;
use intake_transport::TransportService;
use intake_types::{ChatId, EventKind, InboundEvent, MessageId, UserId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::instrument;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Service error: {0}")]
	Service(String),
}

/// Main engine of the intake bot.
pub struct IntakeEngine {
	config: Config,
	transport: Arc<TransportService>,
	orders: Arc<OrderStore>,
	sessions: Arc<dyn SessionStore>,
	menu_handler: MenuHandler,
	order_form_handler: OrderFormHandler,
	status_handler: StatusHandler,
	admin_handler: Arc<AdminHandler>,
}

impl IntakeEngine {
	/// Creates a new engine with the given services.
	pub fn new(
		config: Config,
		transport: Arc<TransportService>,
		orders: Arc<OrderStore>,
		sessions: Arc<dyn SessionStore>,
	) -> Self {
		let admin_handler = Arc::new(AdminHandler::new(
			transport.clone(),
			orders.clone(),
			sessions.clone(),
			config.bot.admin_id,
		));
		let menu_handler = MenuHandler::new(transport.clone(), sessions.clone());
		let order_form_handler = OrderFormHandler::new(
			transport.clone(),
			orders.clone(),
			sessions.clone(),
			admin_handler.clone(),
		);
		let status_handler = StatusHandler::new(transport.clone(), orders.clone(), sessions.clone());

		Self {
			config,
			transport,
			orders,
			sessions,
			menu_handler,
			order_form_handler,
			status_handler,
			admin_handler,
		}
	}

	/// Main loop: runs until Ctrl-C or until the transport stops delivering.
	pub async fn run(&self) -> Result<(), EngineError> {
		let (event_tx, mut event_rx) = mpsc::unbounded_channel();
		self.transport
			.start(event_tx)
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;

		tracing::info!(admin = %self.config.bot.admin_id, "Intake bot started");

		loop {
			tokio::select! {
				event = event_rx.recv() => {
					match event {
						Some(event) => self.process(event).await,
						None => {
							tracing::info!("Transport closed");
							break;
						},
					}
				}

				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown requested");
					break;
				}
			}
		}

		self.transport
			.stop()
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;

		Ok(())
	}

	/// Handles one update to completion. Failures are logged, never returned.
	pub async fn process(&self, event: InboundEvent) {
		let update_id = event.update_id;
		match self.handle_event(event).await {
			Ok(()) => tracing::debug!(update_id, "Update handled"),
			Err(e) => tracing::error!(update_id, error = %e, "Failed to handle update"),
		}
	}

	/// Returns the order store.
	pub fn orders(&self) -> &Arc<OrderStore> {
		&self.orders
	}

	#[instrument(skip_all, fields(update_id = event.update_id, user = %event.user))]
	async fn handle_event(&self, event: InboundEvent) -> Result<(), HandlerError> {
		let InboundEvent {
			chat, user, kind, ..
		} = event;

		match kind {
			EventKind::Command(command) => match command.as_str() {
				"start" => self.menu_handler.start(chat, user).await,
				"cancel" => self.menu_handler.cancel(chat, user).await,
				_ => self.handle_text(chat, user, &format!("/{}", command)).await,
			},
			EventKind::Text(text) => self.handle_text(chat, user, &text).await,
			EventKind::Selection {
				selection_id,
				message_id,
				key,
			} => {
				let result = self.handle_selection(chat, user, message_id, &key).await;
				let notice = result.as_ref().ok().and_then(|n| n.as_deref());
				if let Err(e) = self.transport.answer(&selection_id, notice).await {
					tracing::warn!(error = %e, "Failed to acknowledge selection");
				}
				result.map(|_| ())
			},
		}
	}

	/// Routes free text into the flow the user is in.
	async fn handle_text(&self, chat: ChatId, user: UserId, text: &str) -> Result<(), HandlerError> {
		match self.sessions.get(user).await {
			Some(ConversationState::OrderForm { step, draft }) => {
				self.order_form_handler
					.handle_input(chat, user, step, draft, text)
					.await
			},
			Some(ConversationState::AwaitingRequestId) => {
				self.status_handler.handle_input(chat, user, text).await
			},
			Some(ConversationState::AwaitingAdminOrderId) => {
				self.admin_handler.handle_input(chat, user, text).await
			},
			None => self.menu_handler.idle_text(chat).await,
		}
	}

	/// Handles a menu selection and returns the notice to acknowledge it with.
	async fn handle_selection(
		&self,
		chat: ChatId,
		user: UserId,
		message_id: Option<MessageId>,
		key: &str,
	) -> Result<Option<String>, HandlerError> {
		let action = match key.parse::<Action>() {
			Ok(action) => action,
			Err(ActionParseError::MalformedId(key)) => {
				tracing::warn!(key = %key, "Selection carries a malformed order id");
				return Ok(Some(texts::MALFORMED_ACTION.to_string()));
			},
			Err(ActionParseError::Unknown(key)) => {
				tracing::warn!(key = %key, "Unknown selection");
				return Ok(None);
			},
		};

		let menu = &self.menu_handler;
		let form = &self.order_form_handler;
		match action {
			Action::StartWork | Action::BackToMain => menu.show_main(chat, message_id).await?,
			Action::Services => menu.show_services(chat, message_id).await?,
			Action::ComputerHelp => {
				menu.show_service_info(chat, message_id, texts::COMPUTER_HELP)
					.await?
			},
			Action::Installation => {
				menu.show_service_info(chat, message_id, texts::INSTALLATION)
					.await?
			},
			Action::EditRequest => menu.show_edit_menu(chat, message_id).await?,
			Action::OrderVisit => {
				form.begin(chat, message_id, user, texts::ASK_FULL_NAME_VISIT)
					.await?
			},
			Action::ApplyRequest => {
				form.begin(chat, message_id, user, texts::ASK_FULL_NAME)
					.await?
			},
			Action::EditName => form.edit(chat, message_id, user, FormStep::FullName).await?,
			Action::EditAddress => form.edit(chat, message_id, user, FormStep::Address).await?,
			Action::EditPhone => form.edit(chat, message_id, user, FormStep::Phone).await?,
			Action::StatusRequest => self.status_handler.begin(chat, message_id, user).await?,
			Action::AdminPanel => {
				return self
					.admin_handler
					.open_panel(chat, message_id, user)
					.await
			},
			Action::MarkProcessed(_) | Action::MarkInProgress(_) => {
				return self
					.admin_handler
					.apply(chat, message_id, user, action)
					.await
					.map(Some)
			},
		}
		Ok(None)
	}
}
