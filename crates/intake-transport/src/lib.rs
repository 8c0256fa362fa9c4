//! Messaging transport module for the intake bot.
//!
//! This module is the boundary between the core and a concrete chat network.
//! A transport delivers inbound updates (commands, free text, menu
//! selections) tagged with chat and user identity, sends replies with
//! optional menus, edits previously sent messages in place, and acknowledges
//! menu selections. Delivery is best-effort and ordered per user.

use async_trait::async_trait;
use intake_types::{
	ChatId, ConfigSchema, ImplementationRegistry, InboundEvent, MessageId, Reply, SecretString,
};
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod console;
	pub mod telegram;
}

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The remote API rejected a request.
	#[error("API error: {0}")]
	Api(String),
	/// A response could not be decoded.
	#[error("Parse error: {0}")]
	Parse(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// `start` was called on a transport that is already receiving.
	#[error("Already running")]
	AlreadyRunning,
}

/// Trait defining the interface for messaging transports.
#[async_trait]
pub trait TransportInterface: Send + Sync {
	/// Returns the configuration schema for this transport implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Starts receiving updates and forwards them through the channel until
	/// `stop` is called or the receiver is dropped.
	async fn start(&self, sender: mpsc::UnboundedSender<InboundEvent>)
		-> Result<(), TransportError>;

	/// Stops receiving updates.
	async fn stop(&self) -> Result<(), TransportError>;

	/// Sends a new message and returns its id.
	async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError>;

	/// Replaces text and menu of a previously sent message.
	async fn edit_message(
		&self,
		chat: ChatId,
		message_id: MessageId,
		reply: &Reply,
	) -> Result<(), TransportError>;

	/// Acknowledges a menu selection, optionally with a short notice.
	async fn answer_selection(
		&self,
		selection_id: &str,
		text: Option<&str>,
	) -> Result<(), TransportError>;
}

/// Type alias for transport factory functions.
///
/// Factories receive their implementation table and the bot credential.
pub type TransportFactory =
	fn(&toml::Value, &SecretString) -> Result<Box<dyn TransportInterface>, TransportError>;

/// Registry trait for transport implementations.
pub trait TransportRegistry: ImplementationRegistry<Factory = TransportFactory> {}

/// Get all registered transport implementations.
pub fn get_all_implementations() -> Vec<(&'static str, TransportFactory)> {
	use implementations::{console, telegram};

	vec![
		(telegram::Registry::NAME, telegram::Registry::factory()),
		(console::Registry::NAME, console::Registry::factory()),
	]
}

/// Service wrapping the active transport.
///
/// Adds logging and the "edit in place, fall back to a new message" policy
/// used by menu navigation.
pub struct TransportService {
	implementation: Box<dyn TransportInterface>,
}

impl TransportService {
	/// Creates a new TransportService over the given implementation.
	pub fn new(implementation: Box<dyn TransportInterface>) -> Self {
		Self { implementation }
	}

	/// Starts receiving updates.
	pub async fn start(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		self.implementation.start(sender).await
	}

	/// Stops receiving updates.
	pub async fn stop(&self) -> Result<(), TransportError> {
		self.implementation.stop().await
	}

	/// Sends a new message.
	pub async fn send(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
		let message_id = self.implementation.send_message(chat, reply).await?;
		tracing::debug!(chat = %chat, "Message sent");
		Ok(message_id)
	}

	/// Edits a message in place.
	pub async fn edit(
		&self,
		chat: ChatId,
		message_id: MessageId,
		reply: &Reply,
	) -> Result<(), TransportError> {
		self.implementation
			.edit_message(chat, message_id, reply)
			.await
	}

	/// Shows a reply by editing the given message, or by sending a new one
	/// when there is no message to edit or the edit is refused.
	pub async fn show(
		&self,
		chat: ChatId,
		message_id: Option<MessageId>,
		reply: &Reply,
	) -> Result<(), TransportError> {
		if let Some(message_id) = message_id {
			match self.edit(chat, message_id, reply).await {
				Ok(()) => return Ok(()),
				Err(e) => {
					tracing::warn!(chat = %chat, error = %e, "Edit failed, sending new message");
				},
			}
		}
		self.send(chat, reply).await.map(|_| ())
	}

	/// Acknowledges a menu selection.
	pub async fn answer(
		&self,
		selection_id: &str,
		text: Option<&str>,
	) -> Result<(), TransportError> {
		self.implementation.answer_selection(selection_id, text).await
	}
}
