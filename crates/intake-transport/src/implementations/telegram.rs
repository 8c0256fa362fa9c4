//! Telegram Bot API transport.
//!
//! Receives updates by long polling `getUpdates` and replies through
//! `sendMessage`, `editMessageText` and `answerCallbackQuery`. Menus are
//! rendered as inline keyboards whose `callback_data` is the selection key.

use crate::{TransportError, TransportFactory, TransportInterface, TransportRegistry};
use async_trait::async_trait;
use intake_types::{
	ChatId, ConfigSchema, EventKind, Field, FieldType, ImplementationRegistry, InboundEvent, Menu,
	MessageId, Reply, Schema, SecretString, UserId, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECONDS: u64 = 30;
/// Pause before polling again after a failed request.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
	ok: bool,
	result: Option<T>,
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
	update_id: i64,
	message: Option<Message>,
	callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
	message_id: i64,
	chat: Chat,
	from: Option<User>,
	text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
	id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
	id: i64,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
	id: String,
	from: User,
	message: Option<Message>,
	data: Option<String>,
}

impl Update {
	/// Maps a raw update onto an inbound event. Updates the bot does not
	/// handle (stickers, edited messages, ...) yield `None`.
	fn into_event(self) -> Option<InboundEvent> {
		if let Some(query) = self.callback_query {
			let key = query.data?;
			let chat = query
				.message
				.as_ref()
				.map(|m| m.chat.id)
				.unwrap_or(query.from.id);
			return Some(InboundEvent {
				update_id: self.update_id,
				chat: ChatId(chat),
				user: UserId(query.from.id),
				kind: EventKind::Selection {
					selection_id: query.id,
					message_id: query.message.map(|m| MessageId(m.message_id)),
					key,
				},
			});
		}

		let message = self.message?;
		let text = message.text?;
		let user = message.from.map(|u| u.id).unwrap_or(message.chat.id);

		let kind = match text.strip_prefix('/') {
			Some(command) => {
				// "/start@intake_bot payload" -> "start"
				let name = command
					.split_whitespace()
					.next()
					.unwrap_or_default()
					.split('@')
					.next()
					.unwrap_or_default();
				EventKind::Command(name.to_string())
			},
			None => EventKind::Text(text),
		};

		Some(InboundEvent {
			update_id: self.update_id,
			chat: ChatId(message.chat.id),
			user: UserId(user),
			kind,
		})
	}
}

/// Renders a menu as an inline keyboard.
fn inline_keyboard(menu: &Menu) -> Value {
	let rows: Vec<Vec<Value>> = menu
		.rows
		.iter()
		.map(|row| {
			row.iter()
				.map(|b| json!({ "text": b.label, "callback_data": b.key }))
				.collect()
		})
		.collect();
	json!({ "inline_keyboard": rows })
}

/// Telegram Bot API client.
pub struct TelegramTransport {
	client: reqwest::Client,
	/// `<api_url>/bot<token>`, never logged.
	base_url: String,
	poll_timeout_seconds: u64,
	is_running: Arc<AtomicBool>,
	/// Channel for signaling the polling task to stop.
	shutdown_signal: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl TelegramTransport {
	pub fn new(
		api_url: &str,
		token: &SecretString,
		poll_timeout_seconds: u64,
	) -> Result<Self, TransportError> {
		let client = reqwest::Client::builder()
			// Long polls hold the connection for up to poll_timeout_seconds.
			.timeout(Duration::from_secs(poll_timeout_seconds + 10))
			.build()
			.map_err(|e| TransportError::Network(e.to_string()))?;

		Ok(Self {
			client,
			base_url: format!(
				"{}/bot{}",
				api_url.trim_end_matches('/'),
				token.expose_secret()
			),
			poll_timeout_seconds,
			is_running: Arc::new(AtomicBool::new(false)),
			shutdown_signal: Arc::new(Mutex::new(None)),
		})
	}

	async fn call<T: DeserializeOwned>(
		client: &reqwest::Client,
		base_url: &str,
		method: &str,
		body: Value,
	) -> Result<T, TransportError> {
		let response = client
			.post(format!("{}/{}", base_url, method))
			.json(&body)
			.send()
			.await
			// reqwest errors include the URL, which contains the token
			.map_err(|e| TransportError::Network(e.without_url().to_string()))?;

		// Failed calls still carry a JSON envelope with a description.
		let envelope: ApiResponse<T> = response
			.json()
			.await
			.map_err(|e| TransportError::Parse(e.without_url().to_string()))?;

		match (envelope.ok, envelope.result) {
			(true, Some(result)) => Ok(result),
			_ => Err(TransportError::Api(format!(
				"{} failed: {}",
				method,
				envelope
					.description
					.unwrap_or_else(|| "no description".to_string())
			))),
		}
	}

	/// Long-polls `getUpdates` until shutdown, forwarding every handled update.
	async fn poll_updates(
		client: reqwest::Client,
		base_url: String,
		poll_timeout_seconds: u64,
		sender: mpsc::UnboundedSender<InboundEvent>,
		mut shutdown_rx: mpsc::Receiver<()>,
	) {
		let mut offset: i64 = 0;

		loop {
			let body = json!({
				"offset": offset,
				"timeout": poll_timeout_seconds,
				"allowed_updates": ["message", "callback_query"],
			});

			let result = tokio::select! {
				_ = shutdown_rx.recv() => break,
				result = Self::call::<Vec<Update>>(&client, &base_url, "getUpdates", body) => result,
			};

			match result {
				Ok(updates) => {
					for update in updates {
						offset = offset.max(update.update_id + 1);
						let update_id = update.update_id;
						match update.into_event() {
							Some(event) => {
								if sender.send(event).is_err() {
									tracing::info!("Event receiver dropped, stopping polling");
									return;
								}
							},
							None => tracing::debug!(update_id, "Ignoring unsupported update"),
						}
					}
				},
				Err(e) => {
					tracing::warn!(error = %e, "getUpdates failed, retrying");
					tokio::select! {
						_ = shutdown_rx.recv() => break,
						_ = tokio::time::sleep(RETRY_DELAY) => {},
					}
				},
			}
		}

		tracing::info!("Telegram polling stopped");
	}
}

#[async_trait]
impl TransportInterface for TelegramTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(TelegramTransportSchema)
	}

	async fn start(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		if self.is_running.swap(true, Ordering::SeqCst) {
			return Err(TransportError::AlreadyRunning);
		}

		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		*self.shutdown_signal.lock().await = Some(shutdown_tx);

		tokio::spawn(Self::poll_updates(
			self.client.clone(),
			self.base_url.clone(),
			self.poll_timeout_seconds,
			sender,
			shutdown_rx,
		));

		tracing::info!("Telegram polling started");
		Ok(())
	}

	async fn stop(&self) -> Result<(), TransportError> {
		if !self.is_running.swap(false, Ordering::SeqCst) {
			return Ok(());
		}

		if let Some(shutdown_tx) = self.shutdown_signal.lock().await.take() {
			let _ = shutdown_tx.send(()).await;
		}
		Ok(())
	}

	async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
		let mut body = json!({ "chat_id": chat.0, "text": reply.text });
		if let Some(menu) = &reply.menu {
			body["reply_markup"] = inline_keyboard(menu);
		}

		let message: Message = Self::call(&self.client, &self.base_url, "sendMessage", body).await?;
		Ok(MessageId(message.message_id))
	}

	async fn edit_message(
		&self,
		chat: ChatId,
		message_id: MessageId,
		reply: &Reply,
	) -> Result<(), TransportError> {
		let mut body = json!({
			"chat_id": chat.0,
			"message_id": message_id.0,
			"text": reply.text,
		});
		if let Some(menu) = &reply.menu {
			body["reply_markup"] = inline_keyboard(menu);
		}

		// Returns the edited Message, or `true` for inline messages.
		let _: Value = Self::call(&self.client, &self.base_url, "editMessageText", body).await?;
		Ok(())
	}

	async fn answer_selection(
		&self,
		selection_id: &str,
		text: Option<&str>,
	) -> Result<(), TransportError> {
		let mut body = json!({ "callback_query_id": selection_id });
		if let Some(text) = text {
			body["text"] = json!(text);
		}

		let _: bool =
			Self::call(&self.client, &self.base_url, "answerCallbackQuery", body).await?;
		Ok(())
	}
}

/// Configuration schema for TelegramTransport.
pub struct TelegramTransportSchema;

impl ConfigSchema for TelegramTransportSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![
			Field::new("api_url", FieldType::String),
			Field::new(
				"poll_timeout_seconds",
				FieldType::Integer {
					min: Some(0),
					max: Some(50),
				},
			),
		])
		.validate(config)
	}
}

/// Factory function to create a Telegram transport from configuration.
///
/// Configuration parameters:
/// - `api_url`: Bot API base URL (default: "https://api.telegram.org")
/// - `poll_timeout_seconds`: long-poll timeout (default: 30)
pub fn create_transport(
	config: &toml::Value,
	token: &SecretString,
) -> Result<Box<dyn TransportInterface>, TransportError> {
	TelegramTransportSchema
		.validate(config)
		.map_err(|e| TransportError::Configuration(e.to_string()))?;

	let api_url = config
		.get("api_url")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_API_URL);
	let poll_timeout_seconds = config
		.get("poll_timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_POLL_TIMEOUT_SECONDS);

	tracing::info!(
		bot = token.public_prefix().unwrap_or("unknown"),
		api_url = %api_url,
		"Using Telegram transport"
	);
	Ok(Box::new(TelegramTransport::new(
		api_url,
		token,
		poll_timeout_seconds,
	)?))
}

/// Registry for the Telegram transport implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "telegram";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use intake_types::Button;

	fn decode(raw: &str) -> Option<InboundEvent> {
		serde_json::from_str::<Update>(raw).unwrap().into_event()
	}

	#[test]
	fn test_text_message_update() {
		let event = decode(
			r#"{"update_id": 10, "message": {"message_id": 5, "chat": {"id": 100},
			"from": {"id": 200, "is_bot": false}, "text": "Ivan Petrov"}}"#,
		)
		.unwrap();
		assert_eq!(event.update_id, 10);
		assert_eq!(event.chat, ChatId(100));
		assert_eq!(event.user, UserId(200));
		assert_eq!(event.kind, EventKind::Text("Ivan Petrov".into()));
	}

	#[test]
	fn test_command_update_strips_bot_name() {
		let event = decode(
			r#"{"update_id": 11, "message": {"message_id": 6, "chat": {"id": 100},
			"from": {"id": 200}, "text": "/start@intake_bot hello"}}"#,
		)
		.unwrap();
		assert_eq!(event.kind, EventKind::Command("start".into()));
	}

	#[test]
	fn test_callback_query_update() {
		let event = decode(
			r#"{"update_id": 12, "callback_query": {"id": "cb-1", "from": {"id": 200},
			"message": {"message_id": 7, "chat": {"id": 100}}, "data": "processed:3"}}"#,
		)
		.unwrap();
		assert_eq!(event.chat, ChatId(100));
		assert_eq!(
			event.kind,
			EventKind::Selection {
				selection_id: "cb-1".into(),
				message_id: Some(MessageId(7)),
				key: "processed:3".into(),
			}
		);
	}

	#[test]
	fn test_unsupported_updates_are_skipped() {
		assert!(decode(r#"{"update_id": 13, "edited_message": {"message_id": 1}}"#).is_none());
		assert!(decode(
			r#"{"update_id": 14, "message": {"message_id": 8, "chat": {"id": 1}, "sticker": {}}}"#
		)
		.is_none());
	}

	#[test]
	fn test_error_envelope() {
		let envelope: ApiResponse<Value> = serde_json::from_str(
			r#"{"ok": false, "error_code": 400, "description": "Bad Request: message is not modified"}"#,
		)
		.unwrap();
		assert!(!envelope.ok);
		assert!(envelope.result.is_none());
		assert!(envelope.description.unwrap().contains("not modified"));
	}

	#[test]
	fn test_inline_keyboard_rendering() {
		let menu = Menu::column([Button::new("Обработано", "processed:4")]);
		let keyboard = inline_keyboard(&menu);
		assert_eq!(
			keyboard["inline_keyboard"][0][0]["callback_data"],
			"processed:4"
		);
		assert_eq!(keyboard["inline_keyboard"][0][0]["text"], "Обработано");
	}

	#[test]
	fn test_factory_validates_config() {
		let token = SecretString::from("1:x");
		let bad: toml::Value = toml::from_str("poll_timeout_seconds = 120").unwrap();
		assert!(matches!(
			create_transport(&bad, &token),
			Err(TransportError::Configuration(_))
		));

		let good: toml::Value = toml::from_str("api_url = \"http://127.0.0.1:9/\"").unwrap();
		assert!(create_transport(&good, &token).is_ok());
	}
}
