//! Console transport for local runs.
//!
//! Reads one update per stdin line and prints replies to stdout. Lines
//! starting with `/` are commands, lines starting with `#` select the menu
//! key that follows, anything else is free text. All updates come from a
//! single configured user chatting in a chat with the same id.
//!
//! Stdin is read on a dedicated OS thread so a pending read never holds up
//! runtime shutdown.

use crate::{TransportError, TransportFactory, TransportInterface, TransportRegistry};
use async_trait::async_trait;
use intake_types::{
	ChatId, ConfigSchema, EventKind, Field, FieldType, ImplementationRegistry, InboundEvent,
	MessageId, Reply, Schema, SecretString, UserId, ValidationError,
};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Console transport implementation.
pub struct ConsoleTransport {
	user: UserId,
	next_message_id: AtomicI64,
	running: Arc<AtomicBool>,
}

impl ConsoleTransport {
	pub fn new(user: UserId) -> Self {
		Self {
			user,
			next_message_id: AtomicI64::new(1),
			running: Arc::new(AtomicBool::new(false)),
		}
	}
}

/// Forwards input lines as events until the input ends, the receiver is
/// gone, or `running` is cleared.
fn forward_lines(
	input: impl BufRead,
	user: UserId,
	sender: &mpsc::UnboundedSender<InboundEvent>,
	running: &AtomicBool,
) {
	let mut update_id = 0;
	for line in input.lines() {
		if !running.load(Ordering::SeqCst) {
			return;
		}
		let line = match line {
			Ok(line) => line,
			Err(e) => {
				tracing::error!(error = %e, "Failed to read console input");
				return;
			},
		};
		update_id += 1;
		if let Some(event) = parse_line(&line, update_id, user) {
			if sender.send(event).is_err() {
				return;
			}
		}
	}
	tracing::info!("Console input closed");
}

/// Parses one input line into an event. Blank lines yield `None`.
fn parse_line(line: &str, update_id: i64, user: UserId) -> Option<InboundEvent> {
	let line = line.trim_end_matches(['\r', '\n']);
	if line.trim().is_empty() {
		return None;
	}

	let kind = if let Some(command) = line.strip_prefix('/') {
		EventKind::Command(command.split_whitespace().next()?.to_string())
	} else if let Some(key) = line.strip_prefix('#') {
		EventKind::Selection {
			selection_id: update_id.to_string(),
			message_id: None,
			key: key.trim().to_string(),
		}
	} else {
		EventKind::Text(line.to_string())
	};

	Some(InboundEvent {
		update_id,
		chat: ChatId(user.0),
		user,
		kind,
	})
}

/// Renders a reply as text with one `[label] #key` line per button.
fn render(reply: &Reply) -> String {
	let mut out = reply.text.clone();
	if let Some(menu) = &reply.menu {
		for row in &menu.rows {
			let line: Vec<String> = row
				.iter()
				.map(|b| format!("[{}] #{}", b.label, b.key))
				.collect();
			out.push('\n');
			out.push_str(&line.join("   "));
		}
	}
	out
}

#[async_trait]
impl TransportInterface for ConsoleTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ConsoleTransportSchema)
	}

	async fn start(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		if self.running.swap(true, Ordering::SeqCst) {
			return Err(TransportError::AlreadyRunning);
		}

		let user = self.user;
		let running = self.running.clone();
		std::thread::Builder::new()
			.name("console-input".into())
			.spawn(move || forward_lines(std::io::stdin().lock(), user, &sender, &running))
			.map_err(|e| {
				self.running.store(false, Ordering::SeqCst);
				TransportError::Network(format!("Failed to start console input: {}", e))
			})?;

		println!("Type /start to begin. Select menu entries with #key.");
		Ok(())
	}

	async fn stop(&self) -> Result<(), TransportError> {
		self.running.store(false, Ordering::SeqCst);
		Ok(())
	}

	async fn send_message(&self, _chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
		let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
		println!("\n{}", render(reply));
		Ok(MessageId(id))
	}

	async fn edit_message(
		&self,
		_chat: ChatId,
		_message_id: MessageId,
		reply: &Reply,
	) -> Result<(), TransportError> {
		println!("\n{}", render(reply));
		Ok(())
	}

	async fn answer_selection(
		&self,
		_selection_id: &str,
		text: Option<&str>,
	) -> Result<(), TransportError> {
		if let Some(text) = text {
			println!("» {}", text);
		}
		Ok(())
	}
}

/// Configuration schema for ConsoleTransport.
pub struct ConsoleTransportSchema;

impl ConfigSchema for ConsoleTransportSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new(
			"user_id",
			FieldType::Integer {
				min: None,
				max: None,
			},
		)])
		.validate(config)
	}
}

/// Factory function to create a console transport from configuration.
///
/// Configuration parameters:
/// - `user_id`: identity of the console user (default: 1). Set it to the
///   configured `admin_id` to try the admin panel.
pub fn create_transport(
	config: &toml::Value,
	_token: &SecretString,
) -> Result<Box<dyn TransportInterface>, TransportError> {
	ConsoleTransportSchema
		.validate(config)
		.map_err(|e| TransportError::Configuration(e.to_string()))?;

	let user_id = config
		.get("user_id")
		.and_then(|v| v.as_integer())
		.unwrap_or(1);

	Ok(Box::new(ConsoleTransport::new(UserId(user_id))))
}

/// Registry for the console transport implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "console";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use intake_types::{Button, Menu};

	#[test]
	fn test_parse_line() {
		let user = UserId(5);

		let event = parse_line("/start now", 1, user).unwrap();
		assert_eq!(event.kind, EventKind::Command("start".into()));
		assert_eq!(event.chat, ChatId(5));

		let event = parse_line("#status_request", 2, user).unwrap();
		assert_eq!(
			event.kind,
			EventKind::Selection {
				selection_id: "2".into(),
				message_id: None,
				key: "status_request".into(),
			}
		);

		let event = parse_line("123 Main St\r", 3, user).unwrap();
		assert_eq!(event.kind, EventKind::Text("123 Main St".into()));

		assert!(parse_line("   ", 4, user).is_none());
	}

	#[test]
	fn test_render_menu() {
		let reply = Reply::with_menu(
			"Выберите услугу:",
			Menu::column([Button::new("⬅️ Назад", "back_to_main")]),
		);
		assert_eq!(render(&reply), "Выберите услугу:\n[⬅️ Назад] #back_to_main");
	}

	#[test]
	fn test_forward_lines() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let running = AtomicBool::new(true);
		let input = std::io::Cursor::new("/start\n\nIvan\n#back_to_main\n");

		forward_lines(input, UserId(3), &tx, &running);

		let event = rx.try_recv().unwrap();
		assert_eq!(event.kind, EventKind::Command("start".into()));
		assert_eq!(event.update_id, 1);
		let event = rx.try_recv().unwrap();
		assert_eq!(event.kind, EventKind::Text("Ivan".into()));
		assert_eq!(event.update_id, 3);
		let event = rx.try_recv().unwrap();
		assert!(matches!(event.kind, EventKind::Selection { ref key, .. } if key == "back_to_main"));
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn test_forward_lines_stops_when_not_running() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let running = AtomicBool::new(false);

		forward_lines(std::io::Cursor::new("/start\n"), UserId(3), &tx, &running);
		assert!(rx.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_send_assigns_increasing_ids() {
		let transport = ConsoleTransport::new(UserId(1));
		let first = transport
			.send_message(ChatId(1), &Reply::text("a"))
			.await
			.unwrap();
		let second = transport
			.send_message(ChatId(1), &Reply::text("b"))
			.await
			.unwrap();
		assert_eq!(first, MessageId(1));
		assert_eq!(second, MessageId(2));
	}
}
