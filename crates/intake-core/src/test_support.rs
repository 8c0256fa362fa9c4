//! Fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use intake_storage::{StorageError, StorageInterface};
use intake_transport::{TransportError, TransportInterface};
use intake_types::{ChatId, ConfigSchema, InboundEvent, MessageId, Reply, ValidationError};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

mockall::mock! {
	pub Backend {}

	#[async_trait]
	impl StorageInterface for Backend {
		async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;
		async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
		async fn delete(&self, key: &str) -> Result<(), StorageError>;
		async fn exists(&self, key: &str) -> Result<bool, StorageError>;
		fn config_schema(&self) -> Box<dyn ConfigSchema>;
	}
}

/// Something the engine asked the transport to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
	Sent { chat: ChatId, reply: Reply },
	Edited { chat: ChatId, message_id: MessageId, reply: Reply },
	Answered { selection_id: String, text: Option<String> },
}

impl Outgoing {
	/// Text of a sent or edited message.
	pub fn text(&self) -> Option<&str> {
		match self {
			Outgoing::Sent { reply, .. } | Outgoing::Edited { reply, .. } => Some(&reply.text),
			Outgoing::Answered { .. } => None,
		}
	}
}

/// Transport that records everything instead of talking to a network.
#[derive(Clone, Default)]
pub struct RecordingTransport {
	log: Arc<Mutex<Vec<Outgoing>>>,
}

impl RecordingTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns and forgets everything recorded so far.
	pub fn take(&self) -> Vec<Outgoing> {
		std::mem::take(&mut *self.log.lock().unwrap())
	}

	fn push(&self, outgoing: Outgoing) {
		self.log.lock().unwrap().push(outgoing);
	}
}

struct NoSchema;

impl ConfigSchema for NoSchema {
	fn validate(&self, _config: &toml::Value) -> Result<(), ValidationError> {
		Ok(())
	}
}

#[async_trait]
impl TransportInterface for RecordingTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn start(
		&self,
		_sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		Ok(())
	}

	async fn stop(&self) -> Result<(), TransportError> {
		Ok(())
	}

	async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
		let mut log = self.log.lock().unwrap();
		log.push(Outgoing::Sent {
			chat,
			reply: reply.clone(),
		});
		Ok(MessageId(log.len() as i64))
	}

	async fn edit_message(
		&self,
		chat: ChatId,
		message_id: MessageId,
		reply: &Reply,
	) -> Result<(), TransportError> {
		self.push(Outgoing::Edited {
			chat,
			message_id,
			reply: reply.clone(),
		});
		Ok(())
	}

	async fn answer_selection(
		&self,
		selection_id: &str,
		text: Option<&str>,
	) -> Result<(), TransportError> {
		self.push(Outgoing::Answered {
			selection_id: selection_id.to_string(),
			text: text.map(str::to_string),
		});
		Ok(())
	}
}
