//! Transport-neutral chat types.
//!
//! The core only sees these types: inbound events tagged with the chat and
//! user they came from, and replies made of text plus an optional menu of
//! selection buttons. Each transport maps its own wire format onto them.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity of the person sending updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Conversation that replies are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Transport-assigned id of a sent message, needed to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

/// A single update received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
	/// Transport sequence number, used for logging.
	pub update_id: i64,
	pub chat: ChatId,
	pub user: UserId,
	pub kind: EventKind,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
	/// A slash command without the leading slash, e.g. `start`.
	Command(String),
	/// Free text.
	Text(String),
	/// A menu button press.
	Selection {
		/// Id used to acknowledge the selection.
		selection_id: String,
		/// Message that carried the menu, if the transport knows it.
		message_id: Option<MessageId>,
		/// The button's selection key.
		key: String,
	},
}

/// A menu button: a visible label and the key reported back when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
	pub label: String,
	pub key: String,
}

impl Button {
	pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			key: key.into(),
		}
	}
}

/// Rows of buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
	pub rows: Vec<Vec<Button>>,
}

impl Menu {
	/// Builds a menu with one button per row.
	pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
		Self {
			rows: buttons.into_iter().map(|b| vec![b]).collect(),
		}
	}

	/// Iterates all buttons in row order.
	pub fn buttons(&self) -> impl Iterator<Item = &Button> {
		self.rows.iter().flatten()
	}
}

/// Outgoing message text with an optional menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
	pub text: String,
	pub menu: Option<Menu>,
}

impl Reply {
	/// Plain text reply.
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			menu: None,
		}
	}

	/// Text reply carrying a menu.
	pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
		Self {
			text: text.into(),
			menu: Some(menu),
		}
	}
}

/// Deserializes a user id given either as an integer or as a numeric string.
///
/// Environment interpolation always produces text, so `admin_id = "${ADMIN_ID}"`
/// arrives as a string.
pub fn deserialize_user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Int(i64),
		Text(String),
	}

	match Raw::deserialize(deserializer)? {
		Raw::Int(v) => Ok(UserId(v)),
		Raw::Text(s) => s
			.trim()
			.parse::<i64>()
			.map(UserId)
			.map_err(|_| de::Error::custom(format!("invalid user id '{}'", s))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Holder {
		#[serde(deserialize_with = "deserialize_user_id")]
		admin: UserId,
	}

	#[test]
	fn test_user_id_from_integer_or_string() {
		let h: Holder = toml::from_str("admin = 42").unwrap();
		assert_eq!(h.admin, UserId(42));

		let h: Holder = toml::from_str("admin = \" 1001 \"").unwrap();
		assert_eq!(h.admin, UserId(1001));

		assert!(toml::from_str::<Holder>("admin = \"boss\"").is_err());
	}

	#[test]
	fn test_menu_column_layout() {
		let menu = Menu::column([Button::new("A", "a"), Button::new("B", "b")]);
		assert_eq!(menu.rows.len(), 2);
		let keys: Vec<_> = menu.buttons().map(|b| b.key.as_str()).collect();
		assert_eq!(keys, vec!["a", "b"]);
	}
}
