//! Order types for the intake system.
//!
//! An order is a single service request collected through the conversation
//! flow. Its status moves from `Pending` through `InProgress` to the terminal
//! `Processed` value; the persisted labels are the Russian display strings the
//! operators read in the JSON file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an order, assigned as `max(existing ids) + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for OrderId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse::<u64>().map(OrderId)
	}
}

/// A persisted service request.
///
/// Field values are stored exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: OrderId,
	/// Customer's full name.
	#[serde(default)]
	pub full_name: String,
	/// Address for the visit.
	#[serde(default)]
	pub address: String,
	/// Contact phone number, not validated.
	#[serde(default)]
	pub phone_number: String,
	/// Free-text reason for the request.
	#[serde(default)]
	pub reason: String,
	/// Current status of the order.
	pub status: OrderStatus,
}

impl Order {
	/// Renders the status lookup answer: the reason followed by the status label.
	pub fn status_text(&self) -> String {
		format!("{}\n{}", self.reason, self.status)
	}
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Submitted and waiting for an operator.
	#[serde(rename = "Ожидает обработки")]
	Pending,
	/// An operator is working on it.
	#[serde(rename = "В работе")]
	InProgress,
	/// Done. Terminal.
	#[serde(rename = "Обработано")]
	Processed,
}

impl OrderStatus {
	/// Returns the display label, identical to the persisted value.
	pub fn label(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Ожидает обработки",
			OrderStatus::InProgress => "В работе",
			OrderStatus::Processed => "Обработано",
		}
	}

	/// A settled order accepts no further status changes.
	pub fn is_settled(&self) -> bool {
		matches!(self, OrderStatus::Processed)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Fields collected so far by an unfinished order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
	pub full_name: Option<String>,
	pub address: Option<String>,
	pub phone_number: Option<String>,
	pub reason: Option<String>,
}

impl OrderDraft {
	/// Turns the draft into a new `Pending` order. Missing fields become empty strings.
	pub fn into_order(self, id: OrderId) -> Order {
		Order {
			id,
			full_name: self.full_name.unwrap_or_default(),
			address: self.address.unwrap_or_default(),
			phone_number: self.phone_number.unwrap_or_default(),
			reason: self.reason.unwrap_or_default(),
			status: OrderStatus::Pending,
		}
	}
}
