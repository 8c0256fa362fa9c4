//! Parsing of order ids typed by users.

use intake_types::OrderId;
use thiserror::Error;

/// The text is not an order id.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid order id: {input:?}")]
pub struct InputFormatError {
	pub input: String,
}

/// Parses an order id, ignoring surrounding whitespace.
pub fn parse_order_id(input: &str) -> Result<OrderId, InputFormatError> {
	input.parse().map_err(|_| InputFormatError {
		input: input.to_string(),
	})
}
