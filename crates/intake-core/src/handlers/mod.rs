//! Handlers for user updates.
//!
//! Navigation redraws menus, the order form and the status lookup drive the
//! per-user conversation flows, and the admin handler moves orders through
//! their status lifecycle.

pub mod admin;
pub mod navigation;
pub mod order_form;
pub mod status;

pub use admin::AdminHandler;
pub use navigation::MenuHandler;
pub use order_form::OrderFormHandler;
pub use status::StatusHandler;

use crate::state::OrderStoreError;
use intake_transport::TransportError;
use thiserror::Error;

/// Errors that can occur while handling an update.
///
/// Store failures that the user is told about are not returned as errors.
#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),
	#[error("Store error: {0}")]
	Store(#[from] OrderStoreError),
}
