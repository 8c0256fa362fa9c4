//! Common types module for the service intake bot.
//!
//! This module defines the data types shared by every crate of the workspace:
//! the order record and its status lifecycle, the transport-neutral chat
//! events and menus, and the configuration validation framework used by the
//! pluggable implementations.

/// Order records, drafts and the status lifecycle.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secret string wrapper for credentials.
pub mod secret_string;
/// Storage keys for persisted collections.
pub mod storage;
/// Chat identities, inbound events, replies and menus.
pub mod transport;
/// Configuration validation types for implementation tables.
pub mod validation;

// Re-export all types for convenient access
pub use order::*;
pub use registry::*;
pub use secret_string::SecretString;
pub use storage::*;
pub use transport::*;
pub use validation::*;
