//! Configuration builder for tests and local development.

use crate::{BotConfig, Config, StorageConfig, TransportConfig};
use intake_types::{SecretString, UserId};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to in-memory storage and the console transport.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	token: String,
	admin_id: UserId,
	storage_primary: String,
	storage_config: toml::Value,
	transport_primary: String,
	transport_config: toml::Value,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			token: "1:test-token".to_string(),
			admin_id: UserId(1),
			storage_primary: "memory".to_string(),
			storage_config: toml::Value::Table(toml::map::Map::new()),
			transport_primary: "console".to_string(),
			transport_config: toml::Value::Table(toml::map::Map::new()),
		}
	}

	/// Sets the bot token.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = token.into();
		self
	}

	/// Sets the administrator identity.
	pub fn admin_id(mut self, admin_id: UserId) -> Self {
		self.admin_id = admin_id;
		self
	}

	/// Sets the primary storage implementation and its table.
	pub fn storage(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.storage_primary = primary.into();
		self.storage_config = config;
		self
	}

	/// Sets the primary transport implementation and its table.
	pub fn transport(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.transport_primary = primary.into();
		self.transport_config = config;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			bot: BotConfig {
				token: SecretString::new(self.token),
				admin_id: self.admin_id,
			},
			storage: StorageConfig {
				implementations: HashMap::from([(
					self.storage_primary.clone(),
					self.storage_config,
				)]),
				primary: self.storage_primary,
			},
			transport: TransportConfig {
				implementations: HashMap::from([(
					self.transport_primary.clone(),
					self.transport_config,
				)]),
				primary: self.transport_primary,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_produces_valid_config() {
		let config = ConfigBuilder::new().admin_id(UserId(5)).build();
		assert!(config.validate().is_ok());
		assert_eq!(config.bot.admin_id, UserId(5));
		assert_eq!(config.storage.primary, "memory");
	}
}
