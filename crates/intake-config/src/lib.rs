//! Configuration module for the intake bot.
//!
//! Configuration is a TOML file whose values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`. The bot credential and the
//! administrator identity are required: a configuration that cannot resolve
//! them is rejected before the bot starts.

#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}

use intake_types::{deserialize_user_id, SecretString, UserId};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the intake bot.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Bot credential and administrator identity.
	pub bot: BotConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the messaging transport.
	pub transport: TransportConfig,
}

/// Identity settings of the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
	/// Service credential used by the transport (e.g. the Telegram bot token).
	pub token: SecretString,
	/// The only user allowed to change order statuses.
	#[serde(deserialize_with = "deserialize_user_id")]
	pub admin_id: UserId,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the messaging transport.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of transport implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read configuration {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.bot.token.is_empty() {
			return Err(ConfigError::Validation("Bot token cannot be empty".into()));
		}

		validate_selection(
			"storage",
			&self.storage.primary,
			&self.storage.implementations,
		)?;
		validate_selection(
			"transport",
			&self.transport.primary,
			&self.transport.implementations,
		)?;

		Ok(())
	}
}

/// Checks that a `primary` name points at one of the configured implementations.
fn validate_selection(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[bot]
token = "${TEST_INTAKE_TOKEN}"
admin_id = "${TEST_INTAKE_ADMIN}"

[storage]
primary = "memory"
[storage.implementations.memory]

[transport]
primary = "console"
[transport.implementations.console]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_INTAKE_HOST", "localhost");
		std::env::set_var("TEST_INTAKE_PORT", "8443");

		let input = "url = \"https://${TEST_INTAKE_HOST}:${TEST_INTAKE_PORT}/bot\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"https://localhost:8443/bot\"");

		std::env::remove_var("TEST_INTAKE_HOST");
		std::env::remove_var("TEST_INTAKE_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${TEST_INTAKE_MISSING:-./data}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"./data\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("token = \"${TEST_INTAKE_NEVER_SET}\"");
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("TEST_INTAKE_NEVER_SET"));
	}

	#[test]
	fn test_config_requires_credentials() {
		std::env::remove_var("TEST_INTAKE_TOKEN");
		std::env::remove_var("TEST_INTAKE_ADMIN");
		let err = BASE.parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));

		std::env::set_var("TEST_INTAKE_TOKEN", "123:abc");
		std::env::set_var("TEST_INTAKE_ADMIN", "777");
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.bot.token.expose_secret(), "123:abc");
		assert_eq!(config.bot.admin_id, UserId(777));

		std::env::set_var("TEST_INTAKE_ADMIN", "not-a-number");
		assert!(matches!(
			BASE.parse::<Config>(),
			Err(ConfigError::Parse(_))
		));

		std::env::remove_var("TEST_INTAKE_TOKEN");
		std::env::remove_var("TEST_INTAKE_ADMIN");
	}

	#[test]
	fn test_empty_token_rejected() {
		let config = r#"
[bot]
token = "  "
admin_id = 1

[storage]
primary = "memory"
[storage.implementations.memory]

[transport]
primary = "console"
[transport.implementations.console]
"#;
		let err = config.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Bot token"));
	}

	#[test]
	fn test_primary_must_be_configured() {
		let config = r#"
[bot]
token = "1:x"
admin_id = 1

[storage]
primary = "file"
[storage.implementations.memory]

[transport]
primary = "console"
[transport.implementations.console]
"#;
		let err = config.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("intake.toml");
		std::fs::write(
			&path,
			r#"
[bot]
token = "42:secret"
admin_id = 9

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "${TEST_INTAKE_DATA_DIR:-./data}"

[transport]
primary = "console"
[transport.implementations.console]
"#,
		)
		.unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.storage.primary, "file");
		assert_eq!(
			config.storage.implementations["file"]
				.get("storage_path")
				.and_then(|v| v.as_str()),
			Some("./data")
		);

		let missing = Config::from_file(dir.path().join("absent.toml")).await;
		assert!(matches!(missing, Err(ConfigError::Io(_))));
	}
}
