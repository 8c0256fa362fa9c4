//! Builder pattern for constructing the intake engine.
//!
//! Composes an IntakeEngine from the storage and transport implementations
//! named in the configuration, using factory functions registered by the
//! binary.

use crate::engine::IntakeEngine;
use crate::state::{MemorySessionStore, OrderStore};
use intake_config::Config;
use intake_storage::{StorageError, StorageInterface, StorageService};
use intake_transport::{TransportError, TransportInterface, TransportService};
use intake_types::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions for every pluggable component, keyed by implementation name.
pub struct IntakeFactories<SF, TF> {
	pub storage_factories: HashMap<String, SF>,
	pub transport_factories: HashMap<String, TF>,
}

/// Builder for constructing an IntakeEngine with pluggable implementations.
pub struct IntakeBuilder {
	config: Config,
}

impl IntakeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine from the primary storage and transport.
	pub fn build<SF, TF>(self, factories: IntakeFactories<SF, TF>) -> Result<IntakeEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		TF: Fn(&toml::Value, &SecretString) -> Result<Box<dyn TransportInterface>, TransportError>,
	{
		let storage_backend = create_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
			|factory, config| factory(config),
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let token = &self.config.bot.token;
		let transport_impl = create_primary(
			"transport",
			&self.config.transport.primary,
			&self.config.transport.implementations,
			&factories.transport_factories,
			|factory, config| factory(config, token),
		)?;
		let transport = Arc::new(TransportService::new(transport_impl));

		let orders = Arc::new(OrderStore::new(storage));
		let sessions = Arc::new(MemorySessionStore::new());

		Ok(IntakeEngine::new(self.config, transport, orders, sessions))
	}
}

/// Creates every configured implementation that has a factory and returns
/// the primary one.
fn create_primary<F, T, E>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
	create: impl Fn(&F, &toml::Value) -> Result<T, E>,
) -> Result<T, BuilderError>
where
	E: std::fmt::Display,
{
	let mut loaded = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, skipping");
			continue;
		};
		match create(factory, config) {
			Ok(implementation) => {
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	loaded.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has no registered factory",
			component, primary
		))
	})
}
