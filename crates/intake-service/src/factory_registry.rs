//! Factory registry for the pluggable implementations.
//!
//! Collects the factories every implementation crate registers and picks the
//! ones the configuration names.

use intake_config::Config;
use intake_core::{IntakeBuilder, IntakeEngine, IntakeFactories};
use intake_storage::StorageFactory;
use intake_transport::TransportFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Registry of all known implementation factories.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub transport: HashMap<String, TransportFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			transport: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_transport(&mut self, name: impl Into<String>, factory: TransportFactory) {
		self.transport.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in intake_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in intake_transport::get_all_implementations() {
			tracing::debug!("Registering transport implementation: {}", name);
			registry.register_transport(name, factory);
		}

		registry
	})
}

/// Selects the registered factories for the configured implementations.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the engine from configuration using the registered factories.
pub fn build_intake_from_config(
	config: Config,
) -> Result<IntakeEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let transport_factories = build_factories!(
		registry,
		config.transport.implementations,
		transport,
		"transport"
	);

	let factories = IntakeFactories {
		storage_factories,
		transport_factories,
	};

	Ok(IntakeBuilder::new(config).build(factories)?)
}
