//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every storage backend and transport exposes a `Registry` struct
/// implementing this trait, so the binary can map configuration names such as
/// `storage.implementations.file` or `transport.implementations.telegram` to
/// the right factory.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
