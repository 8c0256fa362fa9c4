//! Storage-related types for the intake system.

/// Keys of the persisted collections.
///
/// Each key names one whole collection; the file backend maps it to
/// `<storage_path>/<key>.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// The order collection.
	Orders,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
		}
	}
}
