//! File-based storage backend.
//!
//! Each key maps to `<storage_path>/<key>.json`. Writes go to a sibling
//! `.tmp` file which is then renamed over the target, so a crash mid-write
//! leaves either the old or the new collection on disk, never a torn one.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use intake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

/// Default directory for persisted collections.
const DEFAULT_STORAGE_PATH: &str = "./data";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at the given directory.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(format!(
				"Failed to read {}: {}",
				path.display(),
				e
			))),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("json.tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::debug!(path = %path.display(), "Collection written");
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("storage_path", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: directory holding the collection files (default: "./data")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	tracing::info!(storage_path = %storage_path, "Using file storage");
	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_missing_file_is_not_found() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		assert!(!storage.exists("orders").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_write_creates_directory_and_leaves_no_temp_file() {
		let dir = TempDir::new().unwrap();
		let root = dir.path().join("nested");
		let storage = FileStorage::new(root.clone());

		storage.set_bytes("orders", b"[]".to_vec()).await.unwrap();

		assert_eq!(std::fs::read(root.join("orders.json")).unwrap(), b"[]");
		assert!(!root.join("orders.json.tmp").exists());
		assert_eq!(storage.get_bytes("orders").await.unwrap(), b"[]".to_vec());
	}

	#[tokio::test]
	async fn test_delete_is_idempotent() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("orders", b"[]".to_vec()).await.unwrap();
		storage.delete("orders").await.unwrap();
		storage.delete("orders").await.unwrap();
		assert!(!storage.exists("orders").await.unwrap());
	}

	#[test]
	fn test_key_sanitizing() {
		let storage = FileStorage::new(PathBuf::from("/srv/intake"));
		assert_eq!(
			storage.get_file_path("a/b:c"),
			PathBuf::from("/srv/intake/a_b_c.json")
		);
	}

	#[test]
	fn test_factory_validates_storage_path_type() {
		let bad: toml::Value = toml::from_str("storage_path = 5").unwrap();
		assert!(matches!(
			create_storage(&bad),
			Err(StorageError::Configuration(_))
		));

		let good: toml::Value = toml::from_str("storage_path = \"./orders\"").unwrap();
		assert!(create_storage(&good).is_ok());
	}
}
