//! Configuration validation for implementation tables.
//!
//! Each pluggable implementation (storage backend, transport) declares the
//! keys it understands through a [`Schema`]. The schema is checked against the
//! raw TOML table before the implementation is constructed, so a typo such as
//! `poll_timeout_seconds = "30"` fails at startup instead of at first use.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
}

/// Expected type of a configuration value.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
		}
	}

	fn check(&self, field: &str, value: &toml::Value) -> Result<(), ValidationError> {
		let mismatch = || ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: self.name(),
			actual: value.type_str().to_string(),
		};

		match self {
			FieldType::String if value.is_str() => Ok(()),
			FieldType::Integer { min, max } => {
				let v = value.as_integer().ok_or_else(mismatch)?;
				if let Some(min) = min.filter(|m| v < *m) {
					return Err(ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("Value {} is less than minimum {}", v, min),
					});
				}
				if let Some(max) = max.filter(|m| v > *m) {
					return Err(ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("Value {} is greater than maximum {}", v, max),
					});
				}
				Ok(())
			},
			_ => Err(mismatch()),
		}
	}
}

/// A named field in a schema.
#[derive(Debug, Clone)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Optional typed fields of an implementation table.
///
/// Every implementation has a default for each of its keys, so a schema only
/// constrains the keys that are present.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	pub fields: Vec<Field>,
}

impl Schema {
	pub fn new(fields: Vec<Field>) -> Self {
		Self { fields }
	}

	/// Validates a TOML table: every known field that is present must have
	/// the declared type. Unknown keys are ignored.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str().to_string(),
			})?;

		for field in &self.fields {
			if let Some(value) = table.get(&field.name) {
				field.field_type.check(&field.name, value)?;
			}
		}

		Ok(())
	}
}

/// A configuration schema that can validate TOML values.
#[async_trait]
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![
			Field::new("api_url", FieldType::String),
			Field::new(
				"poll_timeout_seconds",
				FieldType::Integer {
					min: Some(0),
					max: Some(50),
				},
			),
		])
	}

	#[test]
	fn test_valid_table() {
		let value: toml::Value =
			toml::from_str("api_url = \"http://x\"\npoll_timeout_seconds = 10").unwrap();
		assert!(schema().validate(&value).is_ok());
	}

	#[test]
	fn test_absent_fields_and_non_table() {
		let value: toml::Value = toml::from_str("other = true").unwrap();
		assert!(schema().validate(&value).is_ok());

		let value = toml::Value::Integer(1);
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::TypeMismatch { field, .. }) if field == "root"
		));
	}

	#[test]
	fn test_type_mismatch_and_bounds() {
		let value: toml::Value =
			toml::from_str("api_url = \"http://x\"\npoll_timeout_seconds = \"10\"").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::TypeMismatch { .. })
		));

		let value: toml::Value =
			toml::from_str("api_url = \"http://x\"\npoll_timeout_seconds = 99").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::InvalidValue { .. })
		));
	}
}
