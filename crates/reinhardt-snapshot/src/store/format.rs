//! Dump file format.
//!
//! Stores are seeded from Django-style dumps: a list of entries naming the
//! model, the identifier and the field values.
//!
//! ```json
//! [
//!   { "model": "blog.Author", "pk": 1, "fields": { "name": "Herbert" } },
//!   { "model": "blog.Book", "pk": 3, "fields": { "title": "Dune", "author": 1 } }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn empty_fields() -> Value {
	Value::Object(serde_json::Map::new())
}

/// One dump entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DumpRecord {
	/// Model identifier in format "app.Model".
	pub model: String,

	/// Identifier value. May instead appear among the fields.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pk: Option<Value>,

	/// Field values as a JSON object.
	#[serde(default = "empty_fields")]
	pub fields: Value,
}

impl DumpRecord {
	/// Creates a dump entry without `pk`.
	pub fn new(model: impl Into<String>, fields: Value) -> Self {
		Self {
			model: model.into(),
			pk: None,
			fields,
		}
	}

	/// Sets the identifier value.
	pub fn with_pk(mut self, pk: Value) -> Self {
		self.pk = Some(pk);
		self
	}
}

/// Supported dump file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DumpFormat {
	/// JSON format (default).
	#[default]
	Json,

	/// YAML format (requires `yaml` feature).
	Yaml,
}

impl DumpFormat {
	/// Determines the format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_snapshot::store::DumpFormat;
	/// assert_eq!(DumpFormat::from_extension("JSON"), Some(DumpFormat::Json));
	/// assert_eq!(DumpFormat::from_extension("yml"), Some(DumpFormat::Yaml));
	/// assert_eq!(DumpFormat::from_extension("csv"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}

	/// Determines the format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}
}

impl std::fmt::Display for DumpFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json => write!(f, "JSON"),
			Self::Yaml => write!(f, "YAML"),
		}
	}
}
