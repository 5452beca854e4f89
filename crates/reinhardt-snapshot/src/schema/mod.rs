//! Schema descriptor adapter.
//!
//! Model structure is described by data rather than discovered at runtime. A
//! schema file lists every model with its fields, relations, identifiers and
//! snapshot flags:
//!
//! ```toml
//! [[models]]
//! model = "blog.Author"
//! fields = [{ name = "name", kind = "string" }]
//!
//! [[models]]
//! model = "blog.Book"
//! fields = [{ name = "title", kind = "string" }]
//! relations = [{ name = "author", target = "blog.Author" }]
//! ```

mod descriptor;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};

pub use descriptor::{
	Cardinality, ConstructorParam, FieldDescriptor, FieldKind, ModelDescriptor,
	RelationDescriptor,
};

/// Read access to model metadata.
///
/// Implemented by [`Schema`]; the resolver and the generator are generic over it.
pub trait SchemaSource {
	/// All models in declaration order.
	fn models(&self) -> Vec<&ModelDescriptor>;

	/// Looks up a model by qualified name.
	fn model(&self, model: &str) -> Option<&ModelDescriptor>;

	/// Whether the model is abstract. Unknown models are not.
	fn is_abstract(&self, model: &str) -> bool {
		self.model(model).is_some_and(|m| m.is_abstract)
	}

	/// Concrete members behind an abstract discriminator model.
	fn discriminator_members(&self, model: &str) -> Option<Vec<&str>> {
		let descriptor = self.model(model)?;
		if descriptor.discriminator_map.is_empty() {
			return None;
		}
		Some(
			descriptor
				.discriminator_map
				.values()
				.map(String::as_str)
				.collect(),
		)
	}

	/// Whether a field or relation carries the ignore-in-snapshot marker.
	fn field_ignored(&self, model: &str, field: &str) -> bool {
		self.model(model).is_some_and(|m| {
			m.field(field).is_some_and(|f| f.ignore_in_snapshot)
				|| m.relation(field).is_some_and(|r| r.ignore_in_snapshot)
		})
	}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchemaFile {
	#[serde(default)]
	models: Vec<ModelDescriptor>,
}

/// Ordered table of model descriptors.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	models: IndexMap<String, ModelDescriptor>,
}

impl Schema {
	/// Creates an empty schema.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a validated schema from descriptors.
	///
	/// # Errors
	///
	/// Fails on duplicate models, relations to unknown models and discriminator
	/// members that are not declared.
	pub fn from_models(models: Vec<ModelDescriptor>) -> SnapshotResult<Self> {
		let mut schema = Self::new();
		for model in models {
			if schema.models.contains_key(&model.model) {
				return Err(SnapshotError::ValidationError {
					field: model.model.clone(),
					message: "model declared more than once".to_string(),
				});
			}
			schema.models.insert(model.model.clone(), model);
		}
		schema.validate()?;
		Ok(schema)
	}

	/// Adds or replaces a model without validation.
	pub fn insert(&mut self, model: ModelDescriptor) {
		self.models.insert(model.model.clone(), model);
	}

	/// Number of declared models.
	pub fn len(&self) -> usize {
		self.models.len()
	}

	/// Returns `true` when no model is declared.
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Loads a schema file, choosing the format from the extension.
	///
	/// # Errors
	///
	/// Returns [`SnapshotError::FileNotFound`] when the file does not exist and
	/// [`SnapshotError::UnsupportedExtension`] for unknown extensions.
	pub fn from_file(path: &Path) -> SnapshotResult<Self> {
		if !path.exists() {
			return Err(SnapshotError::FileNotFound(path.display().to_string()));
		}
		let content = std::fs::read_to_string(path)?;
		let extension = path
			.extension()
			.and_then(|e| e.to_str())
			.map(str::to_lowercase)
			.unwrap_or_default();

		match extension.as_str() {
			"toml" => Self::from_toml(&content),
			"json" => Self::from_json(&content),
			#[cfg(feature = "yaml")]
			"yaml" | "yml" => Self::from_yaml(&content),
			_ => Err(SnapshotError::UnsupportedExtension(extension)),
		}
	}

	/// Parses a TOML schema.
	pub fn from_toml(content: &str) -> SnapshotResult<Self> {
		let file: SchemaFile =
			toml::from_str(content).map_err(|e| SnapshotError::ParseError(e.to_string()))?;
		Self::from_models(file.models)
	}

	/// Parses a JSON schema.
	pub fn from_json(content: &str) -> SnapshotResult<Self> {
		let file: SchemaFile = serde_json::from_str(content)?;
		Self::from_models(file.models)
	}

	/// Parses a YAML schema.
	#[cfg(feature = "yaml")]
	pub fn from_yaml(content: &str) -> SnapshotResult<Self> {
		let file: SchemaFile = serde_yaml::from_str(content)?;
		Self::from_models(file.models)
	}

	fn validate(&self) -> SnapshotResult<()> {
		for model in self.models.values() {
			let mut seen = HashSet::new();
			for name in model
				.fields
				.iter()
				.map(|f| f.name.as_str())
				.chain(model.relations.iter().map(|r| r.name.as_str()))
			{
				if !seen.insert(name) {
					return Err(SnapshotError::ValidationError {
						field: format!("{}.{}", model.model, name),
						message: "field declared more than once".to_string(),
					});
				}
			}
			for relation in &model.relations {
				if !self.models.contains_key(&relation.target) {
					return Err(SnapshotError::ValidationError {
						field: format!("{}.{}", model.model, relation.name),
						message: format!("unknown target model {}", relation.target),
					});
				}
			}
			for member in model.discriminator_map.values() {
				if !self.models.contains_key(member) {
					return Err(SnapshotError::ValidationError {
						field: model.model.clone(),
						message: format!("unknown discriminator member {}", member),
					});
				}
			}
			if !model.is_abstract && model.identifiers.is_empty() {
				tracing::warn!(model = %model.model, "model declares no identifier");
			}
		}
		Ok(())
	}
}

impl SchemaSource for Schema {
	fn models(&self) -> Vec<&ModelDescriptor> {
		self.models.values().collect()
	}

	fn model(&self, model: &str) -> Option<&ModelDescriptor> {
		self.models.get(model)
	}
}
