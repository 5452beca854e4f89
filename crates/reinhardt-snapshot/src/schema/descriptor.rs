//! Per-model descriptor tables.
//!
//! Everything the resolver and the generator know about a model lives here as
//! plain data: fields, relations, identifiers and the snapshot flags.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};
use crate::value::{PrimaryKey, RecordKey, Value, parse_timestamp};

fn default_true() -> bool {
	true
}

fn default_identifiers() -> Vec<String> {
	vec!["id".to_string()]
}

/// Storage kind of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	/// Signed integer.
	Integer,
	/// Floating point number.
	Float,
	/// Boolean flag.
	Boolean,
	/// Text.
	#[default]
	String,
	/// Timestamp without timezone.
	DateTime,
	/// Structured value stored as a serialized blob.
	Json,
}

impl FieldKind {
	/// Converts a dump value into a typed [`Value`].
	///
	/// # Arguments
	///
	/// * `field` - Field name, used in error messages
	/// * `raw` - Value as found in the dump
	pub fn coerce(&self, field: &str, raw: &serde_json::Value) -> SnapshotResult<Value> {
		if raw.is_null() {
			return Ok(Value::Null);
		}
		let mismatch = || SnapshotError::ValidationError {
			field: field.to_string(),
			message: format!("expected {:?}, found {}", self, raw),
		};
		let value = match self {
			Self::Integer => Value::Integer(raw.as_i64().ok_or_else(mismatch)?),
			Self::Float => Value::Float(raw.as_f64().ok_or_else(mismatch)?),
			Self::Boolean => Value::Bool(raw.as_bool().ok_or_else(mismatch)?),
			Self::String => match raw {
				serde_json::Value::String(s) => Value::String(s.clone()),
				serde_json::Value::Number(n) => Value::String(n.to_string()),
				_ => return Err(mismatch()),
			},
			Self::DateTime => {
				let text = raw.as_str().ok_or_else(mismatch)?;
				Value::DateTime(parse_timestamp(text)?)
			}
			Self::Json => Value::Json(raw.clone()),
		};
		Ok(value)
	}
}

/// Scalar field of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
	/// Field name.
	pub name: String,
	/// Storage kind.
	#[serde(default)]
	pub kind: FieldKind,
	/// Value a freshly constructed record holds.
	#[serde(default)]
	pub default: Option<serde_json::Value>,
	/// Whether a loader may assign the field after construction.
	#[serde(default = "default_true")]
	pub settable: bool,
	/// Excluded from generated loaders.
	#[serde(default)]
	pub ignore_in_snapshot: bool,
}

impl FieldDescriptor {
	/// Creates a settable field of the given kind without default.
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			default: None,
			settable: true,
			ignore_in_snapshot: false,
		}
	}

	/// Sets the construction default.
	pub fn with_default(mut self, default: serde_json::Value) -> Self {
		self.default = Some(default);
		self
	}

	/// Marks the field as excluded from generated loaders.
	pub fn ignored_in_snapshot(mut self) -> Self {
		self.ignore_in_snapshot = true;
		self
	}

	/// Marks the field as read-only.
	pub fn read_only(mut self) -> Self {
		self.settable = false;
		self
	}

	/// The value a blank record holds for this field.
	pub fn default_value(&self) -> SnapshotResult<Value> {
		match &self.default {
			Some(raw) => self.kind.coerce(&self.name, raw),
			None => Ok(Value::Null),
		}
	}
}

/// How many records a relation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
	/// Many-to-one or one-to-one.
	#[default]
	Single,
	/// One-to-many or many-to-many.
	Collection,
}

/// Relation from one model to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
	/// Field name.
	pub name: String,
	/// Qualified target model.
	pub target: String,
	/// `true` when this side stores the relation.
	#[serde(default = "default_true")]
	pub owning: bool,
	/// Single or collection valued.
	#[serde(default)]
	pub cardinality: Cardinality,
	/// Excluded from generated loaders and from dependency ordering.
	#[serde(default)]
	pub ignore_in_snapshot: bool,
}

impl RelationDescriptor {
	/// Owning single-valued relation.
	pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			target: target.into(),
			owning: true,
			cardinality: Cardinality::Single,
			ignore_in_snapshot: false,
		}
	}

	/// Owning collection-valued relation.
	pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			cardinality: Cardinality::Collection,
			..Self::to_one(name, target)
		}
	}

	/// Marks the relation as the inverse side.
	pub fn inverse(mut self) -> Self {
		self.owning = false;
		self
	}

	/// Marks the relation as excluded from generated loaders.
	pub fn ignored_in_snapshot(mut self) -> Self {
		self.ignore_in_snapshot = true;
		self
	}

	/// Decodes a dump value for this relation into record keys.
	///
	/// A bare identifier points at the declared target; an object carrying
	/// `model` and `pk` names a concrete subtype of an abstract target.
	pub fn coerce(&self, raw: &serde_json::Value) -> SnapshotResult<Value> {
		match (self.cardinality, raw) {
			(_, serde_json::Value::Null) => Ok(match self.cardinality {
				Cardinality::Single => Value::Null,
				Cardinality::Collection => Value::Collection(Vec::new()),
			}),
			(Cardinality::Single, raw) => self.decode_key(raw).map(Value::Reference),
			(Cardinality::Collection, serde_json::Value::Array(items)) => items
				.iter()
				.map(|item| self.decode_key(item))
				.collect::<SnapshotResult<Vec<_>>>()
				.map(Value::Collection),
			(Cardinality::Collection, other) => Err(SnapshotError::ValidationError {
				field: self.name.clone(),
				message: format!("expected an array of identifiers, found {}", other),
			}),
		}
	}

	fn decode_key(&self, raw: &serde_json::Value) -> SnapshotResult<RecordKey> {
		if let Some(pk) = PrimaryKey::from_json(raw) {
			return Ok(RecordKey::new(self.target.clone(), pk));
		}
		if let serde_json::Value::Object(map) = raw
			&& let Some(model) = map.get("model").and_then(|m| m.as_str())
			&& let Some(pk) = map.get("pk").and_then(PrimaryKey::from_json)
		{
			return Ok(RecordKey::new(model, pk));
		}
		Err(SnapshotError::ValidationError {
			field: self.name.clone(),
			message: format!("cannot read a related identifier from {}", raw),
		})
	}
}

/// Constructor parameter of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorParam {
	/// Parameter name.
	pub name: String,
	/// Field read to obtain the argument; defaults to the parameter name.
	#[serde(default)]
	pub accessor: Option<String>,
	/// Parameters with a default are not passed by generated loaders.
	#[serde(default)]
	pub has_default: bool,
}

impl ConstructorParam {
	/// Required parameter read from the field of the same name.
	pub fn required(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			accessor: None,
			has_default: false,
		}
	}

	/// Field holding the argument value.
	pub fn source_field(&self) -> &str {
		self.accessor.as_deref().unwrap_or(&self.name)
	}
}

/// Structural description of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
	/// Qualified name (`app.Model`).
	pub model: String,
	/// Identifier fields. Exactly one is supported by the generator.
	#[serde(default = "default_identifiers")]
	pub identifiers: Vec<String>,
	/// Scalar fields in declaration order.
	#[serde(default)]
	pub fields: Vec<FieldDescriptor>,
	/// Relations in declaration order.
	#[serde(default)]
	pub relations: Vec<RelationDescriptor>,
	/// Constructor parameters in declaration order.
	#[serde(default)]
	pub constructor: Vec<ConstructorParam>,
	/// Abstract models are never exported themselves.
	#[serde(default, rename = "abstract")]
	pub is_abstract: bool,
	/// Discriminator value to concrete member model.
	#[serde(default)]
	pub discriminator_map: IndexMap<String, String>,
	/// Model-level opt out of snapshots.
	#[serde(default)]
	pub snapshot_ignore: bool,
	/// Storage area the model is declared in (for example `vendor`).
	#[serde(default)]
	pub storage_area: Option<String>,
}

impl ModelDescriptor {
	/// Creates an empty concrete model with an `id` identifier.
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			identifiers: default_identifiers(),
			fields: Vec::new(),
			relations: Vec::new(),
			constructor: Vec::new(),
			is_abstract: false,
			discriminator_map: IndexMap::new(),
			snapshot_ignore: false,
			storage_area: None,
		}
	}

	/// Replaces the identifier fields.
	pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.identifiers = identifiers.into_iter().map(Into::into).collect();
		self
	}

	/// Appends a scalar field.
	pub fn with_field(mut self, field: FieldDescriptor) -> Self {
		self.fields.push(field);
		self
	}

	/// Appends a relation.
	pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
		self.relations.push(relation);
		self
	}

	/// Appends a constructor parameter.
	pub fn with_constructor_param(mut self, param: ConstructorParam) -> Self {
		self.constructor.push(param);
		self
	}

	/// Marks the model abstract with the given discriminator members.
	pub fn with_discriminator<I, K, V>(mut self, members: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.is_abstract = true;
		self.discriminator_map = members
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		self
	}

	/// Marks the model abstract.
	pub fn abstract_model(mut self) -> Self {
		self.is_abstract = true;
		self
	}

	/// Opts the model out of snapshots.
	pub fn ignored_in_snapshot(mut self) -> Self {
		self.snapshot_ignore = true;
		self
	}

	/// Sets the storage area.
	pub fn in_area(mut self, area: impl Into<String>) -> Self {
		self.storage_area = Some(area.into());
		self
	}

	/// Returns the app label (part before the dot).
	pub fn app_label(&self) -> Option<&str> {
		self.model.split('.').next()
	}

	/// Returns the model name (part after the dot).
	pub fn model_name(&self) -> Option<&str> {
		self.model.split('.').nth(1)
	}

	/// Returns the single identifier field.
	///
	/// # Errors
	///
	/// [`SnapshotError::MissingIdentifier`] when none is declared and
	/// [`SnapshotError::CompositeIdentifier`] when several are.
	pub fn identifier(&self) -> SnapshotResult<&str> {
		match self.identifiers.as_slice() {
			[single] => Ok(single),
			[] => Err(SnapshotError::MissingIdentifier(self.model.clone())),
			many => Err(SnapshotError::CompositeIdentifier {
				model: self.model.clone(),
				fields: many.to_vec(),
			}),
		}
	}

	/// Looks up a scalar field.
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Looks up a relation.
	pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
		self.relations.iter().find(|r| r.name == name)
	}

	/// Constructor parameters a loader must supply.
	pub fn required_constructor_params(&self) -> impl Iterator<Item = &ConstructorParam> {
		self.constructor.iter().filter(|p| !p.has_default)
	}

	/// Targets this model must be loaded after.
	///
	/// Only owning relations count; self references and relations excluded
	/// from snapshots do not.
	pub fn dependencies(&self) -> impl Iterator<Item = &str> {
		self.relations
			.iter()
			.filter(|r| r.owning && !r.ignore_in_snapshot && r.target != self.model)
			.map(|r| r.target.as_str())
	}
}
