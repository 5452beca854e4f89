//! Records: one persisted instance of a model.

use indexmap::IndexMap;

use crate::error::{SnapshotError, SnapshotResult};
use crate::schema::ModelDescriptor;
use crate::store::DumpRecord;
use crate::value::{PrimaryKey, RecordKey, Value};

/// One persisted instance of a model with its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	model: String,
	pk: PrimaryKey,
	values: IndexMap<String, Value>,
}

impl Record {
	/// Creates a record without field values.
	pub fn new(model: impl Into<String>, pk: impl Into<PrimaryKey>) -> Self {
		Self {
			model: model.into(),
			pk: pk.into(),
			values: IndexMap::new(),
		}
	}

	/// Creates a record from constructor arguments.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_snapshot::{Record, Value};
	///
	/// let book = Record::construct("blog.Book", 3, [("isbn", Value::from("978-0"))]);
	/// assert_eq!(book.get("isbn"), Some(&Value::from("978-0")));
	/// ```
	pub fn construct<I, K>(model: impl Into<String>, pk: impl Into<PrimaryKey>, args: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		let mut record = Self::new(model, pk);
		for (name, value) in args {
			record.values.insert(name.into(), value);
		}
		record
	}

	/// Qualified model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Identifier value.
	pub fn pk(&self) -> &PrimaryKey {
		&self.pk
	}

	/// Replaces the identifier value.
	pub fn set_pk(&mut self, pk: impl Into<PrimaryKey>) {
		self.pk = pk.into();
	}

	/// Identity of this record.
	pub fn key(&self) -> RecordKey {
		RecordKey::new(self.model.clone(), self.pk.clone())
	}

	/// Field value, if the record carries one.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.values.get(field)
	}

	/// Assigns a field value.
	pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.values.insert(field.into(), value.into());
	}

	/// Field values in assignment order.
	pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Builds a typed record from a dump entry.
	///
	/// The identifier comes from `pk`, or from the identifier field when the
	/// dump stores it among the fields. Unknown dump fields are ignored.
	pub fn from_dump(dump: &DumpRecord, model: &ModelDescriptor) -> SnapshotResult<Self> {
		let identifier = model.identifier()?;
		let raw_pk = dump
			.pk
			.as_ref()
			.or_else(|| dump.fields.get(identifier))
			.ok_or_else(|| SnapshotError::ValidationError {
				field: format!("{}.{}", model.model, identifier),
				message: "record has no identifier value".to_string(),
			})?;
		let pk = PrimaryKey::from_json(raw_pk).ok_or_else(|| SnapshotError::ValidationError {
			field: format!("{}.{}", model.model, identifier),
			message: format!("unsupported identifier value {}", raw_pk),
		})?;

		let mut record = Self::new(model.model.clone(), pk);
		let Some(fields) = dump.fields.as_object() else {
			return Err(SnapshotError::InvalidFormat(format!(
				"fields of {} must be an object",
				model.model
			)));
		};
		for (name, raw) in fields {
			if name == identifier {
				continue;
			}
			if let Some(field) = model.field(name) {
				record.set(name.clone(), field.kind.coerce(name, raw)?);
			} else if let Some(relation) = model.relation(name) {
				record.set(name.clone(), relation.coerce(raw)?);
			} else {
				tracing::debug!(model = %model.model, field = %name, "ignoring undeclared dump field");
			}
		}
		Ok(record)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{FieldDescriptor, FieldKind, RelationDescriptor};
	use rstest::rstest;
	use serde_json::json;

	fn book_model() -> ModelDescriptor {
		ModelDescriptor::new("blog.Book")
			.with_field(FieldDescriptor::new("title", FieldKind::String))
			.with_field(FieldDescriptor::new("published", FieldKind::DateTime))
			.with_relation(RelationDescriptor::to_one("author", "blog.Author"))
	}

	#[rstest]
	fn test_from_dump_types_values() {
		// Arrange
		let dump = DumpRecord::new("blog.Book", json!({
			"title": "Dune",
			"published": "1965-08-01 00:00:00",
			"author": 7,
			"legacy_flag": true,
		}))
		.with_pk(json!(3));

		// Act
		let record = Record::from_dump(&dump, &book_model()).unwrap();

		// Assert
		assert_eq!(record.key(), RecordKey::new("blog.Book", 3));
		assert_eq!(record.get("title"), Some(&Value::from("Dune")));
		assert!(matches!(record.get("published"), Some(Value::DateTime(_))));
		assert_eq!(
			record.get("author"),
			Some(&Value::Reference(RecordKey::new("blog.Author", 7)))
		);
		assert_eq!(record.get("legacy_flag"), None);
	}

	#[rstest]
	fn test_from_dump_identifier_in_fields() {
		let dump = DumpRecord::new("blog.Book", json!({"id": "b-1", "title": "Emma"}));

		let record = Record::from_dump(&dump, &book_model()).unwrap();

		assert_eq!(record.pk(), &PrimaryKey::Text("b-1".to_string()));
		assert_eq!(record.get("id"), None);
	}

	#[rstest]
	fn test_from_dump_without_identifier() {
		let dump = DumpRecord::new("blog.Book", json!({"title": "Emma"}));

		let result = Record::from_dump(&dump, &book_model());

		assert!(matches!(result, Err(SnapshotError::ValidationError { .. })));
	}

	#[rstest]
	fn test_set_keeps_assignment_order() {
		let mut record = Record::new("blog.Tag", 1);
		record.set("b", 2);
		record.set("a", 1);

		let names: Vec<&str> = record.values().map(|(k, _)| k).collect();

		assert_eq!(names, vec!["b", "a"]);
	}
}
