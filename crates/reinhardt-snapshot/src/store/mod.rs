//! Record fetching.
//!
//! The generator never talks to a datastore directly: it receives records from
//! a [`RecordFetcher`]. [`MemoryStore`] is the bundled implementation, seeded
//! from dump files.

mod format;
mod parser;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{SnapshotError, SnapshotResult};
use crate::record::Record;
use crate::schema::{ModelDescriptor, SchemaSource};
use crate::value::PrimaryKey;

pub use format::{DumpFormat, DumpRecord};
pub use parser::DumpParser;

/// Source of persisted records.
///
/// Failures are surfaced to the caller as-is; implementations should report
/// them as [`SnapshotError::FetchError`].
pub trait RecordFetcher {
	/// Every record whose concrete model is exactly `model`.
	fn fetch_all(&self, model: &ModelDescriptor) -> SnapshotResult<Vec<Record>>;

	/// Records of `model` whose identifier is in `ids`.
	///
	/// # Errors
	///
	/// Fails when the model does not declare exactly one identifier.
	fn fetch_by_identifiers(
		&self,
		model: &ModelDescriptor,
		ids: &[PrimaryKey],
	) -> SnapshotResult<Vec<Record>>;
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	records: IndexMap<String, Vec<Record>>,
}

impl MemoryStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a store from dump entries, typing every entry through the schema.
	///
	/// # Errors
	///
	/// Fails with [`SnapshotError::ModelNotFound`] for entries of undeclared
	/// models and with the record conversion error for malformed entries.
	pub fn from_dump<S>(schema: &S, dump: &[DumpRecord]) -> SnapshotResult<Self>
	where
		S: SchemaSource + ?Sized,
	{
		let mut store = Self::new();
		for entry in dump {
			let model = schema
				.model(&entry.model)
				.ok_or_else(|| SnapshotError::ModelNotFound(entry.model.clone()))?;
			store.insert(Record::from_dump(entry, model)?);
		}
		Ok(store)
	}

	/// Builds a store from dump files.
	pub fn load_files<S, P>(schema: &S, paths: &[P]) -> SnapshotResult<Self>
	where
		S: SchemaSource + ?Sized,
		P: AsRef<Path>,
	{
		let dump = DumpParser::new().parse_files(paths)?;
		let store = Self::from_dump(schema, &dump)?;
		tracing::info!(records = store.len(), files = paths.len(), "loaded record store");
		Ok(store)
	}

	/// Adds a record.
	pub fn insert(&mut self, record: Record) {
		self.records
			.entry(record.model().to_string())
			.or_default()
			.push(record);
	}

	/// Total number of records.
	pub fn len(&self) -> usize {
		self.records.values().map(Vec::len).sum()
	}

	/// Returns `true` when the store holds no record.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Records of one model in insertion order.
	pub fn records(&self, model: &str) -> &[Record] {
		self.records.get(model).map(Vec::as_slice).unwrap_or_default()
	}
}

impl RecordFetcher for MemoryStore {
	fn fetch_all(&self, model: &ModelDescriptor) -> SnapshotResult<Vec<Record>> {
		Ok(self.records(&model.model).to_vec())
	}

	fn fetch_by_identifiers(
		&self,
		model: &ModelDescriptor,
		ids: &[PrimaryKey],
	) -> SnapshotResult<Vec<Record>> {
		model.identifier()?;
		let wanted: HashSet<&PrimaryKey> = ids.iter().collect();
		Ok(self
			.records(&model.model)
			.iter()
			.filter(|r| wanted.contains(r.pk()))
			.cloned()
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{FieldDescriptor, FieldKind, Schema};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn schema() -> Schema {
		Schema::from_models(vec![
			ModelDescriptor::new("draw.Shape").with_discriminator([("circle", "draw.Circle")]),
			ModelDescriptor::new("draw.Circle")
				.with_field(FieldDescriptor::new("radius", FieldKind::Float)),
		])
		.unwrap()
	}

	#[fixture]
	fn store(schema: Schema) -> MemoryStore {
		let dump = vec![
			DumpRecord::new("draw.Circle", json!({"radius": 1.5})).with_pk(json!(1)),
			DumpRecord::new("draw.Circle", json!({"radius": 2.0})).with_pk(json!(2)),
			DumpRecord::new("draw.Circle", json!({"radius": 4.0})).with_pk(json!(3)),
		];
		MemoryStore::from_dump(&schema, &dump).unwrap()
	}

	#[rstest]
	fn test_fetch_all_is_exact_model(schema: Schema, store: MemoryStore) {
		let circles = store.fetch_all(schema.model("draw.Circle").unwrap()).unwrap();
		let shapes = store.fetch_all(schema.model("draw.Shape").unwrap()).unwrap();

		assert_eq!(circles.len(), 3);
		assert!(shapes.is_empty());
	}

	#[rstest]
	fn test_fetch_by_identifiers_keeps_store_order(schema: Schema, store: MemoryStore) {
		let ids = vec![PrimaryKey::Integer(3), PrimaryKey::Integer(1), PrimaryKey::Integer(9)];

		let records = store
			.fetch_by_identifiers(schema.model("draw.Circle").unwrap(), &ids)
			.unwrap();

		let pks: Vec<&PrimaryKey> = records.iter().map(Record::pk).collect();
		assert_eq!(pks, vec![&PrimaryKey::Integer(1), &PrimaryKey::Integer(3)]);
	}

	#[rstest]
	fn test_fetch_by_identifiers_rejects_composite_key(store: MemoryStore) {
		let model = ModelDescriptor::new("draw.Circle").with_identifiers(["x", "y"]);

		let result = store.fetch_by_identifiers(&model, &[PrimaryKey::Integer(1)]);

		assert!(matches!(result, Err(SnapshotError::CompositeIdentifier { .. })));
	}

	#[rstest]
	fn test_from_dump_unknown_model(schema: Schema) {
		let dump = vec![DumpRecord::new("draw.Square", json!({})).with_pk(json!(1))];

		let result = MemoryStore::from_dump(&schema, &dump);

		assert!(matches!(result, Err(SnapshotError::ModelNotFound(m)) if m == "draw.Square"));
	}
}
