//! In-memory replay target.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::ObjectManager;
use crate::error::{SnapshotError, SnapshotResult};
use crate::record::Record;
use crate::store::MemoryStore;
use crate::value::{PrimaryKey, RecordKey};

/// Keeps replayed records in memory.
///
/// Models whose id generation is left enabled get sequential integer
/// identifiers on flush, starting after the highest integer identifier
/// already committed for that model.
#[derive(Debug, Default)]
pub struct MemoryObjectManager {
	pending: Vec<Record>,
	committed: IndexMap<RecordKey, Record>,
	manual_ids: HashSet<String>,
	sequences: HashMap<String, i64>,
}

impl MemoryObjectManager {
	/// Creates an empty manager.
	pub fn new() -> Self {
		Self::default()
	}

	/// Committed record with the given key.
	pub fn get(&self, key: &RecordKey) -> Option<&Record> {
		self.committed.get(key)
	}

	/// Committed records of one model, in commit order.
	pub fn records(&self, model: &str) -> Vec<&Record> {
		self.committed
			.values()
			.filter(|r| r.model() == model)
			.collect()
	}

	/// Number of committed records.
	pub fn len(&self) -> usize {
		self.committed.len()
	}

	/// Returns `true` when nothing has been committed.
	pub fn is_empty(&self) -> bool {
		self.committed.is_empty()
	}

	/// Number of persisted but not yet flushed records.
	pub fn pending(&self) -> usize {
		self.pending.len()
	}

	/// Turns the committed records into a store, for example to snapshot them
	/// again.
	pub fn into_store(self) -> MemoryStore {
		let mut store = MemoryStore::new();
		for record in self.committed.into_values() {
			store.insert(record);
		}
		store
	}

	fn next_id(&mut self, model: &str) -> i64 {
		let committed_max = self
			.committed
			.keys()
			.filter(|k| k.model == model)
			.filter_map(|k| match k.pk {
				PrimaryKey::Integer(n) => Some(n),
				PrimaryKey::Text(_) => None,
			})
			.max()
			.unwrap_or(0);
		let next = self
			.sequences
			.get(model)
			.copied()
			.unwrap_or(0)
			.max(committed_max)
			+ 1;
		self.sequences.insert(model.to_string(), next);
		next
	}
}

impl ObjectManager for MemoryObjectManager {
	fn disable_id_generation(&mut self, model: &str) {
		self.manual_ids.insert(model.to_string());
	}

	fn persist(&mut self, record: Record) -> SnapshotResult<()> {
		self.pending.push(record);
		Ok(())
	}

	fn flush(&mut self) -> SnapshotResult<()> {
		let pending = std::mem::take(&mut self.pending);
		let count = pending.len();
		for mut record in pending {
			if !self.manual_ids.contains(record.model()) {
				let id = self.next_id(record.model());
				record.set_pk(id);
			}
			let key = record.key();
			if self.committed.contains_key(&key) {
				return Err(SnapshotError::DuplicateRecord(key.to_string()));
			}
			self.committed.insert(key, record);
		}
		tracing::debug!(records = count, "flushed pending records");
		Ok(())
	}
}
