//! Runtime API for generated loaders.
//!
//! Generated modules implement [`OrderedFixture`] and talk to an
//! [`ObjectManager`] and a shared [`ReferenceRepository`]. [`FixtureExecutor`]
//! runs a set of loaders in their declared order.
//!
//! ```
//! use reinhardt_snapshot::replay::prelude::*;
//! use reinhardt_snapshot::replay::{FixtureExecutor, MemoryObjectManager};
//!
//! struct LoadTags;
//!
//! impl OrderedFixture for LoadTags {
//!     fn order(&self) -> u32 {
//!         1
//!     }
//!
//!     fn load(
//!         &self,
//!         manager: &mut dyn ObjectManager,
//!         references: &mut ReferenceRepository,
//!     ) -> SnapshotResult<()> {
//!         manager.disable_id_generation("blog.Tag");
//!         let mut item1 = Record::new("blog.Tag", PrimaryKey::Integer(1));
//!         references.add_reference("_reference_blog_Tag_1", &item1);
//!         item1.set("label", Value::from("rust"));
//!         manager.persist(item1)?;
//!         manager.flush()
//!     }
//! }
//!
//! let mut manager = MemoryObjectManager::new();
//! let mut executor = FixtureExecutor::new();
//! executor.add(Box::new(LoadTags));
//! executor.execute(&mut manager).unwrap();
//! assert_eq!(manager.records("blog.Tag").len(), 1);
//! ```

mod memory;

use std::collections::HashMap;

use crate::error::{SnapshotError, SnapshotResult};
use crate::record::Record;
use crate::value::RecordKey;

pub use memory::MemoryObjectManager;

/// Items generated loaders import.
pub mod prelude {
	pub use super::{ObjectManager, OrderedFixture, ReferenceRepository};
	pub use crate::error::SnapshotResult;
	pub use crate::record::Record;
	pub use crate::value::{PrimaryKey, RecordKey, Value};
}

/// Destination of replayed records.
pub trait ObjectManager {
	/// Keeps the identifiers of `model` as given instead of generating them.
	fn disable_id_generation(&mut self, model: &str);

	/// Schedules a record for insertion.
	fn persist(&mut self, record: Record) -> SnapshotResult<()>;

	/// Commits every scheduled record.
	fn flush(&mut self) -> SnapshotResult<()>;
}

/// A loader with a position in the load sequence.
pub trait OrderedFixture {
	/// Position in the load sequence. Lower loads first.
	fn order(&self) -> u32;

	/// Recreates the loader's records.
	fn load(
		&self,
		manager: &mut dyn ObjectManager,
		references: &mut ReferenceRepository,
	) -> SnapshotResult<()>;
}

/// Symbolic references shared by every loader of one replay.
#[derive(Debug, Default)]
pub struct ReferenceRepository {
	references: HashMap<String, RecordKey>,
}

impl ReferenceRepository {
	/// Creates an empty repository.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `record` under `name`, replacing any previous binding.
	pub fn add_reference(&mut self, name: &str, record: &Record) {
		self.references.insert(name.to_string(), record.key());
	}

	/// Key of the record registered under `name`.
	///
	/// # Errors
	///
	/// [`SnapshotError::ReferenceNotFound`] when no loader registered it yet.
	pub fn get_reference(&self, name: &str) -> SnapshotResult<RecordKey> {
		self.references
			.get(name)
			.cloned()
			.ok_or_else(|| SnapshotError::ReferenceNotFound(name.to_string()))
	}

	/// Whether `name` is registered.
	pub fn has_reference(&self, name: &str) -> bool {
		self.references.contains_key(name)
	}

	/// Number of registered references.
	pub fn len(&self) -> usize {
		self.references.len()
	}

	/// Returns `true` when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}
}

/// Runs loaders in ascending order.
#[derive(Default)]
pub struct FixtureExecutor {
	fixtures: Vec<Box<dyn OrderedFixture>>,
}

impl FixtureExecutor {
	/// Creates an executor without loaders.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an executor for `fixtures`, for example the output of a
	/// generated `fixtures()` function.
	pub fn with_fixtures(fixtures: Vec<Box<dyn OrderedFixture>>) -> Self {
		Self { fixtures }
	}

	/// Adds a loader.
	pub fn add(&mut self, fixture: Box<dyn OrderedFixture>) {
		self.fixtures.push(fixture);
	}

	/// Runs every loader against `manager`. Loaders with equal order keep
	/// their insertion order. Stops at the first failure.
	///
	/// Returns the references registered during the run.
	pub fn execute(&self, manager: &mut dyn ObjectManager) -> SnapshotResult<ReferenceRepository> {
		let mut ordered: Vec<&dyn OrderedFixture> = self.fixtures.iter().map(|f| &**f).collect();
		ordered.sort_by_key(|f| f.order());

		let mut references = ReferenceRepository::new();
		for fixture in ordered {
			tracing::debug!(order = fixture.order(), "running loader");
			fixture.load(manager, &mut references)?;
		}
		Ok(references)
	}
}
