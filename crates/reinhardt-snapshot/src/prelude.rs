//! Convenience re-exports for common usage.
//!
//! Generated loaders import [`crate::replay::prelude`] instead; this prelude
//! covers the generation side.

// Error types
pub use crate::error::{SnapshotError, SnapshotResult};

// Values and records
pub use crate::record::Record;
pub use crate::value::{PrimaryKey, RecordKey, Value};

// Schema and store
pub use crate::schema::{
	ConstructorParam, FieldDescriptor, FieldKind, ModelDescriptor, RelationDescriptor, Schema,
	SchemaSource,
};
pub use crate::store::{DumpParser, DumpRecord, MemoryStore, RecordFetcher};

// Generation
pub use crate::config::SnapshotConfig;
pub use crate::generator::FixtureGenerator;
pub use crate::naming::{FixtureName, ReferenceNamer, SymbolicReference};
pub use crate::registry::{LookupSite, ReferenceRegistry};
pub use crate::resolver::{LevelResolution, LevelResolver, OrderedEntity, collect_candidates};
pub use crate::snapshot::{
	ExportOutcome, ExportRequest, SnapshotOptions, SnapshotReport, SnapshotReporter, Snapshotter,
	TracingReporter,
};
pub use crate::writer::FixtureWriter;

// Replay
pub use crate::replay::{FixtureExecutor, MemoryObjectManager, ObjectManager, OrderedFixture};

// Command types
pub use crate::commands::{
	CommandOutcome, GenerateFixtureArgs, GenerateFixtureCommand, GenerateFixtureOptions,
	LevelsCommand,
};
