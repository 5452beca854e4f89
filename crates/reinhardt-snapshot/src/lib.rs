//! Dependency-ordered fixture snapshots for the Reinhardt framework.
//!
//! This crate turns records held by a store into Rust fixture loaders that can
//! be replayed later to recreate the same data:
//!
//! - **Level resolution**: models are ordered so that every model is loaded
//!   after the models it points at
//! - **Loader generation**: each model becomes a module implementing
//!   [`OrderedFixture`](replay::OrderedFixture), with relations expressed as
//!   symbolic references resolved at replay time
//! - **Replay runtime**: the API the generated loaders call, plus an in-memory
//!   object manager
//!
//! # Features
//!
//! - `json` - JSON dump and schema support (enabled by default)
//! - `yaml` - YAML dump and schema support
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! Describe the models (`snapshot/schema.toml`):
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
//!
//! Export every model from a dump:
//!
//! ```ignore
//! use reinhardt_snapshot::prelude::*;
//!
//! let schema = Schema::from_file(Path::new("snapshot/schema.toml"))?;
//! let store = MemoryStore::load_files(&schema, &["snapshot/dump.json"])?;
//! let report = Snapshotter::new(&schema, &store, FixtureWriter::new("src/fixtures"))
//!     .run(&TracingReporter)?;
//! println!("{} loader(s) written", report.generated());
//! ```
//!
//! Replay the generated loaders:
//!
//! ```ignore
//! let mut manager = MemoryObjectManager::new();
//! FixtureExecutor::new()
//!     .with_fixtures(fixtures::fixtures())
//!     .execute(&mut manager)?;
//! ```
//!
//! # Architecture
//!
//! - [`SchemaSource`](schema::SchemaSource) / [`Schema`](schema::Schema) - model metadata
//! - [`RecordFetcher`](store::RecordFetcher) / [`MemoryStore`](store::MemoryStore) - record source
//! - [`LevelResolver`](resolver::LevelResolver) - dependency levels
//! - [`ReferenceNamer`](naming::ReferenceNamer) - symbolic reference names
//! - [`FixtureGenerator`](generator::FixtureGenerator) - loader source generation
//! - [`FixtureWriter`](writer::FixtureWriter) - output files
//! - [`Snapshotter`](snapshot::Snapshotter) - orchestration
//! - [`GenerateFixtureCommand`](commands::GenerateFixtureCommand) - command glue

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod naming;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod replay;
pub mod resolver;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod value;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::SnapshotConfig;
pub use error::{SnapshotError, SnapshotResult};
pub use record::Record;
pub use snapshot::{Snapshotter, TracingReporter};
pub use value::{PrimaryKey, RecordKey, Value};
