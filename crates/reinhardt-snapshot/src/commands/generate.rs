//! generate command implementation.
//!
//! Exports a single model (optionally a list of identifiers) or, in snapshot
//! mode, every eligible model in dependency order.

use crate::commands::{parse_ids, validate_model_name};
use crate::config::SnapshotConfig;
use crate::error::{SnapshotError, SnapshotResult};
use crate::schema::Schema;
use crate::snapshot::{
	ExportOutcome, ExportRequest, SnapshotOptions, SnapshotReport, SnapshotReporter, Snapshotter,
};
use crate::store::MemoryStore;
use crate::writer::FixtureWriter;

/// Arguments for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateFixtureArgs {
	/// Qualified model to export. Required unless `snapshot` is set.
	pub model: Option<String>,

	/// Identifiers and ranges, for example `"1 4-6"`.
	pub ids: Option<String>,

	/// Export every eligible model.
	pub snapshot: bool,
}

impl GenerateFixtureArgs {
	/// Single-model export of `model`.
	pub fn model(model: impl Into<String>) -> Self {
		Self {
			model: Some(model.into()),
			..Self::default()
		}
	}

	/// Whole-model snapshot.
	pub fn snapshot() -> Self {
		Self {
			snapshot: true,
			..Self::default()
		}
	}

	/// Sets the identifier list.
	pub fn with_ids(mut self, ids: impl Into<String>) -> Self {
		self.ids = Some(ids.into());
		self
	}
}

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateFixtureOptions {
	/// Loader name, or the name prefix in snapshot mode.
	pub name: Option<String>,

	/// Declared load order of a single-model export.
	pub order: Option<u32>,

	/// Replace existing loaders.
	pub overwrite: bool,

	/// Store alias to read records from.
	pub connection: Option<String>,

	/// Overrides the configured empty-export behaviour.
	pub skip_empty: Option<bool>,
}

impl GenerateFixtureOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the loader name or prefix.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the load order.
	pub fn with_order(mut self, order: u32) -> Self {
		self.order = Some(order);
		self
	}

	/// Sets overwrite flag.
	pub fn with_overwrite(mut self, overwrite: bool) -> Self {
		self.overwrite = overwrite;
		self
	}

	/// Sets the store alias.
	pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
		self.connection = Some(connection.into());
		self
	}

	/// Sets skip empty flag.
	pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
		self.skip_empty = Some(skip_empty);
		self
	}
}

/// Result of the generate command.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
	/// Outcome of a single-model export.
	Single {
		/// Exported model.
		model: String,
		/// Outcome.
		outcome: ExportOutcome,
	},
	/// Report of a snapshot run.
	Snapshot(SnapshotReport),
}

/// The generate command.
///
/// # Example
///
/// ```ignore
/// let command = GenerateFixtureCommand::new(SnapshotConfig::from_file("snapshot.toml")?);
/// let outcome = command.execute(
///     GenerateFixtureArgs::model("blog.Book").with_ids("1 4-6"),
///     GenerateFixtureOptions::new().with_name("starter_books"),
///     &TracingReporter,
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct GenerateFixtureCommand {
	config: SnapshotConfig,
}

impl GenerateFixtureCommand {
	/// Creates the command.
	pub fn new(config: SnapshotConfig) -> Self {
		Self { config }
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"generate"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Generates replayable fixture loaders from stored records"
	}

	/// Executes the command.
	///
	/// # Errors
	///
	/// Fails when the schema or store cannot be loaded, on an invalid model
	/// name and, in single-model mode, on any export failure.
	pub fn execute(
		&self,
		args: GenerateFixtureArgs,
		options: GenerateFixtureOptions,
		reporter: &dyn SnapshotReporter,
	) -> SnapshotResult<CommandOutcome> {
		let model = if args.snapshot {
			None
		} else {
			let model = args.model.ok_or_else(|| SnapshotError::ValidationError {
				field: "model".to_string(),
				message: "A model must be given unless exporting a snapshot".to_string(),
			})?;
			validate_model_name(&model)?;
			Some(model)
		};

		let schema = Schema::from_file(&self.config.schema.path)?;
		let store_paths = self.config.store_paths(options.connection.as_deref())?;
		let store = MemoryStore::load_files(&schema, store_paths)?;
		let writer = FixtureWriter::new(&self.config.output.directory)
			.with_backup(self.config.output.backup_existing);

		let mut snapshot_options =
			SnapshotOptions::from_config(&self.config).with_overwrite(options.overwrite);
		if let Some(skip_empty) = options.skip_empty {
			snapshot_options.skip_empty = skip_empty;
		}

		match model {
			None => {
				if options.name.is_some() {
					snapshot_options.name_prefix = options.name;
				}
				let report = Snapshotter::new(&schema, &store, writer)
					.with_filter(self.config.models.clone())
					.with_options(snapshot_options)
					.run(reporter)?;
				Ok(CommandOutcome::Snapshot(report))
			}
			Some(model) => {
				let mut request = ExportRequest::new(&model)
					.with_ids(args.ids.as_deref().map(parse_ids).unwrap_or_default());
				request.name = options.name;
				if let Some(order) = options.order {
					request = request.with_order(order);
				}
				let outcome = Snapshotter::new(&schema, &store, writer)
					.with_options(snapshot_options)
					.export(&request)?;
				Ok(CommandOutcome::Single { model, outcome })
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::snapshot::TracingReporter;
	use rstest::{fixture, rstest};
	use std::path::Path;
	use tempfile::TempDir;

	const SCHEMA: &str = r#"
[[models]]
model = "blog.Author"
fields = [{ name = "name", kind = "string" }]

[[models]]
model = "blog.Book"
fields = [{ name = "title", kind = "string" }]
relations = [{ name = "author", target = "blog.Author" }]
"#;

	const DUMP: &str = r#"[
	{"model": "blog.Author", "pk": 1, "fields": {"name": "Ursula"}},
	{"model": "blog.Book", "pk": 4, "fields": {"title": "Lathe", "author": 1}},
	{"model": "blog.Book", "pk": 5, "fields": {"title": "Eye", "author": 1}},
	{"model": "blog.Book", "pk": 6, "fields": {"title": "Ocean", "author": 1}}
]"#;

	#[fixture]
	fn project() -> TempDir {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("schema.toml"), SCHEMA).unwrap();
		std::fs::write(dir.path().join("dump.json"), DUMP).unwrap();
		dir
	}

	fn config(root: &Path) -> SnapshotConfig {
		SnapshotConfig::default()
			.with_schema_path(root.join("schema.toml"))
			.with_store("default", vec![root.join("dump.json")])
			.with_output_dir(root.join("fixtures"))
	}

	#[rstest]
	fn test_single_model_with_id_range(project: TempDir) {
		// Arrange
		let command = GenerateFixtureCommand::new(config(project.path()));

		// Act
		let outcome = command
			.execute(
				GenerateFixtureArgs::model("blog.Book").with_ids("4-5"),
				GenerateFixtureOptions::new().with_name("early books").with_order(3),
				&TracingReporter,
			)
			.unwrap();

		// Assert
		let CommandOutcome::Single { model, outcome } = outcome else {
			panic!("expected a single-model outcome");
		};
		assert_eq!(model, "blog.Book");
		assert!(matches!(outcome, ExportOutcome::Generated { records: 2, .. }));
		let code =
			std::fs::read_to_string(project.path().join("fixtures/load_early_books.rs")).unwrap();
		assert!(code.contains("pub struct LoadEarlyBooks;"));
		assert!(code.contains("PrimaryKey::Integer(5)"));
		assert!(!code.contains("PrimaryKey::Integer(6)"));
	}

	#[rstest]
	fn test_multiple_ids_require_name(project: TempDir) {
		let command = GenerateFixtureCommand::new(config(project.path()));

		let result = command.execute(
			GenerateFixtureArgs::model("blog.Book").with_ids("4 5"),
			GenerateFixtureOptions::new(),
			&TracingReporter,
		);

		assert!(matches!(result, Err(SnapshotError::UnnamedFixture)));
	}

	#[rstest]
	fn test_single_model_conflict_aborts(project: TempDir) {
		let command = GenerateFixtureCommand::new(config(project.path()));
		let args = GenerateFixtureArgs::model("blog.Author").with_ids("1");

		command
			.execute(args.clone(), GenerateFixtureOptions::new(), &TracingReporter)
			.unwrap();
		let second = command.execute(args.clone(), GenerateFixtureOptions::new(), &TracingReporter);
		let forced = command.execute(
			args,
			GenerateFixtureOptions::new().with_overwrite(true),
			&TracingReporter,
		);

		assert!(matches!(second, Err(SnapshotError::FixtureExists { .. })));
		assert!(forced.is_ok());
	}

	#[rstest]
	fn test_snapshot_mode(project: TempDir) {
		let command = GenerateFixtureCommand::new(config(project.path()));

		let outcome = command
			.execute(
				GenerateFixtureArgs::snapshot(),
				GenerateFixtureOptions::new().with_name("seed"),
				&TracingReporter,
			)
			.unwrap();

		let CommandOutcome::Snapshot(report) = outcome else {
			panic!("expected a snapshot report");
		};
		assert_eq!(report.generated(), 2);
		assert!(project.path().join("fixtures/load_seed_blog_author.rs").is_file());
		assert!(project.path().join("fixtures/load_seed_blog_book.rs").is_file());
		assert!(project.path().join("fixtures/mod.rs").is_file());
	}

	#[rstest]
	#[case(GenerateFixtureArgs::default())]
	#[case(GenerateFixtureArgs::model("Book"))]
	fn test_invalid_model_argument(project: TempDir, #[case] args: GenerateFixtureArgs) {
		let command = GenerateFixtureCommand::new(config(project.path()));

		let result = command.execute(args, GenerateFixtureOptions::new(), &TracingReporter);

		assert!(matches!(
			result,
			Err(SnapshotError::ValidationError { .. } | SnapshotError::InvalidModelName(_))
		));
	}

	#[rstest]
	fn test_unknown_connection(project: TempDir) {
		let command = GenerateFixtureCommand::new(config(project.path()));

		let result = command.execute(
			GenerateFixtureArgs::snapshot(),
			GenerateFixtureOptions::new().with_connection("replica"),
			&TracingReporter,
		);

		assert!(matches!(result, Err(SnapshotError::Config(_))));
	}
}
