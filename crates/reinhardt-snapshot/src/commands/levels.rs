//! levels command implementation.
//!
//! Prints the load level of every exportable model without touching any
//! record store.

use crate::config::SnapshotConfig;
use crate::error::SnapshotResult;
use crate::resolver::{LevelResolution, LevelResolver, SkipReason, collect_candidates};
use crate::schema::Schema;

/// Load order of the configured schema.
#[derive(Debug, Clone, Default)]
pub struct LevelsReport {
	/// Ordered and unordered models.
	pub resolution: LevelResolution,
	/// Models left out before ordering.
	pub skipped: Vec<(String, SkipReason)>,
}

/// Resolves load levels for the configured schema.
#[derive(Debug, Clone)]
pub struct LevelsCommand {
	config: SnapshotConfig,
}

impl LevelsCommand {
	/// Creates the command.
	pub fn new(config: SnapshotConfig) -> Self {
		Self { config }
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"levels"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Shows the dependency level of every exportable model"
	}

	/// Loads the schema and resolves levels.
	pub fn execute(&self) -> SnapshotResult<LevelsReport> {
		let schema = Schema::from_file(&self.config.schema.path)?;
		Ok(Self::resolve(&schema, &self.config))
	}

	/// Resolves levels of an already loaded schema.
	pub fn resolve(schema: &Schema, config: &SnapshotConfig) -> LevelsReport {
		let candidates = collect_candidates(schema, &config.models);
		let resolution = LevelResolver::new(schema).resolve(&candidates.models);
		LevelsReport {
			resolution,
			skipped: candidates.skipped,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_levels_from_schema_file() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let schema_path = dir.path().join("schema.toml");
		std::fs::write(
			&schema_path,
			r#"
[[models]]
model = "blog.Book"
relations = [{ name = "author", target = "blog.Author" }]

[[models]]
model = "blog.Author"

[[models]]
model = "blog.Base"
abstract = true
"#,
		)
		.unwrap();
		let config = SnapshotConfig::default().with_schema_path(&schema_path);

		// Act
		let report = LevelsCommand::new(config).execute().unwrap();

		// Assert
		assert_eq!(report.resolution.level_of("blog.Author"), Some(1));
		assert_eq!(report.resolution.level_of("blog.Book"), Some(2));
		assert_eq!(report.skipped, vec![("blog.Base".to_string(), SkipReason::Abstract)]);
	}
}
