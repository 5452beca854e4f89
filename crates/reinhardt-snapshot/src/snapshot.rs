//! Snapshot orchestration.
//!
//! [`Snapshotter::run`] exports every eligible model in dependency order: it
//! collects candidates, resolves load levels, then fetches, generates and
//! writes one loader per model. All loaders of a run share one
//! [`ReferenceRegistry`], so a record referenced from several loaders always
//! gets the same symbolic name.
//!
//! [`Snapshotter::export`] exports a single model, optionally restricted to a
//! list of identifiers.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{ModelFilterConfig, SnapshotConfig};
use crate::error::{SnapshotError, SnapshotResult};
use crate::generator::{DEFAULT_RUNTIME_CRATE, FixtureGenerator};
use crate::naming::{DEFAULT_REFERENCE_PREFIX, FixtureName, ReferenceNamer};
use crate::record::Record;
use crate::registry::ReferenceRegistry;
use crate::resolver::{LevelResolver, SkipReason, collect_candidates};
use crate::schema::{ModelDescriptor, SchemaSource};
use crate::store::RecordFetcher;
use crate::value::PrimaryKey;
use crate::writer::{FixtureWriter, WriteStatus};

/// Options shared by snapshot and single-model exports.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
	/// Prefix of snapshot loader names.
	pub name_prefix: Option<String>,
	/// Replace loaders that already exist.
	pub overwrite: bool,
	/// Write nothing for models without records.
	pub skip_empty: bool,
	/// Crate path the loaders import the replay API from.
	pub runtime_crate: String,
	/// Prefix of symbolic reference names.
	pub reference_prefix: String,
	/// Write a `mod.rs` listing the snapshot loaders.
	pub write_index: bool,
}

impl Default for SnapshotOptions {
	fn default() -> Self {
		Self {
			name_prefix: None,
			overwrite: false,
			skip_empty: true,
			runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
			reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
			write_index: true,
		}
	}
}

impl SnapshotOptions {
	/// Options taken from the `[generation]` and `[output]` sections.
	pub fn from_config(config: &SnapshotConfig) -> Self {
		Self {
			name_prefix: config.generation.name_prefix.clone(),
			overwrite: false,
			skip_empty: config.generation.skip_empty,
			runtime_crate: config.generation.runtime_crate.clone(),
			reference_prefix: config.generation.reference_prefix.clone(),
			write_index: config.output.write_index,
		}
	}

	/// Enables or disables overwriting existing loaders.
	pub fn with_overwrite(mut self, overwrite: bool) -> Self {
		self.overwrite = overwrite;
		self
	}

	/// Enables or disables skipping models without records.
	pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
		self.skip_empty = skip_empty;
		self
	}

	/// Sets the snapshot loader name prefix.
	pub fn with_name_prefix(mut self, prefix: Option<String>) -> Self {
		self.name_prefix = prefix;
		self
	}
}

/// What happened to one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
	/// A loader was written.
	Generated {
		/// Loader file.
		path: PathBuf,
		/// Number of exported records.
		records: usize,
		/// Whether the file was created or replaced.
		status: WriteStatus,
	},
	/// The model had no records and empty exports are skipped.
	SkippedEmpty,
	/// A loader already exists and overwriting was not requested.
	Conflict {
		/// Existing file.
		path: PathBuf,
	},
	/// Generation failed for this model.
	Failed {
		/// Error message.
		message: String,
	},
}

/// Result of exporting one model within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
	/// Qualified model name.
	pub model: String,
	/// Load level of the model.
	pub level: u32,
	/// Loader name.
	pub fixture: FixtureName,
	/// Outcome.
	pub outcome: ExportOutcome,
}

/// Result of a snapshot run.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
	/// Exports in load order.
	pub exports: Vec<ExportReport>,
	/// Models left out before ordering.
	pub skipped: Vec<(String, SkipReason)>,
	/// Models that could not be ordered.
	pub unordered: Vec<String>,
	/// References looked up by generated loaders that no loader of the run
	/// registers.
	pub dangling: Vec<String>,
	/// References registered by a loader of the run, but only after a lookup
	/// of them runs at replay time.
	pub late: Vec<String>,
	/// Index module, when one was written.
	pub index: Option<PathBuf>,
}

impl SnapshotReport {
	/// Number of loaders written.
	pub fn generated(&self) -> usize {
		self.exports
			.iter()
			.filter(|e| matches!(e.outcome, ExportOutcome::Generated { .. }))
			.count()
	}

	/// Whether any model failed or conflicted.
	pub fn has_failures(&self) -> bool {
		self.exports.iter().any(|e| {
			matches!(
				e.outcome,
				ExportOutcome::Conflict { .. } | ExportOutcome::Failed { .. }
			)
		})
	}
}

/// Receives progress notifications from a snapshot run.
pub trait SnapshotReporter {
	/// A model was left out before ordering.
	fn model_skipped(&self, _model: &str, _reason: &SkipReason) {}

	/// A model could not be ordered.
	fn model_unordered(&self, _model: &str) {}

	/// A model was exported, skipped or failed.
	fn export_finished(&self, _report: &ExportReport) {}

	/// A reference is looked up but registered by no loader of the run.
	fn dangling_reference(&self, _reference: &str) {}

	/// A reference is looked up before the loader registering it runs.
	fn late_reference(&self, _reference: &str) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl SnapshotReporter for TracingReporter {
	fn model_skipped(&self, model: &str, reason: &SkipReason) {
		tracing::info!(model, %reason, "model skipped");
	}

	fn model_unordered(&self, model: &str) {
		tracing::warn!(model, "model could not be ordered");
	}

	fn export_finished(&self, report: &ExportReport) {
		match &report.outcome {
			ExportOutcome::Generated { path, records, .. } => tracing::info!(
				model = %report.model,
				level = report.level,
				records,
				path = %path.display(),
				"loader written"
			),
			ExportOutcome::SkippedEmpty => {
				tracing::info!(model = %report.model, "no records, loader skipped")
			}
			ExportOutcome::Conflict { path } => tracing::warn!(
				model = %report.model,
				path = %path.display(),
				"loader already exists"
			),
			ExportOutcome::Failed { message } => {
				tracing::warn!(model = %report.model, error = %message, "export failed")
			}
		}
	}

	fn dangling_reference(&self, reference: &str) {
		tracing::warn!(reference, "reference is not registered by any loader");
	}

	fn late_reference(&self, reference: &str) {
		tracing::warn!(reference, "reference is looked up before it is registered");
	}
}

/// A single-model export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
	/// Qualified model name.
	pub model: String,
	/// Identifiers to export; all records when empty.
	pub ids: Vec<PrimaryKey>,
	/// Custom loader name.
	pub name: Option<String>,
	/// Declared load order.
	pub order: u32,
}

impl ExportRequest {
	/// Exports every record of `model`.
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			ids: Vec::new(),
			name: None,
			order: 1,
		}
	}

	/// Restricts the export to `ids`.
	pub fn with_ids(mut self, ids: Vec<PrimaryKey>) -> Self {
		self.ids = ids;
		self
	}

	/// Sets a custom loader name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the declared load order.
	pub fn with_order(mut self, order: u32) -> Self {
		self.order = order;
		self
	}
}

/// Drives exports over a schema and a record source.
pub struct Snapshotter<'a, S: ?Sized, F: ?Sized> {
	schema: &'a S,
	fetcher: &'a F,
	writer: FixtureWriter,
	filter: ModelFilterConfig,
	options: SnapshotOptions,
}

impl<'a, S, F> Snapshotter<'a, S, F>
where
	S: SchemaSource + ?Sized,
	F: RecordFetcher + ?Sized,
{
	/// Creates a snapshotter with default filter and options.
	pub fn new(schema: &'a S, fetcher: &'a F, writer: FixtureWriter) -> Self {
		Self {
			schema,
			fetcher,
			writer,
			filter: ModelFilterConfig::default(),
			options: SnapshotOptions::default(),
		}
	}

	/// Sets the model filter.
	pub fn with_filter(mut self, filter: ModelFilterConfig) -> Self {
		self.filter = filter;
		self
	}

	/// Sets the export options.
	pub fn with_options(mut self, options: SnapshotOptions) -> Self {
		self.options = options;
		self
	}

	/// Exports every eligible model in load order.
	///
	/// Conflicts and generation errors are reported per model and do not
	/// stop the run.
	///
	/// # Errors
	///
	/// Fetch and write failures abort the run unchanged.
	pub fn run(&self, reporter: &dyn SnapshotReporter) -> SnapshotResult<SnapshotReport> {
		let candidates = collect_candidates(self.schema, &self.filter);
		for (model, reason) in &candidates.skipped {
			reporter.model_skipped(model, reason);
		}

		let resolution = LevelResolver::new(self.schema).resolve(&candidates.models);
		for model in &resolution.unordered {
			reporter.model_unordered(model);
		}
		tracing::info!(
			models = resolution.ordered.len(),
			levels = resolution.max_level(),
			"resolved load levels"
		);

		let mut registry = ReferenceRegistry::new();
		let mut exports = Vec::with_capacity(resolution.ordered.len());
		let mut claimed: HashMap<String, &str> = HashMap::new();
		for entity in &resolution.ordered {
			let model = self.lookup(&entity.model)?;
			let fixture =
				FixtureName::for_snapshot(&entity.model, self.options.name_prefix.as_deref());
			// Type and file names both have to stay unique within the index.
			let keys = [fixture.type_name().to_string(), fixture.file_name()];
			let outcome = match keys.iter().find_map(|key| claimed.get(key)) {
				Some(owner) => ExportOutcome::Failed {
					message: format!(
						"loader name `{}` is already used by `{}`",
						fixture.type_name(),
						owner
					),
				},
				None => {
					for key in keys {
						claimed.insert(key, entity.model.as_str());
					}
					self.export_level(model, &fixture, entity.level, &mut registry)?
				}
			};
			let report = ExportReport {
				model: entity.model.clone(),
				level: entity.level,
				fixture,
				outcome,
			};
			reporter.export_finished(&report);
			exports.push(report);
		}

		let index = if self.options.write_index {
			self.write_index(&exports)?
		} else {
			None
		};

		let dangling: Vec<String> = registry
			.dangling()
			.into_iter()
			.map(|r| r.as_str().to_string())
			.collect();
		for reference in &dangling {
			reporter.dangling_reference(reference);
		}
		let late: Vec<String> = registry
			.late()
			.into_iter()
			.map(|r| r.as_str().to_string())
			.collect();
		for reference in &late {
			reporter.late_reference(reference);
		}

		Ok(SnapshotReport {
			exports,
			skipped: candidates.skipped,
			unordered: resolution.unordered,
			dangling,
			late,
			index,
		})
	}

	/// Exports one model.
	///
	/// # Errors
	///
	/// Every failure aborts the export, including an existing loader when
	/// overwriting is disabled ([`SnapshotError::FixtureExists`]).
	pub fn export(&self, request: &ExportRequest) -> SnapshotResult<ExportOutcome> {
		let model = self.lookup(&request.model)?;
		let fixture = FixtureName::for_export(&request.model, &request.ids, request.name.as_deref())?;
		let path = self.writer.fixture_path(&fixture)?;
		if !self.options.overwrite && self.writer.exists(&path) {
			return Err(SnapshotError::FixtureExists {
				name: fixture.type_name().to_string(),
				path,
			});
		}

		let records = if request.ids.is_empty() {
			self.fetcher.fetch_all(model)?
		} else {
			self.fetcher.fetch_by_identifiers(model, &request.ids)?
		};
		if records.is_empty() && self.options.skip_empty {
			tracing::info!(model = %request.model, "no records, loader skipped");
			return Ok(ExportOutcome::SkippedEmpty);
		}

		let mut registry = ReferenceRegistry::new();
		let content = self
			.generator(model, fixture, request.order)
			.generate(&records, &mut registry)?;
		let status = self.writer.write(&path, &content)?;
		Ok(ExportOutcome::Generated {
			path,
			records: records.len(),
			status,
		})
	}

	fn export_level(
		&self,
		model: &'a ModelDescriptor,
		fixture: &FixtureName,
		level: u32,
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<ExportOutcome> {
		let path = self.writer.fixture_path(fixture)?;
		if !self.options.overwrite && self.writer.exists(&path) {
			return Ok(ExportOutcome::Conflict { path });
		}

		let records: Vec<Record> = self.fetcher.fetch_all(model)?;
		if records.is_empty() && self.options.skip_empty {
			return Ok(ExportOutcome::SkippedEmpty);
		}

		// Registrations of a failed batch must not hide dangling references.
		let mut scratch = registry.clone();
		let generated = self
			.generator(model, fixture.clone(), level)
			.generate(&records, &mut scratch);
		let content = match generated {
			Ok(content) => content,
			Err(e) => {
				return Ok(ExportOutcome::Failed {
					message: e.to_string(),
				});
			}
		};

		let status = self.writer.write(&path, &content)?;
		*registry = scratch;
		Ok(ExportOutcome::Generated {
			path,
			records: records.len(),
			status,
		})
	}

	fn write_index(&self, exports: &[ExportReport]) -> SnapshotResult<Option<PathBuf>> {
		let fixtures: Vec<FixtureName> = exports
			.iter()
			.filter(|e| {
				matches!(
					e.outcome,
					ExportOutcome::Generated { .. } | ExportOutcome::Conflict { .. }
				)
			})
			.map(|e| e.fixture.clone())
			.collect();
		if fixtures.is_empty() {
			return Ok(None);
		}

		let content = FixtureGenerator::new(self.schema)
			.with_runtime_crate(self.options.runtime_crate.as_str())
			.generate_index(&fixtures)?;
		let path = self.writer.index_path();
		self.writer.write(&path, &content)?;
		Ok(Some(path))
	}

	fn generator(
		&self,
		model: &'a ModelDescriptor,
		fixture: FixtureName,
		order: u32,
	) -> FixtureGenerator<'a, S> {
		FixtureGenerator::new(self.schema)
			.with_metadata(model)
			.with_fixture_name(fixture)
			.with_order(order)
			.with_runtime_crate(self.options.runtime_crate.as_str())
			.with_namer(ReferenceNamer::new(&self.options.reference_prefix))
	}

	fn lookup(&self, model: &str) -> SnapshotResult<&'a ModelDescriptor> {
		self.schema
			.model(model)
			.ok_or_else(|| SnapshotError::ModelNotFound(model.to_string()))
	}
}
