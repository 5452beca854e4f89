//! Configuration for snapshot generation.
//!
//! Supports TOML configuration files and CLI argument overrides.
//!
//! ```toml
//! [schema]
//! path = "snapshot/schema.toml"
//!
//! [stores.default]
//! paths = ["snapshot/dump.json"]
//!
//! [output]
//! directory = "src/fixtures"
//!
//! [generation]
//! name_prefix = "seed"
//!
//! [models]
//! exclude = ["^auth\\."]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::naming::DEFAULT_REFERENCE_PREFIX;

/// Store alias used when none is selected.
pub const DEFAULT_CONNECTION: &str = "default";

/// Main configuration for snapshot generation.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
	/// Schema descriptor location
	pub schema: SchemaConfig,

	/// Record stores keyed by connection alias
	pub stores: HashMap<String, StoreConfig>,

	/// Output configuration
	pub output: OutputConfig,

	/// Code generation configuration
	pub generation: GenerationConfig,

	/// Model filtering configuration
	pub models: ModelFilterConfig,
}

impl SnapshotConfig {
	/// Sets the schema file.
	pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.schema.path = path.into();
		self
	}

	/// Sets the dump files of a connection alias.
	pub fn with_store(mut self, alias: &str, paths: Vec<PathBuf>) -> Self {
		self.stores.insert(alias.to_string(), StoreConfig { paths });
		self
	}

	/// Sets the output directory.
	pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.output.directory = dir.into();
		self
	}

	/// Load configuration from a TOML file.
	///
	/// Relative schema, store and output paths are resolved against the
	/// directory holding the file.
	///
	/// # Errors
	///
	/// Returns error if file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
			path: path.to_path_buf(),
			source: e,
		})?;

		let mut config = Self::from_toml(&content)?;
		if let Some(base) = path.parent() {
			config.rebase(base);
		}
		Ok(config)
	}

	/// Parse configuration from TOML string.
	pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
			message: e.to_string(),
		})?;
		config.models.validate()?;
		Ok(config)
	}

	/// Dump files backing a connection alias.
	///
	/// # Errors
	///
	/// [`ConfigError::UnknownConnection`] when the alias is not configured.
	pub fn store_paths(&self, alias: Option<&str>) -> Result<&[PathBuf], ConfigError> {
		let alias = alias.unwrap_or(DEFAULT_CONNECTION);
		self.stores
			.get(alias)
			.map(|store| store.paths.as_slice())
			.ok_or_else(|| ConfigError::UnknownConnection {
				name: alias.to_string(),
			})
	}

	/// Merge CLI arguments into configuration.
	///
	/// CLI arguments take precedence over config file values.
	///
	/// # Errors
	///
	/// [`ConfigError::InvalidPattern`] when the merged model filter holds an
	/// invalid pattern.
	pub fn merge_cli_args(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
		if let Some(ref dir) = args.output_dir {
			self.output.directory = dir.clone();
		}

		if let Some(ref path) = args.schema_path {
			self.schema.path = path.clone();
		}

		if let Some(ref prefix) = args.name_prefix {
			self.generation.name_prefix = Some(prefix.clone());
		}

		if let Some(skip_empty) = args.skip_empty {
			self.generation.skip_empty = skip_empty;
		}

		if let Some(ref pattern) = args.exclude_models {
			self.models.exclude.push(pattern.clone());
		}

		self.models.validate()
	}

	fn rebase(&mut self, base: &Path) {
		let resolve = |p: &mut PathBuf| {
			if p.is_relative() {
				*p = base.join(&*p);
			}
		};
		resolve(&mut self.schema.path);
		resolve(&mut self.output.directory);
		for store in self.stores.values_mut() {
			store.paths.iter_mut().for_each(resolve);
		}
	}
}

/// Schema descriptor location.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
	/// Schema file (`.toml`, `.json`, `.yaml`)
	pub path: PathBuf,
}

impl Default for SchemaConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from("snapshot/schema.toml"),
		}
	}
}

/// One record store.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	/// Dump files, loaded in order
	pub paths: Vec<PathBuf>,
}

/// Output configuration.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
	/// Directory receiving generated loaders
	pub directory: PathBuf,

	/// Copy an existing loader to `*.rs.bak` before replacing it
	pub backup_existing: bool,

	/// Write a `mod.rs` listing the loaders of a snapshot
	pub write_index: bool,
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self {
			directory: PathBuf::from("src/fixtures"),
			backup_existing: true,
			write_index: true,
		}
	}
}

/// Code generation configuration.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
	/// Crate path the generated loaders import the replay API from
	pub runtime_crate: String,

	/// Prefix of symbolic reference names
	pub reference_prefix: String,

	/// Do not write loaders for models without records
	pub skip_empty: bool,

	/// Prefix of snapshot loader names
	pub name_prefix: Option<String>,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self {
			runtime_crate: "reinhardt_snapshot".to_string(),
			reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
			skip_empty: true,
			name_prefix: None,
		}
	}
}

/// Model filtering configuration.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFilterConfig {
	/// Include models matching these patterns (regex)
	pub include: Vec<String>,

	/// Exclude models matching these patterns (regex)
	pub exclude: Vec<String>,

	/// Storage areas whose models are never exported
	pub excluded_areas: Vec<String>,
}

impl Default for ModelFilterConfig {
	fn default() -> Self {
		Self {
			include: vec![".*".to_string()],
			exclude: Vec::new(),
			excluded_areas: vec!["vendor".to_string()],
		}
	}
}

impl ModelFilterConfig {
	/// Check if a model should be included based on the patterns.
	pub fn should_include_model(&self, model: &str) -> bool {
		// Check exclude patterns first
		for pattern in &self.exclude {
			if let Ok(re) = Regex::new(pattern)
				&& re.is_match(model)
			{
				return false;
			}
		}

		if self.include.is_empty() {
			return true;
		}

		for pattern in &self.include {
			if let Ok(re) = Regex::new(pattern)
				&& re.is_match(model)
			{
				return true;
			}
		}

		false
	}

	/// Check if a storage area is excluded.
	pub fn is_excluded_area(&self, area: Option<&str>) -> bool {
		area.is_some_and(|a| self.excluded_areas.iter().any(|excluded| excluded == a))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		for pattern in self.include.iter().chain(&self.exclude) {
			if Regex::new(pattern).is_err() {
				return Err(ConfigError::InvalidPattern {
					pattern: pattern.clone(),
				});
			}
		}
		Ok(())
	}
}

/// CLI arguments that can override config file values.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
	/// Output directory override
	pub output_dir: Option<PathBuf>,
	/// Schema file override
	pub schema_path: Option<PathBuf>,
	/// Snapshot name prefix override
	pub name_prefix: Option<String>,
	/// Empty-model skipping override
	pub skip_empty: Option<bool>,
	/// Additional exclude pattern
	pub exclude_models: Option<String>,
}

impl CliArgs {
	/// Creates empty overrides.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the output directory.
	pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
		self.output_dir = dir;
		self
	}

	/// Overrides the snapshot name prefix.
	pub fn with_name_prefix(mut self, prefix: Option<String>) -> Self {
		self.name_prefix = prefix;
		self
	}

	/// Overrides empty-model skipping.
	pub fn with_skip_empty(mut self, skip_empty: Option<bool>) -> Self {
		self.skip_empty = skip_empty;
		self
	}

	/// Adds an exclude pattern.
	pub fn with_exclude_models(mut self, pattern: Option<String>) -> Self {
		self.exclude_models = pattern;
		self
	}
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("IO error reading {path}: {source}")]
	IoError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse configuration: {message}")]
	ParseError { message: String },

	#[error("Unknown connection: {name}")]
	UnknownConnection { name: String },

	#[error("Invalid regex pattern: {pattern}")]
	InvalidPattern { pattern: String },
}
