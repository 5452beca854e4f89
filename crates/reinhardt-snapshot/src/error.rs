//! Error types for the snapshot module.
//!
//! This module defines the error types used throughout the reinhardt-snapshot crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while ordering, generating or writing fixtures.
#[derive(Debug, Error)]
pub enum SnapshotError {
	/// The generator was asked to emit code before any model was bound to it.
	#[error("No model metadata bound to the fixture generator")]
	MetadataNotBound,

	/// Model declares no identifier field.
	#[error("Model {0} has no identifier")]
	MissingIdentifier(String),

	/// Model declares more than one identifier field.
	#[error("Model {model} declares multiple identifiers ({}); composite identifiers are not supported", .fields.join(", "))]
	CompositeIdentifier {
		/// Qualified model name.
		model: String,
		/// Declared identifier fields.
		fields: Vec<String>,
	},

	/// Model was not found in the schema.
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	/// A fixture already exists at the target location and overwrite was not requested.
	#[error("Fixture \"{name}\" already exists at {}", .path.display())]
	FixtureExists {
		/// Fixture name.
		name: String,
		/// Existing file.
		path: PathBuf,
	},

	/// More than one identifier was requested without an explicit fixture name.
	#[error("A fixture exporting multiple identifiers requires an explicit name")]
	UnnamedFixture,

	/// Model name is not in `app.Model` form.
	#[error("Invalid model name: {0}")]
	InvalidModelName(String),

	/// Symbolic reference was looked up before it was registered.
	#[error("Reference not found: {0}")]
	ReferenceNotFound(String),

	/// Two records with the same key were committed.
	#[error("Duplicate record: {0}")]
	DuplicateRecord(String),

	/// Storage collaborator failed while fetching records.
	#[error("Fetch error: {0}")]
	FetchError(String),

	/// Generated tokens could not be assembled into a source file.
	#[error("Code generation error: {0}")]
	CodeGenError(String),

	/// Invalid dump or schema format detected.
	#[error("Invalid format: {0}")]
	InvalidFormat(String),

	/// Error parsing dump, schema or timestamp data.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// Validation failed for a specific field.
	#[error("Validation error: {field}: {message}")]
	ValidationError {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// Output path escapes the output directory.
	#[error("Invalid output path component: {0}")]
	PathTraversal(String),

	/// Input file not found.
	#[error("File not found: {0}")]
	FileNotFound(String),

	/// Unsupported file extension.
	#[error("Unsupported file extension: {0}")]
	UnsupportedExtension(String),

	/// Configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// YAML serialization/deserialization error (when yaml feature is enabled).
	#[cfg(feature = "yaml")]
	#[error("YAML error: {0}")]
	YamlError(#[from] serde_yaml::Error),
}

impl SnapshotError {
	/// Returns `true` for errors caused by how the generator or schema is set up
	/// rather than by the data being exported.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			Self::MetadataNotBound
				| Self::MissingIdentifier(_)
				| Self::CompositeIdentifier { .. }
				| Self::ModelNotFound(_)
				| Self::Config(_)
		)
	}
}

/// Result type alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
