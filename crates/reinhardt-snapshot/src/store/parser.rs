//! Dump file parsing.

use std::path::Path;

use super::{DumpFormat, DumpRecord};
use crate::error::{SnapshotError, SnapshotResult};

/// Parser for dump files.
///
/// Supports both JSON and YAML formats (YAML requires the `yaml` feature).
/// Documents may hold a list of entries or a single entry.
#[derive(Debug, Default)]
pub struct DumpParser;

impl DumpParser {
	/// Creates a new dump parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a dump file, detecting the format from its extension.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file cannot be read
	/// - The file extension is not recognized
	/// - An entry is malformed
	pub fn parse_file(&self, path: &Path) -> SnapshotResult<Vec<DumpRecord>> {
		let format = DumpFormat::from_path(path).ok_or_else(|| {
			SnapshotError::UnsupportedExtension(
				path.extension()
					.and_then(|e| e.to_str())
					.unwrap_or("(none)")
					.to_string(),
			)
		})?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				SnapshotError::FileNotFound(path.display().to_string())
			} else {
				SnapshotError::IoError(e)
			}
		})?;

		tracing::debug!(path = %path.display(), %format, "parsing dump file");
		self.parse_string(&content, format)
	}

	/// Parses several dump files, concatenating their entries in order.
	pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> SnapshotResult<Vec<DumpRecord>> {
		let mut records = Vec::new();
		for path in paths {
			records.extend(self.parse_file(path.as_ref())?);
		}
		Ok(records)
	}

	/// Parses dump content in the given format.
	pub fn parse_string(&self, content: &str, format: DumpFormat) -> SnapshotResult<Vec<DumpRecord>> {
		let records = match format {
			DumpFormat::Json => self.parse_json(content)?,
			DumpFormat::Yaml => self.parse_yaml(content)?,
		};
		for record in &records {
			self.validate_record(record)?;
		}
		Ok(records)
	}

	fn parse_json(&self, content: &str) -> SnapshotResult<Vec<DumpRecord>> {
		let value: serde_json::Value = serde_json::from_str(content)?;

		match value {
			serde_json::Value::Array(items) => items
				.into_iter()
				.enumerate()
				.map(|(idx, item)| {
					serde_json::from_value(item).map_err(|e| {
						SnapshotError::ParseError(format!("Invalid entry at index {}: {}", idx, e))
					})
				})
				.collect(),
			serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
			_ => Err(SnapshotError::ParseError(
				"Expected array or object".to_string(),
			)),
		}
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> SnapshotResult<Vec<DumpRecord>> {
		let value: serde_yaml::Value = serde_yaml::from_str(content)?;

		match value {
			serde_yaml::Value::Sequence(items) => items
				.into_iter()
				.enumerate()
				.map(|(idx, item)| {
					serde_yaml::from_value(item).map_err(|e| {
						SnapshotError::ParseError(format!("Invalid entry at index {}: {}", idx, e))
					})
				})
				.collect(),
			serde_yaml::Value::Mapping(_) => Ok(vec![serde_yaml::from_value(value)?]),
			_ => Err(SnapshotError::ParseError(
				"Expected sequence or mapping".to_string(),
			)),
		}
	}

	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> SnapshotResult<Vec<DumpRecord>> {
		Err(SnapshotError::UnsupportedExtension(
			"YAML support requires the 'yaml' feature".to_string(),
		))
	}

	fn validate_record(&self, record: &DumpRecord) -> SnapshotResult<()> {
		crate::commands::validate_model_name(&record.model)?;

		if !record.fields.is_object() {
			return Err(SnapshotError::ValidationError {
				field: "fields".to_string(),
				message: format!("Fields of {} must be an object", record.model),
			});
		}

		Ok(())
	}
}
