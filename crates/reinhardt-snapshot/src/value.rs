//! Field values carried by snapshot records.
//!
//! Relations never own the related record: they hold a [`RecordKey`], which is
//! all the generator needs to derive a symbolic reference name.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};

/// Canonical timestamp layout used in generated loaders. Fractional seconds
/// are written only when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const ACCEPTED_TIMESTAMP_FORMATS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S",
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S",
	"%Y-%m-%dT%H:%M:%S%.f",
];

/// Identifier value of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
	/// Integer identifier.
	Integer(i64),
	/// Textual identifier (slugs, UUIDs, codes).
	Text(String),
}

impl PrimaryKey {
	/// Reads an identifier from a dump value. Only integers and strings qualify.
	pub fn from_json(value: &serde_json::Value) -> Option<Self> {
		match value {
			serde_json::Value::Number(n) => n.as_i64().map(Self::Integer),
			serde_json::Value::String(s) => Some(Self::Text(s.clone())),
			_ => None,
		}
	}
}

impl fmt::Display for PrimaryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Integer(n) => write!(f, "{}", n),
			Self::Text(s) => f.write_str(s),
		}
	}
}

impl From<i64> for PrimaryKey {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}

impl From<i32> for PrimaryKey {
	fn from(value: i32) -> Self {
		Self::Integer(i64::from(value))
	}
}

impl From<&str> for PrimaryKey {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for PrimaryKey {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// Identity of one record: its concrete model plus its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
	/// Qualified model name (`app.Model`).
	pub model: String,
	/// Identifier value.
	pub pk: PrimaryKey,
}

impl RecordKey {
	/// Creates a new key.
	pub fn new(model: impl Into<String>, pk: impl Into<PrimaryKey>) -> Self {
		Self {
			model: model.into(),
			pk: pk.into(),
		}
	}
}

impl fmt::Display for RecordKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.model, self.pk)
	}
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	/// Explicit null.
	#[default]
	Null,
	/// Boolean.
	Bool(bool),
	/// Integer.
	Integer(i64),
	/// Floating point number.
	Float(f64),
	/// Text.
	String(String),
	/// Timestamp without timezone.
	DateTime(NaiveDateTime),
	/// Structured value (arrays, maps) kept as JSON.
	Json(serde_json::Value),
	/// Single-valued relation.
	Reference(RecordKey),
	/// Collection-valued relation.
	Collection(Vec<RecordKey>),
}

impl Value {
	/// Parses a timestamp.
	///
	/// Accepts the canonical `YYYY-MM-DD HH:MM:SS` form, ISO 8601 with a `T`
	/// separator, RFC 3339 (converted to UTC) and bare dates (midnight).
	pub fn timestamp(input: &str) -> SnapshotResult<Self> {
		parse_timestamp(input).map(Self::DateTime)
	}

	/// Parses a serialized structured value.
	pub fn json(input: &str) -> SnapshotResult<Self> {
		Ok(Self::Json(serde_json::from_str(input)?))
	}

	/// Returns `true` for [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Integer(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<NaiveDateTime> for Value {
	fn from(value: NaiveDateTime) -> Self {
		Self::DateTime(value)
	}
}

impl From<RecordKey> for Value {
	fn from(value: RecordKey) -> Self {
		Self::Reference(value)
	}
}

impl From<Vec<RecordKey>> for Value {
	fn from(value: Vec<RecordKey>) -> Self {
		Self::Collection(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

pub(crate) fn parse_timestamp(input: &str) -> SnapshotResult<NaiveDateTime> {
	let trimmed = input.trim();
	for format in ACCEPTED_TIMESTAMP_FORMATS {
		if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
			return Ok(parsed);
		}
	}
	if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
		return Ok(parsed.naive_utc());
	}
	if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
		&& let Some(midnight) = date.and_hms_opt(0, 0, 0)
	{
		return Ok(midnight);
	}
	Err(SnapshotError::ParseError(format!(
		"Invalid timestamp: {}",
		input
	)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("2024-03-01 10:15:00", "2024-03-01 10:15:00")]
	#[case("2024-03-01T10:15:00", "2024-03-01 10:15:00")]
	#[case("2024-03-01T10:15:00.250", "2024-03-01 10:15:00.250")]
	#[case("2024-03-01T12:15:00+02:00", "2024-03-01 10:15:00")]
	#[case("2024-03-01", "2024-03-01 00:00:00")]
	fn test_timestamp_accepted_forms(#[case] input: &str, #[case] canonical: &str) {
		let Value::DateTime(parsed) = Value::timestamp(input).unwrap() else {
			panic!("expected a timestamp");
		};
		assert_eq!(parsed.format(TIMESTAMP_FORMAT).to_string(), canonical);
	}

	#[rstest]
	#[case("2024-03-01T10:15:00.250")]
	#[case("2024-03-01 23:59:59.000001")]
	#[case("1999-12-31 00:00:00")]
	fn test_canonical_timestamp_keeps_precision(#[case] input: &str) {
		let Value::DateTime(parsed) = Value::timestamp(input).unwrap() else {
			panic!("expected a timestamp");
		};

		let canonical = parsed.format(TIMESTAMP_FORMAT).to_string();

		assert_eq!(Value::timestamp(&canonical).unwrap(), Value::DateTime(parsed));
	}

	#[rstest]
	fn test_timestamp_rejects_garbage() {
		let result = Value::timestamp("next tuesday");
		assert!(matches!(result, Err(SnapshotError::ParseError(_))));
	}

	#[rstest]
	fn test_json_blob() {
		let value = Value::json(r#"{"tags":["a","b"]}"#).unwrap();
		assert_eq!(value, Value::Json(serde_json::json!({"tags": ["a", "b"]})));
	}

	#[rstest]
	#[case(serde_json::json!(7), Some(PrimaryKey::Integer(7)))]
	#[case(serde_json::json!("abc"), Some(PrimaryKey::Text("abc".to_string())))]
	#[case(serde_json::json!(1.5), None)]
	#[case(serde_json::json!(null), None)]
	fn test_primary_key_from_json(
		#[case] input: serde_json::Value,
		#[case] expected: Option<PrimaryKey>,
	) {
		assert_eq!(PrimaryKey::from_json(&input), expected);
	}

	#[rstest]
	fn test_option_into_value() {
		assert_eq!(Value::from(None::<i64>), Value::Null);
		assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
	}
}
