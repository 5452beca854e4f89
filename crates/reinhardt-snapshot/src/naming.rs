//! Symbolic reference names and fixture names.
//!
//! Reference names are how generated loaders point at records created by
//! other loaders. They are a pure function of the model name and identifier,
//! so every loader that mentions a record spells it the same way.

use std::fmt;

use crate::error::{SnapshotError, SnapshotResult};
use crate::value::PrimaryKey;

/// Default prefix of symbolic reference names.
pub const DEFAULT_REFERENCE_PREFIX: &str = "_reference_";

/// Replaces every character outside `[A-Za-z0-9_]` with `_`, one for one.
///
/// # Examples
///
/// ```
/// use reinhardt_snapshot::naming::sanitize;
///
/// assert_eq!(sanitize("blog.Book"), "blog_Book");
/// assert_eq!(sanitize("a--b"), "a__b");
/// ```
pub fn sanitize(input: &str) -> String {
	input
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
		.collect()
}

/// Name under which a record is registered while loaders replay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolicReference(String);

impl SymbolicReference {
	/// The name as text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SymbolicReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for SymbolicReference {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Derives symbolic reference names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNamer {
	prefix: String,
}

impl Default for ReferenceNamer {
	fn default() -> Self {
		Self::new(DEFAULT_REFERENCE_PREFIX)
	}
}

impl ReferenceNamer {
	/// Creates a namer. The prefix is sanitized like the other parts.
	pub fn new(prefix: &str) -> Self {
		Self {
			prefix: sanitize(prefix),
		}
	}

	/// Reference name of the record `model`/`pk`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_snapshot::naming::ReferenceNamer;
	/// use reinhardt_snapshot::PrimaryKey;
	///
	/// let namer = ReferenceNamer::default();
	/// let name = namer.name_for("blog.Book", &PrimaryKey::Integer(7));
	/// assert_eq!(name.as_str(), "_reference_blog_Book_7");
	/// ```
	pub fn name_for(&self, model: &str, pk: &PrimaryKey) -> SymbolicReference {
		SymbolicReference(format!(
			"{}{}_{}",
			self.prefix,
			sanitize(model),
			sanitize(&pk.to_string())
		))
	}
}

/// Name of a generated fixture: the loader type and its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureName {
	type_name: String,
	module_name: String,
}

impl FixtureName {
	fn from_type_name(type_name: String) -> Self {
		let module_name = to_snake_case(&type_name);
		Self {
			type_name,
			module_name,
		}
	}

	/// Name for a single-model export.
	///
	/// An explicit `name` wins. Otherwise the name is derived from the model
	/// and the first requested identifier.
	///
	/// # Errors
	///
	/// [`SnapshotError::UnnamedFixture`] when several identifiers are requested
	/// without an explicit name.
	pub fn for_export(model: &str, ids: &[PrimaryKey], name: Option<&str>) -> SnapshotResult<Self> {
		if let Some(name) = name.filter(|n| !to_pascal_case(n).is_empty()) {
			return Ok(Self::from_type_name(format!("Load{}", to_pascal_case(name))));
		}
		if ids.len() > 1 {
			return Err(SnapshotError::UnnamedFixture);
		}
		let suffix = ids
			.first()
			.map(|id| sanitize(&id.to_string()))
			.unwrap_or_default();
		Ok(Self::from_type_name(format!(
			"Load{}{}",
			to_pascal_case(model),
			suffix
		)))
	}

	/// Name for a model exported as part of a snapshot.
	pub fn for_snapshot(model: &str, prefix: Option<&str>) -> Self {
		Self::from_type_name(format!(
			"Load{}{}",
			prefix.map(to_pascal_case).unwrap_or_default(),
			to_pascal_case(model)
		))
	}

	/// Loader type name, for example `LoadBlogBook`.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Module name, for example `load_blog_book`.
	pub fn module_name(&self) -> &str {
		&self.module_name
	}

	/// File name, for example `load_blog_book.rs`.
	pub fn file_name(&self) -> String {
		format!("{}.rs", self.module_name)
	}
}

impl fmt::Display for FixtureName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.type_name)
	}
}

/// Joins alphanumeric runs, upper-casing the first letter of each.
pub(crate) fn to_pascal_case(input: &str) -> String {
	input
		.split(|c: char| !c.is_ascii_alphanumeric())
		.filter(|part| !part.is_empty())
		.map(|part| {
			let mut chars = part.chars();
			match chars.next() {
				Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect()
}

pub(crate) fn to_snake_case(input: &str) -> String {
	let chars: Vec<char> = input.chars().collect();
	let mut out = String::with_capacity(input.len() + 4);
	for (i, &c) in chars.iter().enumerate() {
		if c.is_ascii_uppercase() {
			let prev = i.checked_sub(1).map(|p| chars[p]);
			let next = chars.get(i + 1);
			let boundary = match prev {
				Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
				Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
				_ => false,
			};
			if boundary {
				out.push('_');
			}
			out.push(c.to_ascii_lowercase());
		} else {
			out.push(c);
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("blog.Book", PrimaryKey::Integer(7), "_reference_blog_Book_7")]
	#[case("blog.Book", PrimaryKey::Text("dune-1965".to_string()), "_reference_blog_Book_dune_1965")]
	#[case("crm.Contact", PrimaryKey::Text("a@b.c".to_string()), "_reference_crm_Contact_a_b_c")]
	fn test_name_for(#[case] model: &str, #[case] pk: PrimaryKey, #[case] expected: &str) {
		let namer = ReferenceNamer::default();

		assert_eq!(namer.name_for(model, &pk).as_str(), expected);
	}

	#[rstest]
	fn test_name_for_is_deterministic() {
		let first = ReferenceNamer::default().name_for("blog.Author", &PrimaryKey::Integer(1));
		let second = ReferenceNamer::default().name_for("blog.Author", &PrimaryKey::Integer(1));

		assert_eq!(first, second);
	}

	#[rstest]
	fn test_name_for_separates_model_and_identifier() {
		let namer = ReferenceNamer::default();

		let a = namer.name_for("app.Author1", &PrimaryKey::Integer(7));
		let b = namer.name_for("app.Author", &PrimaryKey::Integer(17));

		assert_ne!(a, b);
	}

	#[rstest]
	fn test_custom_prefix_is_sanitized() {
		let namer = ReferenceNamer::new("ref-");

		let name = namer.name_for("blog.Tag", &PrimaryKey::Integer(2));

		assert_eq!(name.as_str(), "ref_blog_Tag_2");
		assert!(name.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
	}

	#[rstest]
	#[case("blog.Book", &[], None, "LoadBlogBook", "load_blog_book")]
	#[case("blog.Book", &[PrimaryKey::Integer(12)], None, "LoadBlogBook12", "load_blog_book12")]
	#[case("blog.Book", &[PrimaryKey::Integer(1), PrimaryKey::Integer(2)], Some("classics"), "LoadClassics", "load_classics")]
	#[case("shop.HTTPEndpoint", &[], None, "LoadShopHTTPEndpoint", "load_shop_http_endpoint")]
	fn test_fixture_name_for_export(
		#[case] model: &str,
		#[case] ids: &[PrimaryKey],
		#[case] name: Option<&str>,
		#[case] type_name: &str,
		#[case] module_name: &str,
	) {
		let fixture = FixtureName::for_export(model, ids, name).unwrap();

		assert_eq!(fixture.type_name(), type_name);
		assert_eq!(fixture.module_name(), module_name);
		assert_eq!(fixture.file_name(), format!("{}.rs", module_name));
	}

	#[rstest]
	fn test_fixture_name_requires_name_for_multiple_ids() {
		let ids = [PrimaryKey::Integer(1), PrimaryKey::Integer(2)];

		let result = FixtureName::for_export("blog.Book", &ids, None);

		assert!(matches!(result, Err(SnapshotError::UnnamedFixture)));
	}

	#[rstest]
	#[case(None, "LoadBlogBook")]
	#[case(Some("seed"), "LoadSeedBlogBook")]
	fn test_fixture_name_for_snapshot(#[case] prefix: Option<&str>, #[case] expected: &str) {
		assert_eq!(FixtureName::for_snapshot("blog.Book", prefix).type_name(), expected);
	}
}
