//! Command implementations behind the `reinhardt-snapshot` binary.

mod generate;
mod ids;
mod levels;

pub use generate::{CommandOutcome, GenerateFixtureArgs, GenerateFixtureCommand, GenerateFixtureOptions};
pub use ids::parse_ids;
pub use levels::{LevelsCommand, LevelsReport};

use crate::error::{SnapshotError, SnapshotResult};

/// Checks that `model` is a qualified `app.Model` name.
///
/// # Errors
///
/// [`SnapshotError::InvalidModelName`] otherwise.
pub fn validate_model_name(model: &str) -> SnapshotResult<()> {
	let mut parts = model.split('.');
	let valid = match (parts.next(), parts.next(), parts.next()) {
		(Some(app), Some(name), None) => is_identifier(app) && is_identifier(name),
		_ => false,
	};
	if valid {
		Ok(())
	} else {
		Err(SnapshotError::InvalidModelName(format!(
			"{} (expected `app.Model`)",
			model
		)))
	}
}

fn is_identifier(part: &str) -> bool {
	let mut chars = part.chars();
	chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
