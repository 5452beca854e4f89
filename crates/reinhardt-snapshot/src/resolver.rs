//! Dependency levels of exportable models.
//!
//! A model can be loaded once every model it points at has been loaded. The
//! resolver assigns levels pass by pass: models whose dependencies are all
//! satisfied by earlier passes receive the current level, in scan order.
//!
//! ```text
//! blog.Author            level 1
//! blog.Book   -> Author  level 2
//! blog.Review -> Book    level 3
//! ```
//!
//! Models caught in a dependency cycle are reported as unordered and left out.

use std::collections::HashSet;
use std::fmt;

use crate::config::ModelFilterConfig;
use crate::schema::{ModelDescriptor, SchemaSource};

/// A model together with its assigned level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedEntity {
	/// Qualified model name.
	pub model: String,
	/// Load level, starting at 1.
	pub level: u32,
}

/// Outcome of level resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelResolution {
	/// Models with a level, in ascending level then scan order.
	pub ordered: Vec<OrderedEntity>,
	/// Models whose dependencies could never be satisfied, in scan order.
	pub unordered: Vec<String>,
}

impl LevelResolution {
	/// Level assigned to a model.
	pub fn level_of(&self, model: &str) -> Option<u32> {
		self.ordered
			.iter()
			.find(|e| e.model == model)
			.map(|e| e.level)
	}

	/// Highest assigned level, 0 when nothing was ordered.
	pub fn max_level(&self) -> u32 {
		self.ordered.iter().map(|e| e.level).max().unwrap_or(0)
	}
}

/// Why a model was not considered for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
	/// Abstract models have no records of their own.
	Abstract,
	/// Declared in an excluded storage area.
	ExcludedArea(String),
	/// Rejected by the include/exclude patterns.
	Filtered,
	/// Carries the model-level snapshot opt-out.
	Ignored,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Abstract => f.write_str("abstract model"),
			Self::ExcludedArea(area) => write!(f, "declared in excluded area `{}`", area),
			Self::Filtered => f.write_str("excluded by model patterns"),
			Self::Ignored => f.write_str("marked as ignored in snapshots"),
		}
	}
}

/// Models eligible for export plus the ones that were skipped.
#[derive(Debug, Clone)]
pub struct CandidateSet<'a> {
	/// Eligible models in schema order.
	pub models: Vec<&'a ModelDescriptor>,
	/// Skipped models with the reason.
	pub skipped: Vec<(String, SkipReason)>,
}

/// Splits the schema into exportable models and skipped ones.
pub fn collect_candidates<'a, S>(schema: &'a S, filter: &ModelFilterConfig) -> CandidateSet<'a>
where
	S: SchemaSource + ?Sized,
{
	let mut models = Vec::new();
	let mut skipped = Vec::new();
	for model in schema.models() {
		let reason = if model.is_abstract {
			Some(SkipReason::Abstract)
		} else if filter.is_excluded_area(model.storage_area.as_deref()) {
			Some(SkipReason::ExcludedArea(
				model.storage_area.clone().unwrap_or_default(),
			))
		} else if !filter.should_include_model(&model.model) {
			Some(SkipReason::Filtered)
		} else if model.snapshot_ignore {
			Some(SkipReason::Ignored)
		} else {
			None
		};
		match reason {
			Some(reason) => skipped.push((model.model.clone(), reason)),
			None => models.push(model),
		}
	}
	CandidateSet { models, skipped }
}

/// Assigns dependency levels.
pub struct LevelResolver<'s, S: ?Sized> {
	schema: &'s S,
}

impl<'s, S> LevelResolver<'s, S>
where
	S: SchemaSource + ?Sized,
{
	/// Creates a resolver reading discriminator metadata from `schema`.
	pub fn new(schema: &'s S) -> Self {
		Self { schema }
	}

	/// Assigns levels to `candidates`.
	///
	/// Each pass only sees assignments from earlier passes, so models that
	/// become satisfiable in the same pass share a level. Resolution stops
	/// when every candidate has a level, when a pass assigns nothing, or after
	/// as many passes as there are candidates.
	pub fn resolve(&self, candidates: &[&ModelDescriptor]) -> LevelResolution {
		let mut remaining: Vec<&ModelDescriptor> = candidates.to_vec();
		let mut assigned: HashSet<&str> = HashSet::new();
		let mut ordered = Vec::with_capacity(candidates.len());
		let limit = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
		let mut level = 1u32;

		while !remaining.is_empty() && level <= limit {
			let (ready, blocked): (Vec<_>, Vec<_>) = remaining
				.into_iter()
				.partition(|model| self.is_level_reached(model, &assigned));
			remaining = blocked;

			if ready.is_empty() {
				break;
			}
			for model in ready {
				tracing::debug!(model = %model.model, level, "assigned load level");
				assigned.insert(model.model.as_str());
				ordered.push(OrderedEntity {
					model: model.model.clone(),
					level,
				});
			}
			level += 1;
		}

		let unordered: Vec<String> = remaining.iter().map(|m| m.model.clone()).collect();
		for model in &unordered {
			tracing::warn!(model = %model, "no load level could be assigned; model is left out");
		}

		LevelResolution { ordered, unordered }
	}

	fn is_level_reached(&self, model: &ModelDescriptor, assigned: &HashSet<&str>) -> bool {
		model.dependencies().all(|target| {
			assigned.contains(target) || self.discriminator_satisfied(target, assigned)
		})
	}

	/// An abstract target is satisfied once all of its concrete members are.
	fn discriminator_satisfied(&self, target: &str, assigned: &HashSet<&str>) -> bool {
		if !self.schema.is_abstract(target) {
			return false;
		}
		self.schema
			.discriminator_members(target)
			.is_some_and(|members| members.iter().all(|m| assigned.contains(m)))
	}
}
