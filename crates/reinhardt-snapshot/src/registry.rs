//! Per-run bookkeeping of symbolic references.

use indexmap::IndexMap;

use crate::naming::SymbolicReference;

/// Where generated code looks a reference up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSite {
	/// In the constructor arguments of the record with this emission counter.
	Constructor(usize),
	/// In a field assignment, after every record of the loader is registered.
	Assignment,
}

/// Position of one loader in the replay sequence.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
	loader: usize,
	order: u32,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
	slot: Slot,
	counter: usize,
}

#[derive(Debug, Clone, Copy)]
struct Lookup {
	slot: Slot,
	site: LookupSite,
}

impl Registration {
	/// Whether replay registers the reference before `lookup` runs.
	///
	/// Loaders replay by ascending order; loaders of equal order replay in
	/// the order they were generated.
	fn precedes(&self, lookup: &Lookup) -> bool {
		if self.slot.loader == lookup.slot.loader {
			return match lookup.site {
				LookupSite::Constructor(counter) => self.counter < counter,
				LookupSite::Assignment => true,
			};
		}
		self.slot.order < lookup.slot.order
			|| (self.slot.order == lookup.slot.order && self.slot.loader < lookup.slot.loader)
	}
}

/// References registered and looked up during one generation run.
///
/// Owned by the caller driving the run and passed to each generator call, so
/// state never leaks between runs. Each generator call opens a loader with
/// [`begin_loader`](Self::begin_loader); registrations and lookups are tied
/// to the loader that emits them, which lets the registry tell whether a
/// lookup can succeed at replay time.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
	loaders: usize,
	current: Slot,
	registered: IndexMap<SymbolicReference, Registration>,
	requested: IndexMap<SymbolicReference, Vec<Lookup>>,
}

impl ReferenceRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts the next loader, declared with load `order`.
	pub fn begin_loader(&mut self, order: u32) {
		self.loaders += 1;
		self.current = Slot {
			loader: self.loaders,
			order,
		};
	}

	/// Binds a reference to the emission counter of the loader statement that
	/// creates it. Returns the previous counter, if any.
	pub fn register(&mut self, reference: SymbolicReference, counter: usize) -> Option<usize> {
		let registration = Registration {
			slot: self.current,
			counter,
		};
		self.registered
			.insert(reference, registration)
			.map(|previous| previous.counter)
	}

	/// Notes that generated code looks the reference up at `site`.
	pub fn request(&mut self, reference: &SymbolicReference, site: LookupSite) {
		let lookup = Lookup {
			slot: self.current,
			site,
		};
		match self.requested.get_mut(reference) {
			Some(lookups) => lookups.push(lookup),
			None => {
				self.requested.insert(reference.clone(), vec![lookup]);
			}
		}
	}

	/// Counter bound to a registered reference.
	pub fn local(&self, reference: &SymbolicReference) -> Option<usize> {
		self.registered.get(reference).map(|r| r.counter)
	}

	/// Whether the reference has been registered.
	pub fn is_registered(&self, reference: &SymbolicReference) -> bool {
		self.registered.contains_key(reference)
	}

	/// Requested references that were never registered, in request order.
	pub fn dangling(&self) -> Vec<&SymbolicReference> {
		self.requested
			.keys()
			.filter(|r| !self.registered.contains_key(*r))
			.collect()
	}

	/// Requested references that are registered, but only after at least one
	/// of their lookups runs at replay time, in request order.
	///
	/// This covers constructor arguments naming a later record of the same
	/// loader and lookups of records created by a loader with a higher order.
	pub fn late(&self) -> Vec<&SymbolicReference> {
		self.requested
			.iter()
			.filter(|(reference, lookups)| {
				self.registered
					.get(*reference)
					.is_some_and(|registration| lookups.iter().any(|l| !registration.precedes(l)))
			})
			.map(|(reference, _)| reference)
			.collect()
	}

	/// Number of registered references.
	pub fn len(&self) -> usize {
		self.registered.len()
	}

	/// Returns `true` when nothing has been registered.
	pub fn is_empty(&self) -> bool {
		self.registered.is_empty()
	}
}
