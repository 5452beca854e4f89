//! Loader source generator.
//!
//! Turns a batch of records into a Rust module implementing
//! [`OrderedFixture`](crate::replay::OrderedFixture). Replaying that module
//! recreates the records with their original identifiers; relations are
//! expressed through symbolic references so loaders can point at records
//! created by other loaders. Every record of the batch is registered before
//! any field is assigned.
//!
//! ```ignore
//! use reinhardt_snapshot::replay::prelude::*;
//!
//! pub struct LoadBlogBook;
//!
//! impl OrderedFixture for LoadBlogBook {
//!     fn order(&self) -> u32 {
//!         2
//!     }
//!     fn load(
//!         &self,
//!         manager: &mut dyn ObjectManager,
//!         references: &mut ReferenceRepository,
//!     ) -> SnapshotResult<()> {
//!         manager.disable_id_generation("blog.Book");
//!         let mut item1 = Record::new("blog.Book", PrimaryKey::Integer(3));
//!         references.add_reference("_reference_blog_Book_3", &item1);
//!         let mut item2 = Record::new("blog.Book", PrimaryKey::Integer(4));
//!         references.add_reference("_reference_blog_Book_4", &item2);
//!         item1.set("title", Value::from("Dune"));
//!         item1.set("sequel", Value::Reference(references.get_reference("_reference_blog_Book_4")?));
//!         manager.persist(item1)?;
//!         item2.set("title", Value::from("Dune Messiah"));
//!         manager.persist(item2)?;
//!         manager.flush()
//!     }
//! }
//! ```

mod render;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use indexmap::IndexSet;
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::error::{SnapshotError, SnapshotResult};
use crate::naming::{FixtureName, ReferenceNamer};
use crate::record::Record;
use crate::registry::{LookupSite, ReferenceRegistry};
use crate::schema::{Cardinality, ModelDescriptor, SchemaSource};
use crate::value::{PrimaryKey, RecordKey, TIMESTAMP_FORMAT, Value};

const BANNER: &str = " Generated by `reinhardt-snapshot` - DO NOT EDIT";

/// Crate path generated loaders import the replay API from by default.
pub const DEFAULT_RUNTIME_CRATE: &str = "reinhardt_snapshot";

/// Generates loader modules for one model.
pub struct FixtureGenerator<'s, S: ?Sized> {
	schema: &'s S,
	metadata: Option<&'s ModelDescriptor>,
	fixture_name: Option<FixtureName>,
	order: u32,
	runtime_crate: String,
	namer: ReferenceNamer,
}

impl<'s, S> FixtureGenerator<'s, S>
where
	S: SchemaSource + ?Sized,
{
	/// Creates a generator reading related-model metadata from `schema`.
	pub fn new(schema: &'s S) -> Self {
		Self {
			schema,
			metadata: None,
			fixture_name: None,
			order: 1,
			runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
			namer: ReferenceNamer::default(),
		}
	}

	/// Binds the model whose records are exported.
	pub fn with_metadata(mut self, model: &'s ModelDescriptor) -> Self {
		self.metadata = Some(model);
		self
	}

	/// Sets the loader name. Defaults to the snapshot name of the model.
	pub fn with_fixture_name(mut self, name: FixtureName) -> Self {
		self.fixture_name = Some(name);
		self
	}

	/// Sets the declared load order.
	pub fn with_order(mut self, order: u32) -> Self {
		self.order = order;
		self
	}

	/// Sets the crate path of the replay API.
	pub fn with_runtime_crate(mut self, path: impl Into<String>) -> Self {
		self.runtime_crate = path.into();
		self
	}

	/// Sets the reference namer.
	pub fn with_namer(mut self, namer: ReferenceNamer) -> Self {
		self.namer = namer;
		self
	}

	/// Generates the loader source for `records`.
	///
	/// The loader first constructs every record and registers it under its
	/// symbolic reference, then assigns fields and persists the records. Field
	/// lookups therefore resolve for any record of the batch, including self
	/// references and records later in fetch order. Constructor arguments are
	/// evaluated during the first phase and only see records registered
	/// before them.
	///
	/// References to records not registered yet are allowed and noted in the
	/// registry, together with where they are looked up.
	///
	/// # Errors
	///
	/// - [`SnapshotError::MetadataNotBound`] when no model was bound
	/// - [`SnapshotError::MissingIdentifier`] / [`SnapshotError::CompositeIdentifier`]
	///   when a record's model does not declare exactly one identifier
	pub fn generate(
		&self,
		records: &[Record],
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<String> {
		let model = self.metadata.ok_or(SnapshotError::MetadataNotBound)?;
		model.identifier()?;
		let fixture_name = self
			.fixture_name
			.clone()
			.unwrap_or_else(|| FixtureName::for_snapshot(&model.model, None));
		registry.begin_loader(self.order);

		let directives: IndexSet<&str> = records.iter().map(Record::model).collect();
		let mut blanks = BlankCache::default();
		let mut declarations = Vec::with_capacity(records.len());
		let mut assignments = Vec::with_capacity(records.len());
		for (index, record) in records.iter().enumerate() {
			let descriptor = self.descriptor_for(model, record.model())?;
			let counter = index + 1;
			let fields = assigned_fields(descriptor, record, &mut blanks)?;
			declarations.push(self.declare_record(
				descriptor,
				record,
				counter,
				!fields.is_empty(),
				registry,
			)?);
			assignments.push((counter, fields));
		}

		let mut completions = Vec::with_capacity(records.len());
		for (counter, fields) in assignments {
			completions.push(self.complete_record(counter, &fields, registry)?);
		}
		let blocks = declarations.into_iter().chain(completions);

		let runtime = self.runtime_path()?;
		let fixture_ident = format_ident!("{}", fixture_name.type_name());
		let order = Literal::u32_unsuffixed(self.order);
		let references = if records.is_empty() {
			format_ident!("_references")
		} else {
			format_ident!("references")
		};
		let source = format!(" Snapshot of `{}`: {} record(s).", model.model, records.len());
		let struct_doc = format!(" Loads the `{}` snapshot.", model.model);
		let directives = directives.into_iter();

		let tokens = quote! {
			#![doc = #BANNER]
			#![doc = #source]

			use #runtime::replay::prelude::*;

			#[doc = #struct_doc]
			pub struct #fixture_ident;

			impl OrderedFixture for #fixture_ident {
				fn order(&self) -> u32 {
					#order
				}

				fn load(
					&self,
					manager: &mut dyn ObjectManager,
					#references: &mut ReferenceRepository,
				) -> SnapshotResult<()> {
					#(manager.disable_id_generation(#directives);)*
					#(#blocks)*
					manager.flush()
				}
			}
		};

		let content = format_tokens(tokens)?;
		tracing::debug!(
			model = %model.model,
			fixture = %fixture_name,
			records = records.len(),
			"generated loader"
		);
		Ok(content)
	}

	/// Generates a `mod.rs` declaring `fixtures` and listing them in order.
	pub fn generate_index(&self, fixtures: &[FixtureName]) -> SnapshotResult<String> {
		let runtime = self.runtime_path()?;
		let modules: Vec<_> = fixtures
			.iter()
			.map(|f| format_ident!("{}", f.module_name()))
			.collect();
		let types: Vec<_> = fixtures
			.iter()
			.map(|f| format_ident!("{}", f.type_name()))
			.collect();
		let count = Literal::usize_unsuffixed(types.len());

		let body = if types.is_empty() {
			quote!(Vec::new())
		} else {
			quote! {
				let mut fixtures: Vec<Box<dyn OrderedFixture>> = Vec::with_capacity(#count);
				#(fixtures.push(Box::new(#types));)*
				fixtures
			}
		};

		let tokens = quote! {
			#![doc = #BANNER]

			use #runtime::replay::prelude::*;

			#(pub mod #modules;)*

			#(pub use #modules::#types;)*

			/// Every snapshot loader, in load order.
			pub fn fixtures() -> Vec<Box<dyn OrderedFixture>> {
				#body
			}
		};

		format_tokens(tokens)
	}

	fn descriptor_for(
		&self,
		bound: &'s ModelDescriptor,
		model: &str,
	) -> SnapshotResult<&'s ModelDescriptor> {
		if bound.model == model {
			return Ok(bound);
		}
		self.schema
			.model(model)
			.ok_or_else(|| SnapshotError::ModelNotFound(model.to_string()))
	}

	fn runtime_path(&self) -> SnapshotResult<syn::Path> {
		syn::parse_str(&self.runtime_crate).map_err(|e| {
			SnapshotError::CodeGenError(format!(
				"Invalid runtime crate path `{}`: {}",
				self.runtime_crate, e
			))
		})
	}

	/// Construction and registration of one record.
	fn declare_record(
		&self,
		model: &ModelDescriptor,
		record: &Record,
		counter: usize,
		mutable: bool,
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<TokenStream> {
		let var = format_ident!("item{}", counter);
		let reference = self.namer.name_for(record.model(), record.pk());
		registry.register(reference.clone(), counter);

		let model_name = record.model();
		let pk = render::primary_key(record.pk());
		let args = constructor_args(model, record);
		let construct = if args.is_empty() {
			quote!(Record::new(#model_name, #pk))
		} else {
			let site = LookupSite::Constructor(counter);
			let names = args.iter().map(|(name, _)| name.as_str());
			let values = args
				.iter()
				.map(|(_, value)| self.render_value(value, site, registry))
				.collect::<SnapshotResult<Vec<_>>>()?;
			quote!(Record::construct(#model_name, #pk, [#((#names, #values)),*]))
		};
		let binding = if mutable {
			quote!(let mut #var)
		} else {
			quote!(let #var)
		};
		let reference_name = reference.as_str();

		Ok(quote! {
			#binding = #construct;
			references.add_reference(#reference_name, &#var);
		})
	}

	/// Field assignments and persistence of one record.
	fn complete_record(
		&self,
		counter: usize,
		fields: &[(&str, &Value)],
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<TokenStream> {
		let var = format_ident!("item{}", counter);
		let mut setters = Vec::with_capacity(fields.len());
		for (name, value) in fields {
			let rendered = self.render_value(value, LookupSite::Assignment, registry)?;
			setters.push(quote!(#var.set(#name, #rendered);));
		}

		Ok(quote! {
			#(#setters)*
			manager.persist(#var)?;
		})
	}

	fn render_value(
		&self,
		value: &Value,
		site: LookupSite,
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<TokenStream> {
		let tokens = match value {
			Value::Null => quote!(Value::Null),
			Value::Bool(b) => quote!(Value::Bool(#b)),
			Value::Integer(n) => {
				let lit = render::integer(*n);
				quote!(Value::Integer(#lit))
			}
			Value::Float(x) if x.is_finite() => {
				let lit = render::float(*x);
				quote!(Value::Float(#lit))
			}
			Value::Float(x) => {
				let text = x.to_string();
				quote!(Value::from(#text))
			}
			Value::String(s) => quote!(Value::from(#s)),
			Value::DateTime(dt) => {
				let text = dt.format(TIMESTAMP_FORMAT).to_string();
				quote!(Value::timestamp(#text)?)
			}
			Value::Json(json) => {
				let blob = serde_json::to_string(json)?;
				quote!(Value::json(#blob)?)
			}
			Value::Reference(key) => {
				let lookup = self.lookup(key, site, registry)?;
				quote!(Value::Reference(#lookup))
			}
			Value::Collection(keys) => {
				let lookups = keys
					.iter()
					.map(|key| self.lookup(key, site, registry))
					.collect::<SnapshotResult<Vec<_>>>()?;
				quote!(Value::Collection(Vec::from([#(#lookups),*])))
			}
		};
		Ok(tokens)
	}

	fn lookup(
		&self,
		key: &RecordKey,
		site: LookupSite,
		registry: &mut ReferenceRegistry,
	) -> SnapshotResult<TokenStream> {
		self.schema
			.model(&key.model)
			.ok_or_else(|| SnapshotError::ModelNotFound(key.model.clone()))?
			.identifier()?;
		let reference = self.namer.name_for(&key.model, &key.pk);
		registry.request(&reference, site);
		let name = reference.as_str();
		Ok(quote!(references.get_reference(#name)?))
	}
}

/// Values of the required constructor parameters, read from the record.
fn constructor_args(model: &ModelDescriptor, record: &Record) -> Vec<(String, Value)> {
	model
		.required_constructor_params()
		.map(|p| {
			let value = record.get(p.source_field()).cloned().unwrap_or_default();
			(p.name.clone(), value)
		})
		.collect()
}

/// Fields the loader assigns after construction, in declaration order.
///
/// Skips the identifier, read-only and ignored fields, absent values, values
/// equal to the blank baseline and inverse or empty collections.
fn assigned_fields<'r>(
	model: &'r ModelDescriptor,
	record: &'r Record,
	blanks: &mut BlankCache,
) -> SnapshotResult<Vec<(&'r str, &'r Value)>> {
	let identifier = model.identifier()?;
	let blank = blanks.get_or_create(model, &constructor_args(model, record))?;

	let mut fields = Vec::new();
	for field in &model.fields {
		if field.name == identifier || !field.settable || field.ignore_in_snapshot {
			continue;
		}
		let Some(value) = record.get(&field.name) else {
			continue;
		};
		if blank.get(&field.name) != Some(value) {
			fields.push((field.name.as_str(), value));
		}
	}
	for relation in &model.relations {
		if relation.ignore_in_snapshot {
			continue;
		}
		let Some(value) = record.get(&relation.name) else {
			continue;
		};
		if blank.get(&relation.name) == Some(value) {
			continue;
		}
		if relation.cardinality == Cardinality::Collection
			&& (!relation.owning || matches!(value, Value::Collection(keys) if keys.is_empty()))
		{
			continue;
		}
		fields.push((relation.name.as_str(), value));
	}
	Ok(fields)
}

/// Blank records keyed by model and constructor arguments.
#[derive(Default)]
struct BlankCache {
	blanks: HashMap<String, Record>,
}

impl BlankCache {
	fn get_or_create(
		&mut self,
		model: &ModelDescriptor,
		args: &[(String, Value)],
	) -> SnapshotResult<&Record> {
		let key = format!("{}{:?}", model.model, args);
		match self.blanks.entry(key) {
			Entry::Occupied(entry) => Ok(entry.into_mut()),
			Entry::Vacant(entry) => Ok(entry.insert(blank_instance(model, args)?)),
		}
	}
}

/// A freshly constructed record: defaults everywhere, then the constructor
/// arguments.
fn blank_instance(model: &ModelDescriptor, args: &[(String, Value)]) -> SnapshotResult<Record> {
	let mut blank = Record::new(model.model.clone(), PrimaryKey::Integer(0));
	for field in &model.fields {
		blank.set(field.name.clone(), field.default_value()?);
	}
	for relation in &model.relations {
		let empty = match relation.cardinality {
			Cardinality::Single => Value::Null,
			Cardinality::Collection => Value::Collection(Vec::new()),
		};
		blank.set(relation.name.clone(), empty);
	}
	for (name, value) in args {
		blank.set(name.clone(), value.clone());
	}
	Ok(blank)
}

fn format_tokens(tokens: TokenStream) -> SnapshotResult<String> {
	let syntax_tree = syn::parse2::<syn::File>(tokens).map_err(|e| {
		SnapshotError::CodeGenError(format!("Failed to parse generated code: {}", e))
	})?;

	Ok(prettyplease::unparse(&syntax_tree))
}
