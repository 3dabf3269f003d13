//! # triplemap: Object ↔ RDF Statement Mapping
//!
//! Binds typed Rust object graphs to subject–predicate–object statements:
//! read a subject out of a statement model into an instance, write an
//! instance back as statements.
//!
//! ## Design Principles
//!
//! 1. **Declare once, analyze once**: an [`Entity`](meta::Entity) describes its
//!    mapping in `define`; the [`Analyzer`](analyzer::Analyzer) turns that into a
//!    cached [`TypeDescriptor`](analyzer::TypeDescriptor)
//! 2. **Strategies, not special cases**: construction, property discovery,
//!    element types, multiplicity, scalar conversion and unwrapping are all
//!    looked up in a [`Registry`](spi::Registry)
//! 3. **Clean DTOs**: [`Model`], [`Statement`], [`Term`] know nothing about
//!    mapped types
//! 4. **Setup, then operate**: the registry is frozen by moving it into the
//!    analyzer; reads and writes share descriptors freely across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use triplemap::meta::{Entity, EntityDef, Predicate};
//! use triplemap::model::vocab::xsd;
//! use triplemap::Mapper;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! triplemap::reflect_entity!(Point);
//!
//! impl Entity for Point {
//!     fn define(def: &mut EntityDef<Self>) {
//!         def.default_constructible();
//!         def.field("x", |p: &Point| &p.x)
//!             .set(|p, v| p.x = v)
//!             .predicate(Predicate::new("http://example.com/x").datatype(xsd::INT));
//!         def.field("y", |p: &Point| &p.y)
//!             .set(|p, v| p.y = v)
//!             .predicate(Predicate::new("http://example.com/y").datatype(xsd::INT));
//!     }
//! }
//!
//! # fn main() -> triplemap::Result<()> {
//! let mapper = Mapper::new();
//! let model = mapper.write(&Point { x: 3, y: 4 }, "http://example.com/p1")?;
//! assert_eq!(model.len(), 2);
//!
//! let back: Option<Point> = mapper.read(&model, "http://example.com/p1")?;
//! assert_eq!(back, Some(Point { x: 3, y: 4 }));
//! # Ok(())
//! # }
//! ```
//!
//! ## Formats
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | N-Triples | yes (default) | yes |
//! | Turtle | no | yes (default) |
//! | JSON | yes | yes |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod meta;
pub mod spi;
pub mod support;
pub mod analyzer;
pub mod reader;
pub mod writer;
pub mod format;
pub mod config;

use std::io::{Read, Write};
use std::sync::Arc;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{BlankNode, Iri, Literal, Model, Resource, Statement, Term};

// ============================================================================
// Re-exports: Mapping
// ============================================================================

pub use analyzer::{Analyzer, PropertyDescriptor, TypeDescriptor};
pub use config::MapperConfig;
pub use format::RdfFormat;
pub use meta::{Entity, EntityDef, Predicate, Reflect, SemanticType, Subject};
pub use reader::Reader;
pub use spi::{Module, Registry};
pub use support::{RecordModule, SetterModule, StandardModule};
pub use writer::Writer;

// ============================================================================
// Top-level Mapper handle
// ============================================================================

/// The primary entry point: an analyzer over a frozen registry plus the
/// read / write formats and namespaces to use.
#[derive(Debug)]
pub struct Mapper {
    analyzer: Analyzer,
    config: MapperConfig,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// A mapper with the standard, setter and record modules installed.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.analyzer)
    }

    pub fn writer(&self) -> Writer<'_> {
        Writer::new(&self.analyzer)
    }

    /// Analyze (or fetch the cached descriptor of) `T`.
    pub fn analyze<T: Reflect>(&self) -> Result<Arc<TypeDescriptor>> {
        self.analyzer.analyze::<T>()
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Read `subject` from `model`. `None` if the model says nothing about it.
    pub fn read<T: Reflect>(&self, model: &Model, subject: impl Into<Resource>) -> Result<Option<T>> {
        self.reader().read(model, &subject.into())
    }

    /// Parse `source` in the configured read format, then read `subject`.
    pub fn read_from<T: Reflect>(&self, source: &mut dyn Read, subject: impl Into<Resource>) -> Result<Option<T>> {
        self.read_from_format(source, subject, self.config.read_format)
    }

    pub fn read_from_format<T: Reflect>(
        &self,
        source: &mut dyn Read,
        subject: impl Into<Resource>,
        format: RdfFormat,
    ) -> Result<Option<T>> {
        let model = format::parse(source, format)?;
        self.read(&model, subject)
    }

    // ========================================================================
    // Write
    // ========================================================================

    /// An empty model carrying the configured namespaces.
    pub fn sink(&self) -> Model {
        let mut model = Model::new();
        for (prefix, ns) in &self.config.namespaces {
            model.set_namespace(prefix.clone(), ns.clone());
        }
        model
    }

    /// Write `instance` at `subject` into a fresh sink.
    pub fn write<T: Reflect>(&self, instance: &T, subject: impl Into<Resource>) -> Result<Model> {
        let mut model = self.sink();
        self.write_into(&mut model, instance, subject)?;
        Ok(model)
    }

    /// Write into an existing model. Not atomic: on failure, statements
    /// emitted before the error stay in `model`.
    pub fn write_into<T: Reflect>(&self, model: &mut Model, instance: &T, subject: impl Into<Resource>) -> Result<()> {
        self.writer().write(model, instance, &subject.into())
    }

    /// Write into a scratch model and merge it into `model` only on success.
    pub fn write_staged<T: Reflect>(&self, model: &mut Model, instance: &T, subject: impl Into<Resource>) -> Result<()> {
        let mut staging = Model::new();
        self.write_into(&mut staging, instance, subject)?;
        model.merge(staging);
        Ok(())
    }

    /// Write into a fresh sink and serialize it in the configured write format.
    pub fn write_to<T: Reflect>(&self, instance: &T, subject: impl Into<Resource>, out: &mut dyn Write) -> Result<()> {
        self.write_to_format(instance, subject, out, self.config.write_format)
    }

    pub fn write_to_format<T: Reflect>(
        &self,
        instance: &T,
        subject: impl Into<Resource>,
        out: &mut dyn Write,
        format: RdfFormat,
    ) -> Result<()> {
        let model = self.write(instance, subject)?;
        format::serialize(&model, format, out)
    }
}

/// Setup phase: collect modules and configuration, then freeze into a
/// [`Mapper`].
pub struct MapperBuilder {
    modules: Vec<Box<dyn Module>>,
    defaults: bool,
    config: MapperConfig,
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            defaults: true,
            config: MapperConfig::default(),
        }
    }
}

impl MapperBuilder {
    /// Install a module. Modules added here take precedence over the
    /// built-in ones.
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Skip the standard, setter and record modules.
    pub fn without_defaults(mut self) -> Self {
        self.defaults = false;
        self
    }

    pub fn namespace(mut self, prefix: impl Into<String>, namespace: Iri) -> Self {
        self.config.namespaces.insert(prefix.into(), namespace);
        self
    }

    /// Replace the configuration. Namespaces added before are kept unless
    /// the new configuration declares the same prefix.
    pub fn config(mut self, config: MapperConfig) -> Self {
        let earlier = std::mem::take(&mut self.config.namespaces);
        self.config = config;
        for (prefix, ns) in earlier {
            self.config.namespaces.entry(prefix).or_insert(ns);
        }
        self
    }

    pub fn build(self) -> Mapper {
        let mut registry = Registry::new();
        for module in &self.modules {
            registry.install(module.as_ref());
        }
        if self.defaults {
            registry
                .install(&StandardModule)
                .install(&SetterModule)
                .install(&RecordModule);
        }
        tracing::debug!(modules = ?registry.modules(), "mapper ready");
        Mapper {
            analyzer: Analyzer::new(registry),
            config: self.config,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Which phase an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Building a type descriptor.
    Analysis,
    /// Materializing instances from statements.
    Read,
    /// Emitting statements from instances.
    Write,
    /// Parsing or serializing bytes.
    Format,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --- analysis ---
    #[error("no property inspector supports type {type_name}")]
    NoInspector { type_name: String },

    #[error("no value converter for scalar type {type_name} (property {property})")]
    NoValueConverter { type_name: String, property: String },

    #[error("no multiplicity strategy for declared type {type_name} (property {property})")]
    NoMultiplicity { type_name: String, property: String },

    #[error("cannot determine element type of {type_name}")]
    NoElementType { type_name: String },

    #[error("property {property} of {type_name} has no setter")]
    MissingSetter { type_name: String, property: String },

    #[error("invalid IRI {iri:?}: {reason}")]
    InvalidIri { iri: String, reason: &'static str },

    #[error("invalid blank node label {label:?}: {reason}")]
    InvalidBlankNode { label: String, reason: &'static str },

    #[error("analysis of nested property {property} failed: {source}")]
    NestedAnalysis { property: String, source: Box<Error> },

    #[error("type {type_name} is not a mapped entity")]
    NotAnEntity { type_name: String },

    // --- read ---
    #[error("no instance strategy can construct {type_name}")]
    NoInstanceStrategy { type_name: String },

    #[error("missing required property {property} of {type_name}")]
    MissingRequired { type_name: String, property: String },

    #[error("attempt to populate readonly property {property} of {type_name}")]
    ReadonlyPopulated { type_name: String, property: String },

    #[error("property {property} expects {expected} value(s), got {got}")]
    Cardinality { property: String, expected: String, got: usize },

    #[error("cannot convert {value:?} to {type_name}: {reason}")]
    Conversion { value: String, type_name: &'static str, reason: String },

    #[error("property {property} expects {expected}, found {found}")]
    UnexpectedTerm { property: String, expected: &'static str, found: &'static str },

    #[error("constructor of {type_name} needs argument {name}")]
    MissingArgument { type_name: String, name: String },

    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("subject {subject} references itself through its nested properties")]
    CyclicReference { subject: String },

    // --- write ---
    #[error("required property {property} of {type_name} has no value")]
    MissingValue { type_name: String, property: String },

    #[error("cannot resolve subject of nested {type_name}: {reason}")]
    UnresolvedSubject { type_name: String, reason: &'static str },

    #[error("values of {type_name} have no textual form (property {property})")]
    NoTextualForm { type_name: String, property: String },

    // --- format ---
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("{format} does not support {operation}")]
    UnsupportedFormat { format: &'static str, operation: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoInspector { .. }
            | Error::NoValueConverter { .. }
            | Error::NoMultiplicity { .. }
            | Error::NoElementType { .. }
            | Error::MissingSetter { .. }
            | Error::InvalidIri { .. }
            | Error::InvalidBlankNode { .. }
            | Error::NestedAnalysis { .. }
            | Error::NotAnEntity { .. } => ErrorKind::Analysis,

            Error::NoInstanceStrategy { .. }
            | Error::MissingRequired { .. }
            | Error::ReadonlyPopulated { .. }
            | Error::Cardinality { .. }
            | Error::Conversion { .. }
            | Error::UnexpectedTerm { .. }
            | Error::MissingArgument { .. }
            | Error::TypeMismatch { .. }
            | Error::CyclicReference { .. } => ErrorKind::Read,

            Error::MissingValue { .. }
            | Error::UnresolvedSubject { .. }
            | Error::NoTextualForm { .. } => ErrorKind::Write,

            Error::Syntax { .. }
            | Error::UnsupportedFormat { .. }
            | Error::Io(_)
            | Error::Json(_) => ErrorKind::Format,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
