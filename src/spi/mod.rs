//! # Strategy Interfaces
//!
//! The extension points of the mapper and the [`Registry`] that holds them.
//! Every lookup is "first registered implementation whose `supports` holds".
//!
//! ## Extension points
//!
//! | Trait | Chosen per | Role |
//! |-------|-----------|------|
//! | [`InstanceStrategyFactory`] | entity type | builds one instance from property values |
//! | [`TypeInspector`] | entity type | lists the type's mapped properties |
//! | [`ElementResolver`] | declared field type | finds the intrinsic element type |
//! | [`MultiplicityFactory`] | declared field type | folds 0..N values into the field's shape |
//! | [`ValueConverter`] | scalar type | term → value |
//! | [`WrapperHandler`] | declared field type | unwraps optional-like values on write |
//!
//! Registration happens before an [`Analyzer`](crate::analyzer::Analyzer) is
//! built from the registry; after that the registry is owned by the analyzer
//! and never changes.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::Result;
use crate::analyzer::PropertyDescriptor;
use crate::meta::{Access, AnyValue, Attribute, Facet, Mutate, Reflect, TypeDef, TypeRef};
use crate::model::Term;

// ============================================================================
// Instance construction
// ============================================================================

/// Decides whether it can build instances of a type and hands out a fresh
/// [`InstanceStrategy`] per materialized instance.
pub trait InstanceStrategyFactory: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, def: &TypeDef) -> bool;
    fn create(&self, def: &TypeDef) -> Result<Box<dyn InstanceStrategy>>;
}

/// Accumulates property values for one instance. Not shared across threads.
pub trait InstanceStrategy {
    fn add(&mut self, property: &PropertyDescriptor, value: AnyValue) -> Result<()>;
    fn finish(self: Box<Self>) -> Result<AnyValue>;
}

// ============================================================================
// Property discovery
// ============================================================================

/// How a discovered property receives its value on read.
#[derive(Clone)]
pub enum Mutation {
    /// Applied to a live instance.
    Setter(Arc<dyn Mutate>),
    /// Collected by name and handed to the constructor.
    Argument,
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mutation::Setter(_) => "Setter",
            Mutation::Argument => "Argument",
        })
    }
}

/// A property as reported by an inspector, before element, converter and
/// multiplicity resolution.
#[derive(Clone)]
pub struct PropertyDraft {
    pub name: &'static str,
    pub declared: TypeRef,
    pub access: Arc<dyn Access>,
    pub mutation: Mutation,
    pub attribute: Attribute,
}

/// Lists the properties of a type for one metadata facet.
pub trait TypeInspector: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, def: &TypeDef) -> bool;
    fn inspect(
        &self,
        def: &TypeDef,
        facet: Facet,
        sink: &mut dyn FnMut(PropertyDraft) -> Result<()>,
    ) -> Result<()>;
}

// ============================================================================
// Element types and multiplicity
// ============================================================================

/// Finds the type of one value inside a declared container type.
pub trait ElementResolver: Send + Sync {
    fn supports(&self, declared: &TypeRef) -> bool;
    fn resolve(&self, declared: &TypeRef) -> Result<TypeRef>;
}

/// Creates a [`MultiplicityStrategy`] sized to the raw object count.
pub trait MultiplicityFactory: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, declared: &TypeRef) -> bool;
    fn create(&self, property: &PropertyDescriptor, size: usize) -> Result<Box<dyn MultiplicityStrategy>>;
}

/// Folds intrinsic values into the declared shape. `finish` yields `None`
/// when nothing should be handed to the instance.
pub trait MultiplicityStrategy {
    fn add(&mut self, value: AnyValue) -> Result<()>;
    fn finish(self: Box<Self>) -> Result<Option<AnyValue>>;
}

// ============================================================================
// Scalars and wrappers
// ============================================================================

/// Converts an object term into a value of one scalar type.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, term: &Term) -> Result<AnyValue>;
}

/// Unwraps an optional-like declared value on the write path.
pub trait WrapperHandler: Send + Sync {
    fn supports(&self, declared: &TypeRef) -> bool;
    fn unwrap<'a>(&self, declared: &TypeRef, value: &'a dyn Any) -> Result<Option<&'a dyn Any>>;
}

// ============================================================================
// Modules and registry
// ============================================================================

/// A bundle of registrations installed in one go.
pub trait Module {
    fn name(&self) -> &'static str;
    fn setup(&self, registry: &mut Registry);
}

/// Setup-phase collection of strategies, in registration order.
#[derive(Default)]
pub struct Registry {
    instance_factories: Vec<Arc<dyn InstanceStrategyFactory>>,
    inspectors: Vec<Arc<dyn TypeInspector>>,
    resolvers: Vec<Arc<dyn ElementResolver>>,
    multiplicities: Vec<Arc<dyn MultiplicityFactory>>,
    wrappers: Vec<Arc<dyn WrapperHandler>>,
    converters: HashMap<TypeId, Arc<dyn ValueConverter>>,
    modules: Vec<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, module: &dyn Module) -> &mut Self {
        tracing::debug!(module = module.name(), "installing module");
        module.setup(self);
        self.modules.push(module.name());
        self
    }

    pub fn add_instance_factory(&mut self, factory: impl InstanceStrategyFactory + 'static) -> &mut Self {
        self.instance_factories.push(Arc::new(factory));
        self
    }

    pub fn add_inspector(&mut self, inspector: impl TypeInspector + 'static) -> &mut Self {
        self.inspectors.push(Arc::new(inspector));
        self
    }

    pub fn add_resolver(&mut self, resolver: impl ElementResolver + 'static) -> &mut Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn add_multiplicity(&mut self, factory: impl MultiplicityFactory + 'static) -> &mut Self {
        self.multiplicities.push(Arc::new(factory));
        self
    }

    pub fn add_wrapper(&mut self, wrapper: impl WrapperHandler + 'static) -> &mut Self {
        self.wrappers.push(Arc::new(wrapper));
        self
    }

    /// Register the converter for scalar type `T`. Like every other lookup,
    /// the first registration for a type wins.
    pub fn add_converter<T: Reflect>(&mut self, converter: impl ValueConverter + 'static) -> &mut Self {
        self.converters
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(converter));
        self
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn instance_factory_for(&self, def: &TypeDef) -> Option<Arc<dyn InstanceStrategyFactory>> {
        self.instance_factories.iter().find(|f| f.supports(def)).cloned()
    }

    pub fn inspector_for(&self, def: &TypeDef) -> Option<Arc<dyn TypeInspector>> {
        self.inspectors.iter().find(|i| i.supports(def)).cloned()
    }

    /// Intrinsic element type of `declared`; the declared type itself when
    /// no resolver applies.
    pub fn resolve_element(&self, declared: &TypeRef) -> Result<TypeRef> {
        match self.resolvers.iter().find(|r| r.supports(declared)) {
            Some(resolver) => resolver.resolve(declared),
            None => Ok(declared.clone()),
        }
    }

    pub fn multiplicity_for(&self, declared: &TypeRef) -> Option<Arc<dyn MultiplicityFactory>> {
        self.multiplicities.iter().find(|m| m.supports(declared)).cloned()
    }

    pub fn wrapper_for(&self, declared: &TypeRef) -> Option<Arc<dyn WrapperHandler>> {
        self.wrappers.iter().find(|w| w.supports(declared)).cloned()
    }

    pub fn converter_for(&self, intrinsic: &TypeRef) -> Option<Arc<dyn ValueConverter>> {
        self.converters.get(&intrinsic.id()).cloned()
    }

    pub fn modules(&self) -> &[&'static str] {
        &self.modules
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules)
            .field("instance_factories", &self.instance_factories.iter().map(|x| x.name()).collect::<Vec<_>>())
            .field("inspectors", &self.inspectors.iter().map(|x| x.name()).collect::<Vec<_>>())
            .field("resolvers", &self.resolvers.len())
            .field("multiplicities", &self.multiplicities.iter().map(|x| x.name()).collect::<Vec<_>>())
            .field("wrappers", &self.wrappers.len())
            .field("converters", &self.converters.len())
            .finish()
    }
}
