//! Entity declarations.
//!
//! A mapped type implements [`Entity`] and describes itself once through an
//! [`EntityDef`] builder: its fields (with accessor, optional mutator and one
//! mapping attribute), type-level subject / `rdf:type` declarations, how it is
//! constructed and which entity it extends. The typed builder is erased into
//! a [`TypeDef`] the analyzer consumes.
//!
//! ```ignore
//! impl Entity for Point {
//!     fn define(def: &mut EntityDef<Self>) {
//!         def.default_constructible();
//!         def.field("x", |p: &Point| &p.x)
//!             .set(|p, v| p.x = v)
//!             .predicate(Predicate::new(EX_X).datatype(xsd::INT));
//!     }
//! }
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hashbrown::HashMap;

use super::attr::{Attribute, Predicate, SemanticType, Subject};
use super::{AnyValue, Reflect, TypeRef};
use crate::{Error, Result};

/// A type with mapping metadata.
pub trait Entity: Reflect {
    fn define(def: &mut EntityDef<Self>);
}

// ============================================================================
// Erased accessors
// ============================================================================

/// Read access to one field of an erased owner.
pub trait Access: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
}

/// Mutable access to an embedded part of an erased owner.
pub trait AccessMut: Send + Sync {
    fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

/// Store a value into one field of an erased owner.
pub trait Mutate: Send + Sync {
    fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<()>;
}

/// Produce a blank instance for setter-based population.
pub trait Create: Send + Sync {
    fn create(&self) -> AnyValue;
}

/// Build an instance from collected named arguments.
pub trait Construct: Send + Sync {
    fn construct(&self, args: &mut Arguments) -> Result<AnyValue>;
}

struct FieldGet<T, F> {
    get: fn(&T) -> &F,
}

impl<T: Any, F: Any> Access for FieldGet<T, F> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        owner.downcast_ref::<T>().map(|t| (self.get)(t) as &dyn Any)
    }
}

struct FieldSet<T, F> {
    set: fn(&mut T, F),
}

impl<T: Any, F: Any> Mutate for FieldSet<T, F> {
    fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<()> {
        let owner = owner
            .downcast_mut::<T>()
            .ok_or(Error::TypeMismatch { expected: type_name::<T>() })?;
        let value = value
            .downcast::<F>()
            .map_err(|_| Error::TypeMismatch { expected: type_name::<F>() })?;
        (self.set)(owner, *value);
        Ok(())
    }
}

struct ParentView<T, P> {
    get: fn(&T) -> &P,
    get_mut: fn(&mut T) -> &mut P,
}

impl<T: Any, P: Any> Access for ParentView<T, P> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        owner.downcast_ref::<T>().map(|t| (self.get)(t) as &dyn Any)
    }
}

impl<T: Any, P: Any> AccessMut for ParentView<T, P> {
    fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        owner.downcast_mut::<T>().map(|t| (self.get_mut)(t) as &mut dyn Any)
    }
}

/// An inherited accessor seen through the parent projection.
pub struct Projected {
    outer: Arc<dyn Access>,
    inner: Arc<dyn Access>,
}

impl Projected {
    pub fn new(outer: Arc<dyn Access>, inner: Arc<dyn Access>) -> Self {
        Self { outer, inner }
    }
}

impl Access for Projected {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        self.inner.get(self.outer.get(owner)?)
    }
}

/// An inherited mutator applied through the parent projection.
pub struct ProjectedMutate {
    outer: Arc<dyn AccessMut>,
    inner: Arc<dyn Mutate>,
}

impl ProjectedMutate {
    pub fn new(outer: Arc<dyn AccessMut>, inner: Arc<dyn Mutate>) -> Self {
        Self { outer, inner }
    }
}

impl Mutate for ProjectedMutate {
    fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<()> {
        let target = self
            .outer
            .get_mut(owner)
            .ok_or(Error::TypeMismatch { expected: "parent projection" })?;
        self.inner.set(target, value)
    }
}

struct DefaultCreate<T>(PhantomData<fn() -> T>);

impl<T: Reflect + Default> Create for DefaultCreate<T> {
    fn create(&self) -> AnyValue {
        Box::new(T::default())
    }
}

struct ConstructWith<T> {
    build: fn(&mut Arguments) -> Result<T>,
}

impl<T: Reflect> Construct for ConstructWith<T> {
    fn construct(&self, args: &mut Arguments) -> Result<AnyValue> {
        Ok(Box::new((self.build)(args)?))
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Property values collected for argument-based construction, keyed by
/// property name.
pub struct Arguments {
    type_name: &'static str,
    values: HashMap<String, AnyValue>,
}

impl Arguments {
    pub fn new(type_name: &'static str) -> Self {
        Self { type_name, values: HashMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AnyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take a value that must be present.
    pub fn take<F: Any>(&mut self, name: &str) -> Result<F> {
        self.take_opt(name)?.ok_or_else(|| Error::MissingArgument {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
        })
    }

    pub fn take_opt<F: Any>(&mut self, name: &str) -> Result<Option<F>> {
        match self.values.remove(name) {
            None => Ok(None),
            Some(value) => value
                .downcast::<F>()
                .map(|v| Some(*v))
                .map_err(|_| Error::TypeMismatch { expected: type_name::<F>() }),
        }
    }

    pub fn take_or_default<F: Any + Default>(&mut self, name: &str) -> Result<F> {
        Ok(self.take_opt(name)?.unwrap_or_default())
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("type_name", &self.type_name)
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Erased definition
// ============================================================================

/// How instances of a type come into being.
#[derive(Clone, Default)]
pub enum Construction {
    /// Nothing declared: the type can be analyzed but not instantiated.
    #[default]
    Unspecified,
    /// Start from a blank instance, apply each property through its mutator.
    Setters(Arc<dyn Create>),
    /// Collect values by name, build at the end.
    Arguments(Arc<dyn Construct>),
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construction::Unspecified => "Unspecified",
            Construction::Setters(_) => "Setters",
            Construction::Arguments(_) => "Arguments",
        })
    }
}

/// One declared field.
#[derive(Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub declared: TypeRef,
    pub access: Arc<dyn Access>,
    pub mutate: Option<Arc<dyn Mutate>>,
    pub attribute: Attribute,
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("mutable", &self.mutate.is_some())
            .field("attribute", &self.attribute)
            .finish()
    }
}

/// The embedded parent entity and how to reach it.
#[derive(Clone)]
pub struct ParentDef {
    pub type_ref: TypeRef,
    pub access: Arc<dyn Access>,
    pub access_mut: Arc<dyn AccessMut>,
}

impl fmt::Debug for ParentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParentDef").field(&self.type_ref).finish()
    }
}

/// Everything an entity declared about itself, with Rust types erased.
#[derive(Debug, Clone)]
pub struct TypeDef {
    type_ref: TypeRef,
    parent: Option<ParentDef>,
    subject: Option<Subject>,
    types: Vec<SemanticType>,
    construction: Construction,
    fields: Vec<FieldDef>,
}

impl TypeDef {
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn name(&self) -> &'static str {
        self.type_ref.name()
    }

    pub fn parent(&self) -> Option<&ParentDef> {
        self.parent.as_ref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn types(&self) -> &[SemanticType] {
        &self.types
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// True if every declared field has a mutator.
    pub fn all_mutable(&self) -> bool {
        self.fields.iter().all(|f| f.mutate.is_some())
    }

    pub fn any_mutable(&self) -> bool {
        self.fields.iter().any(|f| f.mutate.is_some())
    }
}

// ============================================================================
// Typed builder
// ============================================================================

/// Declaration builder handed to [`Entity::define`].
pub struct EntityDef<T> {
    parent: Option<ParentDef>,
    subject: Option<Subject>,
    types: Vec<SemanticType>,
    construction: Construction,
    fields: Vec<FieldDef>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityDef<T> {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            subject: None,
            types: Vec::new(),
            construction: Construction::Unspecified,
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn finish(self) -> TypeDef {
        TypeDef {
            type_ref: T::type_ref(),
            parent: self.parent,
            subject: self.subject,
            types: self.types,
            construction: self.construction,
            fields: self.fields,
        }
    }

    /// Type-level subject rule used when instances appear nested.
    pub fn subject(&mut self, subject: Subject) -> &mut Self {
        self.subject = Some(subject);
        self
    }

    /// Fixed `rdf:type` IRIs emitted for every instance.
    pub fn semantic_type(&mut self, types: SemanticType) -> &mut Self {
        self.types.push(types);
        self
    }

    /// Inherit the mapping of an embedded parent entity.
    pub fn extends<P: Entity>(&mut self, get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> &mut Self {
        let view = Arc::new(ParentView { get, get_mut });
        self.parent = Some(ParentDef {
            type_ref: P::type_ref(),
            access: view.clone(),
            access_mut: view,
        });
        self
    }

    /// Instances start from `T::default()` and are populated through setters.
    pub fn default_constructible(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.construction = Construction::Setters(Arc::new(DefaultCreate::<T>(PhantomData)));
        self
    }

    /// Instances are built once from all collected property values.
    pub fn constructor(&mut self, build: fn(&mut Arguments) -> Result<T>) -> &mut Self {
        self.construction = Construction::Arguments(Arc::new(ConstructWith { build }));
        self
    }

    /// Start declaring a field. Finish with one of the attribute methods.
    pub fn field<F: Reflect>(&mut self, name: &'static str, get: fn(&T) -> &F) -> FieldBuilder<'_, T, F> {
        FieldBuilder { def: self, name, get, set: None }
    }
}

/// A field under declaration.
pub struct FieldBuilder<'d, T, F> {
    def: &'d mut EntityDef<T>,
    name: &'static str,
    get: fn(&T) -> &F,
    set: Option<fn(&mut T, F)>,
}

impl<'d, T: Entity, F: Reflect> FieldBuilder<'d, T, F> {
    pub fn set(mut self, set: fn(&mut T, F)) -> Self {
        self.set = Some(set);
        self
    }

    pub fn predicate(self, predicate: Predicate) -> &'d mut EntityDef<T> {
        self.attach(Attribute::Predicate(predicate))
    }

    /// This field holds the instance's subject identity.
    pub fn subject(self, subject: Subject) -> &'d mut EntityDef<T> {
        self.attach(Attribute::Subject(subject))
    }

    /// This field's elements are additional `rdf:type` IRIs.
    pub fn semantic_type(self, types: SemanticType) -> &'d mut EntityDef<T> {
        self.attach(Attribute::Type(types))
    }

    fn attach(self, attribute: Attribute) -> &'d mut EntityDef<T> {
        let mutate = self
            .set
            .map(|set| Arc::new(FieldSet::<T, F> { set }) as Arc<dyn Mutate>);
        self.def.fields.push(FieldDef {
            name: self.name,
            declared: F::type_ref(),
            access: Arc::new(FieldGet::<T, F> { get: self.get }),
            mutate,
            attribute,
        });
        self.def
    }
}
