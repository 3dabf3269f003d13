//! Runtime type descriptions.
//!
//! A [`TypeRef`] is the erased, cloneable handle the analyzer works with in
//! place of a reflective class object. It carries the type's identity, its
//! container [`Shape`], generic arguments, and the handful of monomorphized
//! operations the codecs need (adopting an element value, viewing a value,
//! collecting / iterating containers, printing scalars).

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::entity::{EntityDef, TypeDef};
use super::{Entity, Reflect};
use crate::{Error, Result};

/// A type-erased value as produced by converters and construction strategies.
pub type AnyValue = Box<dyn Any + Send + Sync>;

type AdoptFn = fn(AnyValue) -> Result<AnyValue>;
type ViewFn = for<'a> fn(&'a dyn Any) -> Option<&'a dyn Any>;
type CollectFn = fn(Vec<AnyValue>) -> Result<AnyValue>;
type ElementsFn = for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>;
type UnwrapFn = for<'a> fn(&'a dyn Any) -> Option<Option<&'a dyn Any>>;
type LexicalFn = fn(&dyn Any) -> Option<String>;
type DefineFn = fn() -> TypeDef;

/// Outer structure of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A built-in value type converted from/to literals.
    Scalar,
    /// A mapped type with its own entity definition.
    Entity,
    /// `Box<T>`: pointer indirection, transparent to element resolution.
    Boxed,
    /// `Option<T>`: zero or one value.
    Optional,
    /// `Vec<T>`: growable, ordered.
    Sequence,
    /// `BTreeSet<T>`: growable, deduplicated.
    Set,
    /// `[T; N]`: exactly N values.
    Array(usize),
}

impl Shape {
    pub fn is_container(self) -> bool {
        matches!(self, Shape::Optional | Shape::Sequence | Shape::Set | Shape::Array(_))
    }
}

struct TypeInfo {
    id: TypeId,
    name: &'static str,
    shape: Shape,
    args: Vec<TypeRef>,
    adopt: AdoptFn,
    view: ViewFn,
    collect: Option<CollectFn>,
    elements: Option<ElementsFn>,
    unwrap: Option<UnwrapFn>,
    lexical: Option<LexicalFn>,
    define: Option<DefineFn>,
}

/// Cheaply cloneable handle describing one Rust type.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeInfo>);

impl TypeRef {
    fn build<T: Reflect>(shape: Shape, args: Vec<TypeRef>) -> TypeInfo {
        TypeInfo {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            shape,
            args,
            adopt: adopt_as::<T>,
            view: view_as::<T>,
            collect: None,
            elements: None,
            unwrap: None,
            lexical: None,
            define: None,
        }
    }

    /// A scalar printed through its `Display` impl.
    pub fn scalar<T: Reflect + fmt::Display>() -> Self {
        Self::scalar_with::<T>(display_of::<T>)
    }

    /// A scalar with a custom lexical form.
    pub fn scalar_with<T: Reflect>(lexical: LexicalFn) -> Self {
        let mut info = Self::build::<T>(Shape::Scalar, Vec::new());
        info.lexical = Some(lexical);
        Self(Arc::new(info))
    }

    /// A mapped entity type.
    pub fn entity<T: Entity>() -> Self {
        let mut info = Self::build::<T>(Shape::Entity, Vec::new());
        info.define = Some(define_entity::<T>);
        Self(Arc::new(info))
    }

    pub fn boxed<T: Reflect>() -> Self {
        let mut info = Self::build::<Box<T>>(Shape::Boxed, vec![T::type_ref()]);
        info.lexical = Some(boxed_lexical::<T>);
        Self(Arc::new(info))
    }

    pub fn optional<T: Reflect>() -> Self {
        let mut info = Self::build::<Option<T>>(Shape::Optional, vec![T::type_ref()]);
        info.collect = Some(collect_option::<T>);
        info.unwrap = Some(unwrap_option::<T>);
        Self(Arc::new(info))
    }

    pub fn sequence<T: Reflect>() -> Self {
        let mut info = Self::build::<Vec<T>>(Shape::Sequence, vec![T::type_ref()]);
        info.collect = Some(collect_vec::<T>);
        info.elements = Some(elements_vec::<T>);
        Self(Arc::new(info))
    }

    pub fn set<T: Reflect + Ord>() -> Self {
        let mut info = Self::build::<BTreeSet<T>>(Shape::Set, vec![T::type_ref()]);
        info.collect = Some(collect_set::<T>);
        info.elements = Some(elements_set::<T>);
        Self(Arc::new(info))
    }

    pub fn array<T: Reflect, const N: usize>() -> Self {
        let mut info = Self::build::<[T; N]>(Shape::Array(N), vec![T::type_ref()]);
        info.collect = Some(collect_array::<T, N>);
        info.elements = Some(elements_array::<T, N>);
        Self(Arc::new(info))
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn id(&self) -> TypeId {
        self.0.id
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn shape(&self) -> Shape {
        self.0.shape
    }

    pub fn args(&self) -> &[TypeRef] {
        &self.0.args
    }

    /// Built-in types are everything that is not a mapped entity.
    pub fn is_builtin(&self) -> bool {
        self.0.shape != Shape::Entity
    }

    pub fn is_entity(&self) -> bool {
        self.0.shape == Shape::Entity
    }

    /// Build the entity definition. `None` for built-in types.
    pub fn definition(&self) -> Option<TypeDef> {
        self.0.define.map(|define| define())
    }

    // ========================================================================
    // Erased operations
    // ========================================================================

    /// Turn an intrinsic (element) value into a value of this type.
    pub fn adopt(&self, value: AnyValue) -> Result<AnyValue> {
        (self.0.adopt)(value)
    }

    /// Borrow the intrinsic value behind a value of this type.
    pub fn view<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.0.view)(value)
    }

    /// Build a container of this type from intrinsic element values.
    /// `None` if this type is not a collecting container.
    pub fn collect(&self, items: Vec<AnyValue>) -> Option<Result<AnyValue>> {
        self.0.collect.map(|collect| collect(items))
    }

    /// Borrow the intrinsic elements of an iterable container.
    pub fn elements<'a>(&self, value: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        self.0.elements.and_then(|elements| elements(value))
    }

    pub fn is_iterable(&self) -> bool {
        self.0.elements.is_some()
    }

    /// Unwrap an optional-like value to the contained (declared element)
    /// value. Outer `None`: not this type.
    pub fn unwrap<'a>(&self, value: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        self.0.unwrap.and_then(|unwrap| unwrap(value))
    }

    /// Textual form of a value of this type, if it has one.
    pub fn lexical(&self, value: &dyn Any) -> Option<String> {
        self.0.lexical.and_then(|lexical| lexical(value))
    }

    pub fn has_lexical_form(&self) -> bool {
        self.0.lexical.is_some()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("name", &self.0.name)
            .field("shape", &self.0.shape)
            .finish()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

// ============================================================================
// Monomorphized operations
// ============================================================================

fn adopt_as<T: Reflect>(value: AnyValue) -> Result<AnyValue> {
    T::adopt(value).map(|v| Box::new(v) as AnyValue)
}

fn view_as<T: Reflect>(value: &dyn Any) -> Option<&dyn Any> {
    value.downcast_ref::<T>().map(|v| v.intrinsic())
}

fn display_of<T: Reflect + fmt::Display>(value: &dyn Any) -> Option<String> {
    value.downcast_ref::<T>().map(ToString::to_string)
}

fn boxed_lexical<T: Reflect>(value: &dyn Any) -> Option<String> {
    let inner = value.downcast_ref::<Box<T>>()?;
    T::type_ref().lexical(inner.intrinsic())
}

fn define_entity<T: Entity>() -> TypeDef {
    let mut def = EntityDef::<T>::new();
    T::define(&mut def);
    def.finish()
}

fn adopt_all<T: Reflect>(items: Vec<AnyValue>) -> Result<Vec<T>> {
    items.into_iter().map(T::adopt).collect()
}

fn collect_option<T: Reflect>(items: Vec<AnyValue>) -> Result<AnyValue> {
    let got = items.len();
    if got > 1 {
        return Err(Error::Cardinality {
            property: type_name::<Option<T>>().to_string(),
            expected: "at most 1".into(),
            got,
        });
    }
    let value: Option<T> = adopt_all::<T>(items)?.pop();
    Ok(Box::new(value))
}

fn unwrap_option<T: Reflect>(value: &dyn Any) -> Option<Option<&dyn Any>> {
    value
        .downcast_ref::<Option<T>>()
        .map(|opt| opt.as_ref().map(|v| v as &dyn Any))
}

fn collect_vec<T: Reflect>(items: Vec<AnyValue>) -> Result<AnyValue> {
    Ok(Box::new(adopt_all::<T>(items)?))
}

fn elements_vec<T: Reflect>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    value
        .downcast_ref::<Vec<T>>()
        .map(|v| v.iter().map(|e| e.intrinsic()).collect())
}

fn collect_set<T: Reflect + Ord>(items: Vec<AnyValue>) -> Result<AnyValue> {
    let set: BTreeSet<T> = adopt_all::<T>(items)?.into_iter().collect();
    Ok(Box::new(set))
}

fn elements_set<T: Reflect + Ord>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    value
        .downcast_ref::<BTreeSet<T>>()
        .map(|s| s.iter().map(|e| e.intrinsic()).collect())
}

fn collect_array<T: Reflect, const N: usize>(items: Vec<AnyValue>) -> Result<AnyValue> {
    let got = items.len();
    let array: [T; N] = adopt_all::<T>(items)?
        .try_into()
        .map_err(|_| Error::Cardinality {
            property: type_name::<[T; N]>().to_string(),
            expected: format!("exactly {N}"),
            got,
        })?;
    Ok(Box::new(array))
}

fn elements_array<T: Reflect, const N: usize>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    value
        .downcast_ref::<[T; N]>()
        .map(|a| a.iter().map(|e| e.intrinsic()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(<i32 as Reflect>::type_ref().shape(), Shape::Scalar);
        assert_eq!(<Vec<i32> as Reflect>::type_ref().shape(), Shape::Sequence);
        assert_eq!(<[i32; 3] as Reflect>::type_ref().shape(), Shape::Array(3));
        assert_eq!(<Option<String> as Reflect>::type_ref().shape(), Shape::Optional);
        assert!(<Option<String> as Reflect>::type_ref().is_builtin());
    }

    #[test]
    fn test_collect_and_iterate_vec() {
        let ty = <Vec<i32> as Reflect>::type_ref();
        let items: Vec<AnyValue> = vec![Box::new(1i32), Box::new(2i32)];
        let value = ty.collect(items).unwrap().unwrap();
        let vec = value.downcast_ref::<Vec<i32>>().unwrap();
        assert_eq!(vec, &vec![1, 2]);

        let elems = ty.elements(vec as &dyn Any).unwrap();
        let ints: Vec<i32> = elems.iter().map(|e| *e.downcast_ref::<i32>().unwrap()).collect();
        assert_eq!(ints, vec![1, 2]);
    }

    #[test]
    fn test_collect_array_rejects_wrong_length() {
        let ty = <[i32; 3] as Reflect>::type_ref();
        let items: Vec<AnyValue> = vec![Box::new(1i32), Box::new(2i32)];
        assert!(matches!(ty.collect(items), Some(Err(Error::Cardinality { got: 2, .. }))));
    }

    #[test]
    fn test_boxed_adopt_wraps_intrinsic() {
        let ty = <Box<String> as Reflect>::type_ref();
        let value = ty.adopt(Box::new(String::from("x"))).unwrap();
        let boxed = value.downcast_ref::<Box<String>>().unwrap();
        assert_eq!(boxed.as_str(), "x");
        assert_eq!(ty.view(boxed as &dyn Any).and_then(|v| v.downcast_ref::<String>()), Some(&String::from("x")));
    }

    #[test]
    fn test_adopt_rejects_wrong_type() {
        let ty = <i32 as Reflect>::type_ref();
        assert!(matches!(ty.adopt(Box::new("nope")), Err(Error::TypeMismatch { .. })));
    }
}
