//! # Type Metadata
//!
//! What the analyzer knows about Rust types at runtime.
//!
//! - [`TypeRef`]: erased handle (identity, [`Shape`], generic args, and the
//!   monomorphized operations the codecs need)
//! - [`Reflect`]: implemented by every type that can appear in a mapped
//!   field; built-in impls cover scalars, `Option`, `Vec`, `BTreeSet`,
//!   `Box` and fixed arrays
//! - [`Entity`] / [`EntityDef`]: how a mapped type declares its fields,
//!   subject rule, `rdf:type`s, construction and parent
//! - [`Predicate`], [`Subject`], [`SemanticType`]: the metadata schema

pub mod attr;
pub mod entity;
mod reflect;
pub mod type_ref;

use std::any::{Any, type_name};

pub use attr::{Attribute, Facet, Predicate, SemanticType, Subject};
pub use entity::{
    Access, AccessMut, Arguments, Construct, Construction, Create, Entity, EntityDef, FieldBuilder,
    FieldDef, Mutate, ParentDef, Projected, ProjectedMutate, TypeDef,
};
pub use type_ref::{AnyValue, Shape, TypeRef};

use crate::{Error, Result};

/// A type the mapper can describe at runtime.
pub trait Reflect: Any + Send + Sync + Sized {
    fn type_ref() -> TypeRef;

    /// Take ownership of an erased intrinsic value as `Self`.
    fn adopt(value: AnyValue) -> Result<Self> {
        value
            .downcast::<Self>()
            .map(|v| *v)
            .map_err(|_| Error::TypeMismatch { expected: type_name::<Self>() })
    }

    /// The value one level of pointer indirection down, if any.
    fn intrinsic(&self) -> &dyn Any {
        self
    }
}

/// Implement [`Reflect`] for one or more [`Entity`] types.
///
/// ```ignore
/// triplemap::reflect_entity!(Parent, Child);
/// ```
#[macro_export]
macro_rules! reflect_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::meta::Reflect for $ty {
                fn type_ref() -> $crate::meta::TypeRef {
                    $crate::meta::TypeRef::entity::<$ty>()
                }
            }
        )+
    };
}
