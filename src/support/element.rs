//! Element resolvers: declared field type → intrinsic element type.
//!
//! `Box` is pointer indirection, not a container, so it is stripped after
//! the container argument is taken: `Option<Box<Node>>` resolves to `Node`.

use crate::meta::{Shape, TypeRef};
use crate::spi::ElementResolver;
use crate::{Error, Result};

/// `Option<T>`, `Vec<T>`, `BTreeSet<T>` and `Box<T>` resolve to `T`.
pub struct ParameterizedResolver;

impl ElementResolver for ParameterizedResolver {
    fn supports(&self, declared: &TypeRef) -> bool {
        matches!(
            declared.shape(),
            Shape::Optional | Shape::Sequence | Shape::Set | Shape::Boxed
        )
    }

    fn resolve(&self, declared: &TypeRef) -> Result<TypeRef> {
        first_arg(declared).map(strip_boxes)
    }
}

/// `[T; N]` resolves to `T`.
pub struct ArrayResolver;

impl ElementResolver for ArrayResolver {
    fn supports(&self, declared: &TypeRef) -> bool {
        matches!(declared.shape(), Shape::Array(_))
    }

    fn resolve(&self, declared: &TypeRef) -> Result<TypeRef> {
        first_arg(declared).map(strip_boxes)
    }
}

fn first_arg(declared: &TypeRef) -> Result<TypeRef> {
    declared.args().first().cloned().ok_or_else(|| Error::NoElementType {
        type_name: declared.name().to_string(),
    })
}

fn strip_boxes(mut ty: TypeRef) -> TypeRef {
    while ty.shape() == Shape::Boxed {
        match ty.args().first() {
            Some(inner) => ty = inner.clone(),
            None => break,
        }
    }
    ty
}
