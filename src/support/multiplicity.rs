//! Multiplicity strategies: fold 0..N intrinsic values into the declared
//! field shape.
//!
//! | Factory | Declared shape | Raw objects accepted |
//! |---------|----------------|----------------------|
//! | [`SingleFactory`] | scalar, entity, `Box<T>` | 0..=1 |
//! | [`OptionalFactory`] | `Option<T>` | 0..=1 |
//! | [`CollectionFactory`] | `Vec<T>`, `BTreeSet<T>` | any |
//! | [`ArrayFactory`] | `[T; N]` | exactly N |
//!
//! Raw counts are checked at creation; values dropped afterwards (dangling
//! nested references) only matter where the shape needs an exact count.

use crate::analyzer::PropertyDescriptor;
use crate::meta::{AnyValue, Shape, TypeRef};
use crate::spi::{MultiplicityFactory, MultiplicityStrategy};
use crate::{Error, Result};

fn cardinality(property: &PropertyDescriptor, expected: impl Into<String>, got: usize) -> Error {
    Error::Cardinality {
        property: property.name.to_string(),
        expected: expected.into(),
        got,
    }
}

/// Accumulated values plus the declared type they fold into.
struct Collected {
    declared: TypeRef,
    values: Vec<AnyValue>,
}

impl Collected {
    fn new(property: &PropertyDescriptor, size: usize) -> Self {
        Self {
            declared: property.declared.clone(),
            values: Vec::with_capacity(size),
        }
    }

    fn collect(self) -> Result<Option<AnyValue>> {
        match self.declared.collect(self.values) {
            Some(result) => result.map(Some),
            None => Err(Error::TypeMismatch { expected: self.declared.name() }),
        }
    }
}

// ============================================================================
// Single
// ============================================================================

pub struct SingleFactory;

impl MultiplicityFactory for SingleFactory {
    fn name(&self) -> &'static str {
        "single"
    }

    fn supports(&self, declared: &TypeRef) -> bool {
        matches!(declared.shape(), Shape::Scalar | Shape::Entity | Shape::Boxed)
    }

    fn create(&self, property: &PropertyDescriptor, size: usize) -> Result<Box<dyn MultiplicityStrategy>> {
        if size > 1 {
            return Err(cardinality(property, "at most 1", size));
        }
        Ok(Box::new(Single(Collected::new(property, size))))
    }
}

struct Single(Collected);

impl MultiplicityStrategy for Single {
    fn add(&mut self, value: AnyValue) -> Result<()> {
        self.0.values.push(value);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Option<AnyValue>> {
        let Collected { declared, mut values } = self.0;
        match values.pop() {
            Some(value) => declared.adopt(value).map(Some),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Optional
// ============================================================================

pub struct OptionalFactory;

impl MultiplicityFactory for OptionalFactory {
    fn name(&self) -> &'static str {
        "optional"
    }

    fn supports(&self, declared: &TypeRef) -> bool {
        declared.shape() == Shape::Optional
    }

    fn create(&self, property: &PropertyDescriptor, size: usize) -> Result<Box<dyn MultiplicityStrategy>> {
        if size > 1 {
            return Err(cardinality(property, "at most 1", size));
        }
        Ok(Box::new(Folded(Collected::new(property, size))))
    }
}

// ============================================================================
// Collection
// ============================================================================

pub struct CollectionFactory;

impl MultiplicityFactory for CollectionFactory {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn supports(&self, declared: &TypeRef) -> bool {
        matches!(declared.shape(), Shape::Sequence | Shape::Set)
    }

    fn create(&self, property: &PropertyDescriptor, size: usize) -> Result<Box<dyn MultiplicityStrategy>> {
        Ok(Box::new(Folded(Collected::new(property, size))))
    }
}

/// Hands everything to the declared type's `collect`.
struct Folded(Collected);

impl MultiplicityStrategy for Folded {
    fn add(&mut self, value: AnyValue) -> Result<()> {
        self.0.values.push(value);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Option<AnyValue>> {
        self.0.collect()
    }
}

// ============================================================================
// Array
// ============================================================================

pub struct ArrayFactory;

impl MultiplicityFactory for ArrayFactory {
    fn name(&self) -> &'static str {
        "array"
    }

    fn supports(&self, declared: &TypeRef) -> bool {
        matches!(declared.shape(), Shape::Array(_))
    }

    fn create(&self, property: &PropertyDescriptor, size: usize) -> Result<Box<dyn MultiplicityStrategy>> {
        let Shape::Array(len) = property.declared.shape() else {
            return Err(Error::TypeMismatch { expected: "fixed-size array" });
        };
        if size != len {
            return Err(cardinality(property, format!("exactly {len}"), size));
        }
        Ok(Box::new(Array {
            property: property.name.to_string(),
            len,
            inner: Collected::new(property, size),
        }))
    }
}

struct Array {
    property: String,
    len: usize,
    inner: Collected,
}

impl MultiplicityStrategy for Array {
    fn add(&mut self, value: AnyValue) -> Result<()> {
        self.inner.values.push(value);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Option<AnyValue>> {
        let got = self.inner.values.len();
        if got != self.len {
            return Err(Error::Cardinality {
                property: self.property,
                expected: format!("exactly {}", self.len),
                got,
            });
        }
        self.inner.collect()
    }
}
