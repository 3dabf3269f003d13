//! Write-path unwrapping of `Option<T>` fields.

use std::any::Any;

use crate::meta::{Shape, TypeRef};
use crate::spi::WrapperHandler;
use crate::{Error, Result};

pub struct OptionalWrapper;

impl WrapperHandler for OptionalWrapper {
    fn supports(&self, declared: &TypeRef) -> bool {
        declared.shape() == Shape::Optional
    }

    fn unwrap<'a>(&self, declared: &TypeRef, value: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        declared
            .unwrap(value)
            .ok_or(Error::TypeMismatch { expected: declared.name() })
    }
}
