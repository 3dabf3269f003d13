//! Scalar converters: object term → value.
//!
//! Most scalars go through [`FromStrConverter`]; `bool`, `String` and `Iri`
//! need their own rules.

use std::any::type_name;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::meta::{AnyValue, Reflect};
use crate::model::{Iri, Term};
use crate::spi::{Registry, ValueConverter};
use crate::{Error, Result};

/// Parses the term's text with `T::from_str`.
pub struct FromStrConverter<T>(PhantomData<fn() -> T>);

impl<T> FromStrConverter<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueConverter for FromStrConverter<T>
where
    T: Reflect + FromStr,
    T::Err: Display,
{
    fn convert(&self, term: &Term) -> Result<AnyValue> {
        let text = term.text();
        text.trim()
            .parse::<T>()
            .map(|v| Box::new(v) as AnyValue)
            .map_err(|e| Error::Conversion {
                value: text.to_string(),
                type_name: type_name::<T>(),
                reason: e.to_string(),
            })
    }
}

/// `true`/`false`, and the `1`/`0` forms `xsd:boolean` allows.
pub struct BoolConverter;

impl ValueConverter for BoolConverter {
    fn convert(&self, term: &Term) -> Result<AnyValue> {
        match term.text().trim() {
            "true" | "1" => Ok(Box::new(true)),
            "false" | "0" => Ok(Box::new(false)),
            other => Err(Error::Conversion {
                value: other.to_string(),
                type_name: "bool",
                reason: "expected true, false, 1 or 0".into(),
            }),
        }
    }
}

/// Any term's text: literal lexical form, IRI string or blank label.
pub struct StringConverter;

impl ValueConverter for StringConverter {
    fn convert(&self, term: &Term) -> Result<AnyValue> {
        Ok(Box::new(term.text().to_string()))
    }
}

/// IRI terms as-is; literals must hold a valid IRI.
pub struct IriConverter;

impl ValueConverter for IriConverter {
    fn convert(&self, term: &Term) -> Result<AnyValue> {
        match term {
            Term::Iri(iri) => Ok(Box::new(iri.clone())),
            Term::Literal(lit) => Ok(Box::new(Iri::new(lit.lexical.as_str())?)),
            Term::Blank(b) => Err(Error::Conversion {
                value: b.to_string(),
                type_name: "Iri",
                reason: "blank node is not an IRI".into(),
            }),
        }
    }
}

/// Register converters for every built-in scalar.
pub(crate) fn register_scalars(registry: &mut Registry) {
    registry
        .add_converter::<bool>(BoolConverter)
        .add_converter::<String>(StringConverter)
        .add_converter::<Iri>(IriConverter)
        .add_converter::<char>(FromStrConverter::<char>::new())
        .add_converter::<i8>(FromStrConverter::<i8>::new())
        .add_converter::<i16>(FromStrConverter::<i16>::new())
        .add_converter::<i32>(FromStrConverter::<i32>::new())
        .add_converter::<i64>(FromStrConverter::<i64>::new())
        .add_converter::<i128>(FromStrConverter::<i128>::new())
        .add_converter::<isize>(FromStrConverter::<isize>::new())
        .add_converter::<u8>(FromStrConverter::<u8>::new())
        .add_converter::<u16>(FromStrConverter::<u16>::new())
        .add_converter::<u32>(FromStrConverter::<u32>::new())
        .add_converter::<u64>(FromStrConverter::<u64>::new())
        .add_converter::<u128>(FromStrConverter::<u128>::new())
        .add_converter::<usize>(FromStrConverter::<usize>::new())
        .add_converter::<f32>(FromStrConverter::<f32>::new())
        .add_converter::<f64>(FromStrConverter::<f64>::new());

    #[cfg(feature = "chrono")]
    registry
        .add_converter::<chrono::NaiveDate>(FromStrConverter::<chrono::NaiveDate>::new())
        .add_converter::<chrono::NaiveDateTime>(FromStrConverter::<chrono::NaiveDateTime>::new())
        .add_converter::<chrono::DateTime<chrono::Utc>>(FromStrConverter::<chrono::DateTime<chrono::Utc>>::new());
}
