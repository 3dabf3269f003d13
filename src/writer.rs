//! Object graph → statement model.
//!
//! Statements go straight into the caller's model. A failure partway leaves
//! what was already emitted in place; see
//! [`Mapper::write_staged`](crate::Mapper::write_staged) for all-or-nothing
//! writes.

use std::any::Any;

use crate::analyzer::{Analyzer, PropertyDescriptor, SubjectDescriptor, TypeDescriptor, ValueKind};
use crate::meta::{Reflect, Subject};
use crate::model::vocab::rdf;
use crate::model::{BlankNode, Iri, Literal, Model, Resource, Statement, Term};
use crate::{Error, Result};

/// Recursive writer over a shared [`Analyzer`]. Holds no per-call state.
#[derive(Debug, Clone, Copy)]
pub struct Writer<'a> {
    analyzer: &'a Analyzer,
}

impl<'a> Writer<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self { analyzer }
    }

    /// Emit `instance` rooted at `subject`, which must be a valid IRI or
    /// blank node.
    pub fn write<T: Reflect>(&self, model: &mut Model, instance: &T, subject: &Resource) -> Result<()> {
        subject.validate()?;
        let descriptor = self.analyzer.analyze::<T>()?;
        self.write_value(model, instance, subject, &descriptor)
    }

    pub fn write_value(
        &self,
        model: &mut Model,
        instance: &dyn Any,
        subject: &Resource,
        descriptor: &TypeDescriptor,
    ) -> Result<()> {
        tracing::trace!(type_name = descriptor.name(), %subject, "writing instance");
        let rdf_type = Iri::new_unchecked(rdf::TYPE);

        for emission in &descriptor.types {
            for iri in &emission.iris {
                emit(model, subject, &rdf_type, Term::Iri(iri.clone()));
            }
            let Some(property) = &emission.property else { continue };
            for element in elements(property, instance)?.unwrap_or_default() {
                let iri = Iri::new(lexical(property, element)?)?;
                emit(model, subject, &rdf_type, Term::Iri(iri));
            }
        }

        for property in &descriptor.properties {
            let Some(predicate) = property.predicate() else { continue };
            let Some(values) = elements(property, instance)? else {
                if property.is_required() {
                    return Err(Error::MissingValue {
                        type_name: descriptor.name().to_string(),
                        property: property.name.to_string(),
                    });
                }
                continue;
            };
            for element in values {
                self.write_element(model, property, subject, predicate, element)?;
            }
        }
        Ok(())
    }

    fn write_element(
        &self,
        model: &mut Model,
        property: &PropertyDescriptor,
        subject: &Resource,
        predicate: &Iri,
        element: &dyn Any,
    ) -> Result<()> {
        let object = match &property.value {
            ValueKind::Nested => {
                let nested = self.analyzer.analyze_type(&property.intrinsic)?;
                let target = resolve_subject(&nested, element, subject)?;
                emit(model, subject, predicate, Term::from(target.clone()));
                return self.write_value(model, element, &target, &nested);
            }
            ValueKind::Scalar(_) => {
                let text = lexical(property, element)?;
                match property.datatype() {
                    Some(datatype) if property.is_literal() => Term::Literal(Literal::typed(text, datatype.clone())),
                    _ => Term::Iri(Iri::new(text)?),
                }
            }
        };
        emit(model, subject, predicate, object);
        Ok(())
    }
}

fn emit(model: &mut Model, subject: &Resource, predicate: &Iri, object: Term) {
    let statement = Statement::new(subject.clone(), predicate.clone(), object);
    tracing::trace!(%statement, "emit");
    model.insert(statement);
}

/// A property's present value as a sequence of intrinsic elements, or `None`
/// when the value is absent.
fn elements<'v>(property: &PropertyDescriptor, instance: &'v dyn Any) -> Result<Option<Vec<&'v dyn Any>>> {
    let raw = property
        .access
        .get(instance)
        .ok_or(Error::TypeMismatch { expected: "property owner" })?;

    let (ty, value) = match &property.wrapper {
        Some(wrapper) => match wrapper.unwrap(&property.declared, raw)? {
            None => return Ok(None),
            Some(inner) => {
                let ty = property.declared.args().first().unwrap_or(&property.declared).clone();
                (ty, inner)
            }
        },
        None => (property.declared.clone(), raw),
    };

    if let Some(items) = ty.elements(value) {
        return Ok(Some(items));
    }
    let single = ty.view(value).ok_or(Error::TypeMismatch { expected: ty.name() })?;
    Ok(Some(vec![single]))
}

fn lexical(property: &PropertyDescriptor, element: &dyn Any) -> Result<String> {
    property
        .intrinsic
        .lexical(element)
        .ok_or_else(|| Error::NoTextualForm {
            type_name: property.intrinsic.name().to_string(),
            property: property.name.to_string(),
        })
}

/// Subject identity of a nested instance referenced from `parent`.
fn resolve_subject(nested: &TypeDescriptor, instance: &dyn Any, parent: &Resource) -> Result<Resource> {
    let unresolved = |reason: &'static str| Error::UnresolvedSubject {
        type_name: nested.name().to_string(),
        reason,
    };

    match &nested.subject {
        None => Err(unresolved("no subject declared")),
        Some(SubjectDescriptor::Type(rule)) => {
            if rule.blank_node {
                return Ok(Resource::Blank(BlankNode::fresh()));
            }
            if rule.value.trim().is_empty() {
                return Err(unresolved("subject value is blank"));
            }
            compose(rule, &rule.value, parent).ok_or_else(|| unresolved("relative subject under a blank node"))?
        }
        Some(SubjectDescriptor::Property { rule, property }) => {
            let value = match elements(property, instance)?.and_then(|v| v.into_iter().next()) {
                Some(v) => Some(lexical(property, v)?),
                None => None,
            };
            match (value, rule.blank_node) {
                (Some(label), true) => BlankNode::parse(label).map(Resource::Blank),
                (None, true) => Ok(Resource::Blank(BlankNode::fresh())),
                (Some(value), false) => {
                    compose(rule, &value, parent).ok_or_else(|| unresolved("relative subject under a blank node"))?
                }
                (None, false) => Err(unresolved("subject property has no value")),
            }
        }
    }
}

/// `value` as an IRI, prefixed with `parent + separator` for relative rules.
/// `None` when a relative rule meets a blank-node parent.
fn compose(rule: &Subject, value: &str, parent: &Resource) -> Option<Result<Resource>> {
    let iri = if rule.relative {
        match parent {
            Resource::Iri(parent) => format!("{}{}{}", parent.as_str(), rule.separator, value),
            Resource::Blank(_) => return None,
        }
    } else {
        value.to_string()
    };
    Some(Iri::new(iri).map(Resource::Iri))
}
