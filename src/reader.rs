//! Statement model → object graph.
//!
//! ## Rules
//!
//! - A subject with no statements reads as absent (`None`), not an error.
//! - A property with no objects fails only if it is required and not
//!   readonly; a readonly property with objects always fails.
//! - Nested objects are read recursively as subjects. A reference to a
//!   subject without statements is dropped; cardinality is checked against
//!   the raw object count before that.
//! - A subject met again while it is still being read fails with
//!   `CyclicReference`; owned instances cannot hold the cycle.

use crate::analyzer::{Analyzer, PropertyDescriptor, SubjectDescriptor, TypeDescriptor, ValueKind};
use crate::meta::{AnyValue, Reflect, Subject, TypeRef};
use crate::model::vocab::rdf;
use crate::model::{Iri, Literal, Model, Resource, Term};
use crate::{Error, Result};

/// Recursive reader over a shared [`Analyzer`]. Holds no per-call state.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    analyzer: &'a Analyzer,
}

impl<'a> Reader<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self { analyzer }
    }

    /// Materialize `subject` as a `T`.
    pub fn read<T: Reflect>(&self, model: &Model, subject: &Resource) -> Result<Option<T>> {
        self.read_value(model, &T::type_ref(), subject, None)?
            .map(T::adopt)
            .transpose()
    }

    /// Materialize `subject` as a value of `ty`. `parent` is the subject that
    /// referenced it, if any; relative identities are resolved against it.
    pub fn read_value(
        &self,
        model: &Model,
        ty: &TypeRef,
        subject: &Resource,
        parent: Option<&Resource>,
    ) -> Result<Option<AnyValue>> {
        subject.validate()?;
        let mut path = Vec::new();
        self.read_in(model, ty, subject, parent, &mut path)
    }

    /// `path` holds the subjects currently being materialized; meeting one
    /// of them again is a cycle.
    fn read_in(
        &self,
        model: &Model,
        ty: &TypeRef,
        subject: &Resource,
        parent: Option<&Resource>,
        path: &mut Vec<Resource>,
    ) -> Result<Option<AnyValue>> {
        if !model.contains_subject(subject) {
            return Ok(None);
        }
        if path.contains(subject) {
            return Err(Error::CyclicReference { subject: subject.to_string() });
        }
        path.push(subject.clone());
        let read = self.populate(model, ty, subject, parent, path);
        path.pop();
        read.map(Some)
    }

    fn populate(
        &self,
        model: &Model,
        ty: &TypeRef,
        subject: &Resource,
        parent: Option<&Resource>,
        path: &mut Vec<Resource>,
    ) -> Result<AnyValue> {
        let descriptor = self.analyzer.analyze_type(ty)?;
        let mut instance = descriptor.instantiate()?;
        tracing::trace!(type_name = descriptor.name(), %subject, "reading instance");

        if let Some(SubjectDescriptor::Property { rule, property }) = &descriptor.subject {
            if let Some(value) = self.identity(model, rule, property, subject, parent, path)? {
                instance.add(property, value)?;
            }
        }

        for emission in &descriptor.types {
            let Some(property) = &emission.property else { continue };
            let extra = extra_types(model, subject, &descriptor);
            if extra.is_empty() {
                continue;
            }
            if let Some(value) = self.build(model, property, subject, &extra, path)? {
                instance.add(property, value)?;
            }
        }

        for property in &descriptor.properties {
            let Some(predicate) = property.predicate() else { continue };
            let objects = model.objects(subject, predicate);

            if objects.is_empty() {
                if property.is_required() && !property.is_readonly() {
                    return Err(Error::MissingRequired {
                        type_name: descriptor.name().to_string(),
                        property: property.name.to_string(),
                    });
                }
                continue;
            }
            if property.is_readonly() {
                return Err(Error::ReadonlyPopulated {
                    type_name: descriptor.name().to_string(),
                    property: property.name.to_string(),
                });
            }

            if let Some(value) = self.build(model, property, subject, &objects, path)? {
                instance.add(property, value)?;
            }
        }

        instance.finish()
    }

    /// The value for a subject property. Skipped when a relative identity
    /// cannot be stripped or the identity does not convert.
    fn identity(
        &self,
        model: &Model,
        rule: &Subject,
        property: &PropertyDescriptor,
        subject: &Resource,
        parent: Option<&Resource>,
        path: &mut Vec<Resource>,
    ) -> Result<Option<AnyValue>> {
        let Some(identity) = identity_term(rule, subject, parent) else {
            tracing::trace!(property = property.name, %subject, "no parent to strip relative identity against");
            return Ok(None);
        };
        match self.build(model, property, subject, &[&identity], path) {
            Err(Error::Conversion { value, type_name, .. }) => {
                tracing::debug!(property = property.name, %value, type_name, "identity does not fit subject property");
                Ok(None)
            }
            other => other,
        }
    }

    /// Fold the objects of one property into its declared shape.
    fn build(
        &self,
        model: &Model,
        property: &PropertyDescriptor,
        subject: &Resource,
        objects: &[&Term],
        path: &mut Vec<Resource>,
    ) -> Result<Option<AnyValue>> {
        let mut strategy = property.multiplicity.create(property, objects.len())?;

        for object in objects {
            match &property.value {
                ValueKind::Scalar(converter) => strategy.add(converter.convert(object)?)?,
                ValueKind::Nested => {
                    let nested = object.as_resource().ok_or_else(|| Error::UnexpectedTerm {
                        property: property.name.to_string(),
                        expected: "IRI or blank node",
                        found: object.kind_name(),
                    })?;
                    match self.read_in(model, &property.intrinsic, &nested, Some(subject), path)? {
                        Some(value) => strategy.add(value)?,
                        None => tracing::debug!(
                            property = property.name,
                            reference = %nested,
                            "dropping dangling nested reference"
                        ),
                    }
                }
            }
        }
        strategy.finish()
    }
}

/// The subject identity as the term handed to a subject property, with the
/// relative prefix removed. `None` for a relative rule whose prefix is not
/// there to remove, as on a root read.
fn identity_term(rule: &Subject, subject: &Resource, parent: Option<&Resource>) -> Option<Term> {
    if !rule.relative {
        return Some(Term::from(subject.clone()));
    }
    match (subject, parent) {
        (Resource::Iri(iri), Some(Resource::Iri(parent))) => {
            let prefix = format!("{}{}", parent.as_str(), rule.separator);
            let suffix = iri.as_str().strip_prefix(prefix.as_str())?;
            Some(Term::Literal(Literal::string(suffix)))
        }
        // Blank-node identities carry no prefix.
        (Resource::Blank(_), _) => Some(Term::from(subject.clone())),
        _ => None,
    }
}

/// `rdf:type` objects of `subject` that the type does not emit itself.
fn extra_types<'m>(model: &'m Model, subject: &Resource, descriptor: &TypeDescriptor) -> Vec<&'m Term> {
    let rdf_type = Iri::new_unchecked(rdf::TYPE);
    model
        .objects(subject, &rdf_type)
        .into_iter()
        .filter(|term| match term {
            Term::Iri(iri) => !descriptor.fixed_types().any(|fixed| fixed == iri),
            _ => true,
        })
        .collect()
}
