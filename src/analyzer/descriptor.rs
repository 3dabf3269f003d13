//! Analysis results: what the reader and writer need to know about a type.

use std::fmt;
use std::sync::Arc;

use crate::meta::{
    Access, Attribute, ParentDef, Predicate, Projected, ProjectedMutate, Subject, TypeDef, TypeRef,
};
use crate::model::Iri;
use crate::spi::{
    InstanceStrategy, InstanceStrategyFactory, MultiplicityFactory, Mutation, ValueConverter,
    WrapperHandler,
};
use crate::{Error, Result};

/// How a property's values are produced from / turned into object terms.
#[derive(Clone)]
pub enum ValueKind {
    /// The intrinsic type is itself mapped: objects are subjects.
    Nested,
    /// The intrinsic type is a scalar converted by this converter.
    Scalar(Arc<dyn ValueConverter>),
}

/// One mapped property, fully resolved.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub declared: TypeRef,
    pub intrinsic: TypeRef,
    pub access: Arc<dyn Access>,
    pub mutation: Mutation,
    pub wrapper: Option<Arc<dyn WrapperHandler>>,
    pub multiplicity: Arc<dyn MultiplicityFactory>,
    pub value: ValueKind,
    pub attribute: Attribute,
    predicate: Option<Iri>,
    datatype: Option<Iri>,
}

impl PropertyDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'static str,
        declared: TypeRef,
        intrinsic: TypeRef,
        access: Arc<dyn Access>,
        mutation: Mutation,
        wrapper: Option<Arc<dyn WrapperHandler>>,
        multiplicity: Arc<dyn MultiplicityFactory>,
        value: ValueKind,
        attribute: Attribute,
    ) -> Result<Self> {
        let (predicate, datatype) = match &attribute {
            Attribute::Predicate(p) => {
                let datatype = if p.literal { Some(Iri::new(p.datatype.as_str())?) } else { None };
                (Some(Iri::new(p.iri.as_str())?), datatype)
            }
            _ => (None, None),
        };
        Ok(Self {
            name,
            declared,
            intrinsic,
            access,
            mutation,
            wrapper,
            multiplicity,
            value,
            attribute,
            predicate,
            datatype,
        })
    }

    /// The same property reached through an embedding child.
    pub(crate) fn rebased(&self, parent: &ParentDef) -> Self {
        let mut copy = self.clone();
        copy.access = Arc::new(Projected::new(parent.access.clone(), self.access.clone()));
        if let Mutation::Setter(inner) = &self.mutation {
            copy.mutation = Mutation::Setter(Arc::new(ProjectedMutate::new(
                parent.access_mut.clone(),
                inner.clone(),
            )));
        }
        copy
    }

    pub fn predicate(&self) -> Option<&Iri> {
        self.predicate.as_ref()
    }

    /// Literal datatype. `None` unless the property is literal-valued.
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    fn predicate_meta(&self) -> Option<&Predicate> {
        self.attribute.as_predicate()
    }

    pub fn is_required(&self) -> bool {
        self.predicate_meta().is_some_and(|p| p.required)
    }

    pub fn is_readonly(&self) -> bool {
        self.predicate_meta().is_some_and(|p| p.readonly)
    }

    pub fn is_literal(&self) -> bool {
        self.predicate_meta().is_some_and(|p| p.literal)
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.value, ValueKind::Nested)
    }

    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        match &self.value {
            ValueKind::Scalar(converter) => Some(converter),
            ValueKind::Nested => None,
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("intrinsic", &self.intrinsic)
            .field("predicate", &self.predicate)
            .field("datatype", &self.datatype)
            .field("nested", &self.is_nested())
            .field("mutation", &self.mutation)
            .field("multiplicity", &self.multiplicity.name())
            .field("attribute", &self.attribute)
            .finish()
    }
}

/// How a type's instances obtain their own subject when nested.
#[derive(Debug, Clone)]
pub enum SubjectDescriptor {
    /// Declared on the type.
    Type(Subject),
    /// Carried by a property of the instance.
    Property {
        rule: Subject,
        property: Arc<PropertyDescriptor>,
    },
}

impl SubjectDescriptor {
    pub fn rule(&self) -> &Subject {
        match self {
            SubjectDescriptor::Type(rule) => rule,
            SubjectDescriptor::Property { rule, .. } => rule,
        }
    }

    fn rebased(&self, parent: &ParentDef) -> Self {
        match self {
            SubjectDescriptor::Type(rule) => SubjectDescriptor::Type(rule.clone()),
            SubjectDescriptor::Property { rule, property } => SubjectDescriptor::Property {
                rule: rule.clone(),
                property: Arc::new(property.rebased(parent)),
            },
        }
    }
}

/// One `rdf:type` declaration: fixed IRIs, plus optionally a property whose
/// elements are emitted as further types.
#[derive(Debug, Clone)]
pub struct TypeEmission {
    pub iris: Vec<Iri>,
    pub property: Option<Arc<PropertyDescriptor>>,
}

impl TypeEmission {
    fn rebased(&self, parent: &ParentDef) -> Self {
        Self {
            iris: self.iris.clone(),
            property: self.property.as_ref().map(|p| Arc::new(p.rebased(parent))),
        }
    }
}

/// Everything the codecs need about one mapped type. Immutable once cached.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub type_ref: TypeRef,
    pub definition: Arc<TypeDef>,
    pub subject: Option<SubjectDescriptor>,
    pub types: Vec<TypeEmission>,
    pub properties: Vec<Arc<PropertyDescriptor>>,
    pub factory: Option<Arc<dyn InstanceStrategyFactory>>,
}

impl TypeDescriptor {
    pub(crate) fn empty(type_ref: TypeRef, definition: Arc<TypeDef>) -> Self {
        Self {
            type_ref,
            definition,
            subject: None,
            types: Vec::new(),
            properties: Vec::new(),
            factory: None,
        }
    }

    /// Copy of an ancestor's descriptor re-based onto `type_ref`.
    pub(crate) fn inherit(
        parent: &TypeDescriptor,
        projection: &ParentDef,
        type_ref: TypeRef,
        definition: Arc<TypeDef>,
    ) -> Self {
        Self {
            type_ref,
            definition,
            subject: parent.subject.as_ref().map(|s| s.rebased(projection)),
            types: parent.types.iter().map(|t| t.rebased(projection)).collect(),
            properties: parent
                .properties
                .iter()
                .map(|p| Arc::new(p.rebased(projection)))
                .collect(),
            factory: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.type_ref.name()
    }

    /// All fixed `rdf:type` IRIs, in declaration order.
    pub fn fixed_types(&self) -> impl Iterator<Item = &Iri> {
        self.types.iter().flat_map(|t| t.iris.iter())
    }

    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDescriptor>> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Start a fresh construction for one instance.
    pub fn instantiate(&self) -> Result<Box<dyn InstanceStrategy>> {
        let factory = self.factory.as_ref().ok_or_else(|| Error::NoInstanceStrategy {
            type_name: self.name().to_string(),
        })?;
        factory.create(&self.definition)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.type_ref)
            .field("subject", &self.subject)
            .field("types", &self.types)
            .field("properties", &self.properties)
            .field("factory", &self.factory.as_ref().map(|x| x.name()))
            .finish()
    }
}
