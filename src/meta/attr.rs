//! Mapping metadata attached to entity fields and types.
//!
//! | attribute | on | meaning |
//! |---|---|---|
//! | [`Predicate`] | field | statement predicate + required / readonly / literal / datatype flags |
//! | [`Subject`] | type or field | how a nested instance gets its own subject identity |
//! | [`SemanticType`] | type or field | fixed `rdf:type` IRIs, or a field yielding them |

use crate::model::vocab::xsd;

/// Metadata of a predicate-mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub iri: String,
    pub required: bool,
    pub readonly: bool,
    pub literal: bool,
    pub datatype: String,
}

impl Predicate {
    /// A required, writable, IRI-valued predicate.
    pub fn new(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            required: true,
            readonly: false,
            literal: false,
            datatype: xsd::STRING.to_string(),
        }
    }

    /// Objects are literals (of `xsd:string` unless [`Predicate::datatype`] says otherwise).
    pub fn literal(mut self) -> Self {
        self.literal = true;
        self
    }

    /// Literal datatype. Implies [`Predicate::literal`].
    pub fn datatype(mut self, datatype: impl Into<String>) -> Self {
        self.literal = true;
        self.datatype = datatype.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Never populated on read, still emitted on write.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Subject identity rule.
///
/// On a type: `value` is the IRI (or, with `relative`, the suffix appended
/// to `parent + separator`). On a field: the field's value is the identity
/// and `value` is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub value: String,
    pub relative: bool,
    pub separator: char,
    pub blank_node: bool,
}

impl Default for Subject {
    fn default() -> Self {
        Self {
            value: String::new(),
            relative: false,
            separator: '/',
            blank_node: false,
        }
    }
}

impl Subject {
    /// Field-level subject: the annotated field holds the identity.
    pub fn property() -> Self {
        Self::default()
    }

    /// A fixed absolute IRI.
    pub fn absolute(iri: impl Into<String>) -> Self {
        Self { value: iri.into(), ..Self::default() }
    }

    /// A suffix appended to the enclosing subject.
    pub fn relative(suffix: impl Into<String>) -> Self {
        Self { value: suffix.into(), relative: true, ..Self::default() }
    }

    /// Always a fresh blank node.
    pub fn blank() -> Self {
        Self { blank_node: true, ..Self::default() }
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn blank_node(mut self) -> Self {
        self.blank_node = true;
        self
    }

    pub fn make_relative(mut self) -> Self {
        self.relative = true;
        self
    }
}

/// `rdf:type` emission. On a field, `iris` is usually empty and the field's
/// elements are emitted as additional type IRIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticType {
    pub iris: Vec<String>,
}

impl SemanticType {
    pub fn new<I, S>(iris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { iris: iris.into_iter().map(Into::into).collect() }
    }

    /// Types come from the annotated field only.
    pub fn dynamic() -> Self {
        Self::default()
    }
}

/// Metadata facet a property was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Predicate,
    Subject,
    Type,
}

/// The one attribute a field carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Predicate(Predicate),
    Subject(Subject),
    Type(SemanticType),
}

impl Attribute {
    pub fn facet(&self) -> Facet {
        match self {
            Attribute::Predicate(_) => Facet::Predicate,
            Attribute::Subject(_) => Facet::Subject,
            Attribute::Type(_) => Facet::Type,
        }
    }

    pub fn as_predicate(&self) -> Option<&Predicate> {
        match self {
            Attribute::Predicate(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_subject(&self) -> Option<&Subject> {
        match self {
            Attribute::Subject(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&SemanticType> {
        match self {
            Attribute::Type(t) => Some(t),
            _ => None,
        }
    }
}
