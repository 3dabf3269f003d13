//! RDF terms: IRIs, blank nodes and literals.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::vocab::{rdf, xsd};
use crate::{Error, Result};

/// Process-wide counter backing [`BlankNode::fresh`].
static NEXT_BLANK: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Iri
// ============================================================================

/// An absolute or relative IRI reference.
///
/// Validation is deliberately shallow: the string must be non-empty and must
/// not contain characters N-Triples forbids inside `<...>`. Deserialization
/// goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(String);

impl Iri {
    /// Validate and wrap an IRI string.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::InvalidIri { iri: value, reason: "empty" });
        }
        if let Some(c) = value.chars().find(|c| Self::is_forbidden(*c)) {
            let reason = if c.is_whitespace() { "contains whitespace" } else { "contains a forbidden character" };
            return Err(Error::InvalidIri { iri: value, reason });
        }
        Ok(Self(value))
    }

    /// Wrap a string that is known to be a valid IRI (vocabulary constants).
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn is_forbidden(c: char) -> bool {
        c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Iri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Iri::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.0
    }
}

// ============================================================================
// BlankNode
// ============================================================================

/// A locally scoped anonymous node, identified by its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlankNode(String);

impl BlankNode {
    /// Wrap a label without checking it.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Validate a label against the N-Triples blank node grammar: letters,
    /// digits, `_`, `-` and `.`, never starting or ending with `.`.
    pub fn parse(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let reason = if label.is_empty() {
            "empty"
        } else if !label.chars().all(Self::is_label_char) {
            "contains a character not allowed in a label"
        } else if label.starts_with('.') || label.ends_with('.') {
            "starts or ends with '.'"
        } else {
            return Ok(Self(label));
        };
        Err(Error::InvalidBlankNode { label, reason })
    }

    /// Allocate a blank node with a label not handed out before in this process.
    pub fn fresh() -> Self {
        let id = NEXT_BLANK.fetch_add(1, Ordering::Relaxed);
        Self(format!("b{id}"))
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_label_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
    }
}

impl TryFrom<String> for BlankNode {
    type Error = Error;

    fn try_from(label: String) -> Result<Self> {
        BlankNode::parse(label)
    }
}

impl From<BlankNode> for String {
    fn from(node: BlankNode) -> Self {
        node.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

// ============================================================================
// Literal
// ============================================================================

/// A typed literal: lexical form plus datatype IRI, with an optional
/// language tag for `rdf:langString` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Iri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Literal {
    pub fn typed(lexical: impl Into<String>, datatype: Iri) -> Self {
        Self { lexical: lexical.into(), datatype, language: None }
    }

    /// An `xsd:string` literal.
    pub fn string(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, Iri::new_unchecked(xsd::STRING))
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Iri::new_unchecked(rdf::LANG_STRING),
            language: Some(language.into()),
        }
    }
}

// ============================================================================
// Resource (subject position)
// ============================================================================

/// Anything that can stand in subject position: an IRI or a blank node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Resource {
    Iri(Iri),
    Blank(BlankNode),
}

impl Resource {
    /// The identity as plain text: the IRI string or the bare blank label.
    pub fn identity(&self) -> &str {
        match self {
            Resource::Iri(iri) => iri.as_str(),
            Resource::Blank(b) => b.label(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Resource::Blank(_))
    }

    /// Check the identity the way a parser would. Conversions from strings
    /// do not, so callers validate at the entry points.
    pub fn validate(&self) -> Result<()> {
        match self {
            Resource::Iri(iri) => Iri::new(iri.as_str()).map(drop),
            Resource::Blank(b) => BlankNode::parse(b.label()).map(drop),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(iri) => write!(f, "<{iri}>"),
            Resource::Blank(b) => write!(f, "{b}"),
        }
    }
}

impl From<Iri> for Resource {
    fn from(v: Iri) -> Self { Resource::Iri(v) }
}
impl From<BlankNode> for Resource {
    fn from(v: BlankNode) -> Self { Resource::Blank(v) }
}
/// Strings starting with `_:` become blank nodes, everything else an IRI.
impl From<&str> for Resource {
    fn from(v: &str) -> Self {
        match v.strip_prefix("_:") {
            Some(label) => Resource::Blank(BlankNode::new(label)),
            None => Resource::Iri(Iri::new_unchecked(v)),
        }
    }
}
impl From<String> for Resource {
    fn from(v: String) -> Self { Resource::from(v.as_str()) }
}

// ============================================================================
// Term (object position)
// ============================================================================

/// Anything that can stand in object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Term::Iri(_) => "IRI",
            Term::Blank(_) => "BLANK_NODE",
            Term::Literal(_) => "LITERAL",
        }
    }

    /// The textual payload: IRI string, blank label, or literal lexical form.
    pub fn text(&self) -> &str {
        match self {
            Term::Iri(iri) => iri.as_str(),
            Term::Blank(b) => b.label(),
            Term::Literal(l) => &l.lexical,
        }
    }

    /// The term as a subject, if it can be one.
    pub fn as_resource(&self) -> Option<Resource> {
        match self {
            Term::Iri(iri) => Some(Resource::Iri(iri.clone())),
            Term::Blank(b) => Some(Resource::Blank(b.clone())),
            Term::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl From<Resource> for Term {
    fn from(v: Resource) -> Self {
        match v {
            Resource::Iri(iri) => Term::Iri(iri),
            Resource::Blank(b) => Term::Blank(b),
        }
    }
}
impl From<Iri> for Term {
    fn from(v: Iri) -> Self { Term::Iri(v) }
}
impl From<Literal> for Term {
    fn from(v: Literal) -> Self { Term::Literal(v) }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(b) => write!(f, "{b}"),
            Term::Literal(l) => match &l.language {
                Some(lang) => write!(f, "{:?}@{lang}", l.lexical),
                None => write!(f, "{:?}^^<{}>", l.lexical, l.datatype),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_validation() {
        assert!(Iri::new("http://example.com/a").is_ok());
        assert!(matches!(Iri::new(""), Err(Error::InvalidIri { .. })));
        assert!(matches!(Iri::new("http://example.com/a b"), Err(Error::InvalidIri { .. })));
        assert!(matches!(Iri::new("http://example.com/<a>"), Err(Error::InvalidIri { .. })));
    }

    #[test]
    fn test_resource_from_str() {
        assert_eq!(Resource::from("_:x"), Resource::Blank(BlankNode::new("x")));
        assert_eq!(
            Resource::from("http://example.com/p1"),
            Resource::Iri(Iri::new_unchecked("http://example.com/p1"))
        );
    }

    #[test]
    fn test_resource_validation() {
        assert!(Resource::from("http://example.com/p1").validate().is_ok());
        assert!(Resource::from("_:b.2").validate().is_ok());
        assert!(matches!(
            Resource::from("http://example.com/a b").validate(),
            Err(Error::InvalidIri { reason: "contains whitespace", .. })
        ));
        assert!(matches!(Resource::from("_:a b").validate(), Err(Error::InvalidBlankNode { .. })));
        assert!(matches!(Resource::from("_:").validate(), Err(Error::InvalidBlankNode { reason: "empty", .. })));
        assert!(matches!(BlankNode::parse("tail."), Err(Error::InvalidBlankNode { .. })));
    }

    #[test]
    fn test_deserialize_validates() {
        let iri: Iri = serde_json::from_str("\"http://example.com/ok\"").unwrap();
        assert_eq!(iri.as_str(), "http://example.com/ok");
        assert!(serde_json::from_str::<Iri>("\"http://example.com/a b\"").is_err());
        assert!(serde_json::from_str::<BlankNode>("\"a b\"").is_err());
        assert_eq!(serde_json::to_string(&iri).unwrap(), "\"http://example.com/ok\"");
    }

    #[test]
    fn test_fresh_blank_nodes_are_distinct() {
        assert_ne!(BlankNode::fresh(), BlankNode::fresh());
    }

    #[test]
    fn test_term_text() {
        assert_eq!(Term::Literal(Literal::string("foo")).text(), "foo");
        assert_eq!(Term::Blank(BlankNode::new("b7")).text(), "b7");
        assert!(Term::Literal(Literal::string("foo")).as_resource().is_none());
    }
}
