//! In-memory statement store.
//!
//! `Model` is the reference statement collection the reader queries and the
//! writer fills. Statements are kept in insertion order (serializers walk
//! them as written) and indexed by subject.
//!
//! ## Limitations
//!
//! - **Set semantics**: inserting a statement that is already present is a
//!   no-op, so object cardinality counts distinct objects.
//! - **No locking**: a `Model` is a plain value. Share it behind `&` for
//!   concurrent reads; writers need exclusive access.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Iri, Resource, Statement, Term};

/// Indices into `Model::statements` for one subject.
type Positions = SmallVec<[usize; 8]>;

/// A collection of statements plus the namespace prefixes used to print them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ModelDoc", into = "ModelDoc")]
pub struct Model {
    statements: Vec<Statement>,
    seen: HashSet<Statement>,
    by_subject: HashMap<Resource, Positions>,
    namespaces: BTreeMap<String, Iri>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statement. Returns false if it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        if self.seen.contains(&statement) {
            return false;
        }
        let position = self.statements.len();
        self.by_subject
            .entry(statement.subject.clone())
            .or_default()
            .push(position);
        self.seen.insert(statement.clone());
        self.statements.push(statement);
        true
    }

    pub fn add(&mut self, subject: impl Into<Resource>, predicate: Iri, object: impl Into<Term>) -> bool {
        self.insert(Statement::new(subject, predicate, object))
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.seen.contains(statement)
    }

    /// True if any statement has `subject` in subject position.
    pub fn contains_subject(&self, subject: &Resource) -> bool {
        self.by_subject.contains_key(subject)
    }

    /// All objects of `(subject, predicate, ?)`, in insertion order.
    pub fn objects(&self, subject: &Resource, predicate: &Iri) -> Vec<&Term> {
        self.about(subject)
            .filter(|st| &st.predicate == predicate)
            .map(|st| &st.object)
            .collect()
    }

    /// All statements with `subject` in subject position.
    pub fn about<'a>(&'a self, subject: &Resource) -> impl Iterator<Item = &'a Statement> + use<'a> {
        let positions: &[usize] = self
            .by_subject
            .get(subject)
            .map(|p| p.as_slice())
            .unwrap_or(&[]);
        positions.iter().map(move |&i| &self.statements[i])
    }

    /// Distinct subjects in first-seen order.
    pub fn subjects(&self) -> Vec<&Resource> {
        let mut out: Vec<&Resource> = Vec::new();
        let mut seen = HashSet::new();
        for st in &self.statements {
            if seen.insert(&st.subject) {
                out.push(&st.subject);
            }
        }
        out
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Move every statement and namespace of `other` into `self`.
    pub fn merge(&mut self, other: Model) {
        for (prefix, ns) in other.namespaces {
            self.namespaces.entry(prefix).or_insert(ns);
        }
        for st in other.statements {
            self.insert(st);
        }
    }

    // ========================================================================
    // Namespaces
    // ========================================================================

    pub fn set_namespace(&mut self, prefix: impl Into<String>, namespace: Iri) {
        self.namespaces.insert(prefix.into(), namespace);
    }

    pub fn namespace(&self, prefix: &str) -> Option<&Iri> {
        self.namespaces.get(prefix)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &Iri)> {
        self.namespaces.iter().map(|(p, ns)| (p.as_str(), ns))
    }
}

/// Models are equal when they hold the same statement set and prefixes.
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen && self.namespaces == other.namespaces
    }
}

impl Eq for Model {}

impl Extend<Statement> for Model {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        for st in iter {
            self.insert(st);
        }
    }
}

impl FromIterator<Statement> for Model {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut model = Model::new();
        model.extend(iter);
        model
    }
}

impl<'a> IntoIterator for &'a Model {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

// ============================================================================
// Serde representation
// ============================================================================

/// Wire shape of a `Model`: indexes are rebuilt on deserialization.
#[derive(Serialize, Deserialize)]
struct ModelDoc {
    #[serde(default)]
    namespaces: BTreeMap<String, Iri>,
    statements: Vec<Statement>,
}

impl From<ModelDoc> for Model {
    fn from(doc: ModelDoc) -> Self {
        let mut model: Model = doc.statements.into_iter().collect();
        model.namespaces = doc.namespaces;
        model
    }
}

impl From<Model> for ModelDoc {
    fn from(model: Model) -> Self {
        ModelDoc {
            namespaces: model.namespaces,
            statements: model.statements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Literal;

    fn iri(s: &str) -> Iri {
        Iri::new_unchecked(s)
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut model = Model::new();
        assert!(model.add(iri("http://ex/s"), iri("http://ex/p"), Literal::string("o")));
        assert!(!model.add(iri("http://ex/s"), iri("http://ex/p"), Literal::string("o")));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_objects_by_subject_and_predicate() {
        let mut model = Model::new();
        let s = Resource::Iri(iri("http://ex/s"));
        model.add(s.clone(), iri("http://ex/p"), Literal::string("a"));
        model.add(s.clone(), iri("http://ex/p"), Literal::string("b"));
        model.add(s.clone(), iri("http://ex/q"), Literal::string("c"));
        model.add(iri("http://ex/other"), iri("http://ex/p"), Literal::string("d"));

        let objects: Vec<&str> = model.objects(&s, &iri("http://ex/p")).iter().map(|t| t.text()).collect();
        assert_eq!(objects, vec!["a", "b"]);
        assert!(model.contains_subject(&s));
        assert!(!model.contains_subject(&Resource::Iri(iri("http://ex/nobody"))));
    }

    #[test]
    fn test_merge_keeps_existing_prefix() {
        let mut a = Model::new();
        a.set_namespace("ex", iri("http://ex/"));
        let mut b = Model::new();
        b.set_namespace("ex", iri("http://other/"));
        b.add(iri("http://ex/s"), iri("http://ex/p"), iri("http://ex/o"));
        a.merge(b);
        assert_eq!(a.namespace("ex"), Some(&iri("http://ex/")));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let mut model = Model::new();
        model.set_namespace("ex", iri("http://ex/"));
        model.add(iri("http://ex/s"), iri("http://ex/p"), Literal::string("o"));
        let json = serde_json::to_string(&model).unwrap();
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
        assert!(back.contains_subject(&Resource::Iri(iri("http://ex/s"))));
    }
}
