//! Turtle output, grouped by subject with prefix compaction.
//!
//! ```text
//! @prefix ex: <http://example.com/> .
//!
//! ex:p1 ex:x "3"^^xsd:int ;
//!     ex:y "4"^^xsd:int .
//! ```
//!
//! Only the model's own namespace prefixes are used. Parsing Turtle is not
//! supported.

use std::io::Write;

use super::ntriples::escape_string;
use crate::Result;
use crate::model::vocab::{rdf, xsd};
use crate::model::{Iri, Model, Resource, Term};

/// Write `model` as Turtle.
pub fn write(model: &Model, out: &mut dyn Write) -> Result<()> {
    let prefixes: Vec<(&str, &Iri)> = model.namespaces().collect();
    for (prefix, ns) in &prefixes {
        writeln!(out, "@prefix {prefix}: <{ns}> .")?;
    }
    if !prefixes.is_empty() && !model.is_empty() {
        writeln!(out)?;
    }

    let compact = Compactor { prefixes: &prefixes };
    for subject in model.subjects() {
        let mut first = true;
        for statement in model.about(subject) {
            if first {
                write!(out, "{} ", compact.resource(subject))?;
                first = false;
            } else {
                write!(out, " ;\n    ")?;
            }
            write!(out, "{} {}", compact.predicate(&statement.predicate), compact.term(&statement.object))?;
        }
        writeln!(out, " .")?;
    }
    Ok(())
}

struct Compactor<'p> {
    prefixes: &'p [(&'p str, &'p Iri)],
}

impl Compactor<'_> {
    fn iri(&self, iri: &Iri) -> String {
        let value = iri.as_str();
        for (prefix, ns) in self.prefixes {
            if let Some(local) = value.strip_prefix(ns.as_str()) {
                if is_local_name(local) {
                    return format!("{prefix}:{local}");
                }
            }
        }
        format!("<{value}>")
    }

    fn resource(&self, value: &Resource) -> String {
        match value {
            Resource::Iri(iri) => self.iri(iri),
            Resource::Blank(b) => format!("_:{}", b.label()),
        }
    }

    fn predicate(&self, iri: &Iri) -> String {
        if iri.as_str() == rdf::TYPE {
            "a".to_string()
        } else {
            self.iri(iri)
        }
    }

    fn term(&self, value: &Term) -> String {
        match value {
            Term::Iri(iri) => self.iri(iri),
            Term::Blank(b) => format!("_:{}", b.label()),
            Term::Literal(lit) => {
                let quoted = format!("\"{}\"", escape_string(&lit.lexical));
                match &lit.language {
                    Some(lang) => format!("{quoted}@{lang}"),
                    None if lit.datatype.as_str() == xsd::STRING => quoted,
                    None => format!("{quoted}^^{}", self.iri(&lit.datatype)),
                }
            }
        }
    }
}

/// Conservative subset of Turtle's `PN_LOCAL`.
fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_alphanumeric() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Literal;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compacts_with_prefixes() {
        let mut model = Model::new();
        model.set_namespace("ex", Iri::new_unchecked("http://example.com/"));
        model.set_namespace("xsd", Iri::new_unchecked(xsd::NS));
        let p1 = Resource::from("http://example.com/p1");
        model.add(p1.clone(), Iri::new_unchecked("http://example.com/x"), Literal::typed("3", Iri::new_unchecked(xsd::INT)));
        model.add(p1.clone(), Iri::new_unchecked("http://example.com/y"), Literal::typed("4", Iri::new_unchecked(xsd::INT)));
        model.add(p1, Iri::new_unchecked(rdf::TYPE), Iri::new_unchecked("http://example.com/Point"));

        let mut out = Vec::new();
        write(&model, &mut out).unwrap();
        let expected = "\
@prefix ex: <http://example.com/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:p1 ex:x \"3\"^^xsd:int ;
    ex:y \"4\"^^xsd:int ;
    a ex:Point .
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_uncompactable_iri_kept_whole() {
        let mut model = Model::new();
        model.set_namespace("ex", Iri::new_unchecked("http://example.com/"));
        model.add(
            Resource::from("http://example.com/p1/c"),
            Iri::new_unchecked("http://example.com/v"),
            Literal::string("x"),
        );
        let mut out = Vec::new();
        write(&model, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<http://example.com/p1/c> ex:v \"x\" ."));
    }
}
