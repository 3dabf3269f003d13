//! # Byte-level Formats
//!
//! | Format | Parse | Serialize |
//! |--------|-------|-----------|
//! | [`RdfFormat::NTriples`] | yes | yes |
//! | [`RdfFormat::Turtle`] | no | yes |
//! | [`RdfFormat::Json`] | yes | yes |
//!
//! JSON is the serde form of [`Model`]: namespaces plus the statement list.

pub mod ntriples;
pub mod turtle;

use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RdfFormat {
    NTriples,
    Turtle,
    Json,
}

impl RdfFormat {
    pub fn name(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "N-Triples",
            RdfFormat::Turtle => "Turtle",
            RdfFormat::Json => "JSON",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "nt",
            RdfFormat::Turtle => "ttl",
            RdfFormat::Json => "json",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "nt" => Some(RdfFormat::NTriples),
            "ttl" => Some(RdfFormat::Turtle),
            "json" => Some(RdfFormat::Json),
            _ => None,
        }
    }

    pub fn can_parse(self) -> bool {
        !matches!(self, RdfFormat::Turtle)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read a whole document into a model.
pub fn parse(source: &mut dyn Read, format: RdfFormat) -> Result<Model> {
    let mut text = String::new();
    source.read_to_string(&mut text)?;
    parse_str(&text, format)
}

pub fn parse_str(text: &str, format: RdfFormat) -> Result<Model> {
    let model = match format {
        RdfFormat::NTriples => ntriples::parse(text)?,
        RdfFormat::Json => serde_json::from_str(text).map_err(|e| Error::Syntax {
            line: e.line(),
            message: e.to_string(),
        })?,
        RdfFormat::Turtle => {
            return Err(Error::UnsupportedFormat { format: format.name(), operation: "parse" });
        }
    };
    tracing::debug!(format = format.name(), statements = model.len(), "parsed model");
    Ok(model)
}

/// Write a model in `format`.
pub fn serialize(model: &Model, format: RdfFormat, out: &mut dyn Write) -> Result<()> {
    tracing::debug!(format = format.name(), statements = model.len(), "serializing model");
    match format {
        RdfFormat::NTriples => ntriples::write(model, out),
        RdfFormat::Turtle => turtle::write(model, out),
        RdfFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, model)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Iri, Literal, Resource};

    #[test]
    fn test_turtle_is_write_only() {
        let err = parse_str("", RdfFormat::Turtle).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(!RdfFormat::Turtle.can_parse());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut model = Model::new();
        model.add(Resource::from("http://e/s"), Iri::new_unchecked("http://e/p"), Literal::string("v"));
        let mut out = Vec::new();
        serialize(&model, RdfFormat::Json, &mut out).unwrap();
        let back = parse(&mut out.as_slice(), RdfFormat::Json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_bad_json_is_syntax_error() {
        assert!(matches!(parse_str("{ nope", RdfFormat::Json), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_format_names() {
        assert_eq!(RdfFormat::from_extension("TTL"), Some(RdfFormat::Turtle));
        assert_eq!(serde_json::to_string(&RdfFormat::NTriples).unwrap(), "\"n-triples\"");
    }
}
