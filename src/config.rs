//! Mapper configuration.
//!
//! ```json
//! {
//!   "read_format": "n-triples",
//!   "write_format": "turtle",
//!   "namespaces": { "ex": "http://example.com/" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::format::RdfFormat;
use crate::model::Iri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Format assumed by `Mapper::read_from`.
    pub read_format: RdfFormat,
    /// Format produced by `Mapper::write_to`.
    pub write_format: RdfFormat,
    /// Prefixes seeded into every write sink.
    pub namespaces: BTreeMap<String, Iri>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            read_format: RdfFormat::NTriples,
            write_format: RdfFormat::Turtle,
            namespaces: BTreeMap::new(),
        }
    }
}

impl MapperConfig {
    /// Parse a config. Namespace IRIs are validated as they deserialize.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn namespace(mut self, prefix: impl Into<String>, namespace: Iri) -> Self {
        self.namespaces.insert(prefix.into(), namespace);
        self
    }
}
