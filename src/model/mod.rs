//! # Statement Model
//!
//! The triple-side DTOs: terms, statements and the in-memory `Model`.
//! These types cross every boundary: format codecs ↔ reader/writer ↔ user.
//!
//! Design rule: this module is pure data. It knows nothing about mapped
//! types, descriptors or strategies.

pub mod graph;
pub mod statement;
pub mod term;
pub mod vocab;

pub use graph::Model;
pub use statement::Statement;
pub use term::{BlankNode, Iri, Literal, Resource, Term};
