//! N-Triples: one statement per line.
//!
//! ```text
//! <http://example.com/p1> <http://example.com/x> "3"^^<http://www.w3.org/2001/XMLSchema#int> .
//! _:b1 <http://example.com/name> "Ada"@en .
//! ```
//!
//! `xsd:string` literals are written without a datatype, and a literal read
//! without one is `xsd:string`.

use std::io::Write;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::model::vocab::xsd;
use crate::model::{BlankNode, Iri, Literal, Model, Resource, Statement, Term};
use crate::{Error, Result};

// ============================================================================
// Parsing
// ============================================================================

/// Parse an N-Triples document.
pub fn parse(input: &str) -> Result<Model> {
    let mut model = Model::new();
    for (index, line) in input.lines().enumerate() {
        let mut cursor = LineCursor::new(index + 1, line);
        if let Some(statement) = cursor.statement()? {
            model.insert(statement);
        }
    }
    Ok(model)
}

struct LineCursor<'a> {
    line: usize,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> LineCursor<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self { line, chars: text.char_indices().peekable() }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax { line: self.line, message: message.into() }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c == ' ' || c == '\t') {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.chars.next() {
            Some((_, c)) if c == want => Ok(()),
            Some((pos, c)) => Err(self.error(format!("expected '{want}' at column {}, found '{c}'", pos + 1))),
            None => Err(self.error(format!("expected '{want}', found end of line"))),
        }
    }

    /// One statement, or `None` for blank and comment lines.
    fn statement(&mut self) -> Result<Option<Statement>> {
        self.skip_ws();
        match self.peek() {
            None | Some('#') => return Ok(None),
            _ => {}
        }

        let subject = match self.peek() {
            Some('<') => Resource::Iri(self.iri()?),
            Some('_') => Resource::Blank(self.blank()?),
            _ => return Err(self.error("subject must be an IRI or blank node")),
        };
        self.skip_ws();
        if self.peek() != Some('<') {
            return Err(self.error("predicate must be an IRI"));
        }
        let predicate = self.iri()?;
        self.skip_ws();
        let object = match self.peek() {
            Some('<') => Term::Iri(self.iri()?),
            Some('_') => Term::Blank(self.blank()?),
            Some('"') => Term::Literal(self.literal()?),
            _ => return Err(self.error("object must be an IRI, blank node or literal")),
        };
        self.skip_ws();
        self.expect('.')?;
        self.skip_ws();
        match self.peek() {
            None | Some('#') => Ok(Some(Statement { subject, predicate, object })),
            Some(c) => Err(self.error(format!("unexpected '{c}' after statement"))),
        }
    }

    fn iri(&mut self) -> Result<Iri> {
        self.expect('<')?;
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '>')) => break,
                Some((_, '\\')) => value.push(self.unicode_escape()?),
                Some((_, c)) => value.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
        Iri::new(value).map_err(|e| self.error(e.to_string()))
    }

    fn blank(&mut self) -> Result<BlankNode> {
        self.expect('_')?;
        self.expect(':')?;
        let mut label = String::new();
        while let Some(c) = self.peek() {
            if !BlankNode::is_label_char(c) {
                break;
            }
            // A '.' not followed by more label ends the statement.
            if c == '.' {
                let mut ahead = self.chars.clone();
                ahead.next();
                if !matches!(ahead.peek(), Some(&(_, next)) if BlankNode::is_label_char(next)) {
                    break;
                }
            }
            label.push(c);
            self.chars.next();
        }
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(BlankNode::new(label))
    }

    fn literal(&mut self) -> Result<Literal> {
        self.expect('"')?;
        let mut lexical = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => lexical.push(self.string_escape()?),
                Some((_, c)) => lexical.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }
        match self.peek() {
            Some('^') => {
                self.expect('^')?;
                self.expect('^')?;
                let datatype = self.iri()?;
                Ok(Literal::typed(lexical, datatype))
            }
            Some('@') => {
                self.chars.next();
                let mut lang = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        lang.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                if lang.is_empty() {
                    return Err(self.error("empty language tag"));
                }
                Ok(Literal::lang(lexical, lang))
            }
            _ => Ok(Literal::string(lexical)),
        }
    }

    fn string_escape(&mut self) -> Result<char> {
        match self.peek() {
            Some('u') | Some('U') => self.unicode_escape(),
            _ => match self.chars.next() {
                Some((_, 't')) => Ok('\t'),
                Some((_, 'b')) => Ok('\u{8}'),
                Some((_, 'n')) => Ok('\n'),
                Some((_, 'r')) => Ok('\r'),
                Some((_, 'f')) => Ok('\u{c}'),
                Some((_, '"')) => Ok('"'),
                Some((_, '\'')) => Ok('\''),
                Some((_, '\\')) => Ok('\\'),
                Some((_, c)) => Err(self.error(format!("unknown escape '\\{c}'"))),
                None => Err(self.error("dangling escape")),
            },
        }
    }

    /// `\uXXXX` or `\UXXXXXXXX`, positioned after the backslash.
    fn unicode_escape(&mut self) -> Result<char> {
        let width = match self.chars.next() {
            Some((_, 'u')) => 4,
            Some((_, 'U')) => 8,
            _ => return Err(self.error("expected unicode escape")),
        };
        let mut hex = String::with_capacity(width);
        for _ in 0..width {
            match self.chars.next() {
                Some((_, c)) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error("malformed unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid code point U+{hex}")))
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Write every statement of `model`, one per line, in insertion order.
pub fn write(model: &Model, out: &mut dyn Write) -> Result<()> {
    for statement in model {
        writeln!(
            out,
            "{} <{}> {} .",
            resource(&statement.subject),
            escape_iri(statement.predicate.as_str()),
            term(&statement.object)
        )?;
    }
    Ok(())
}

fn resource(value: &Resource) -> String {
    match value {
        Resource::Iri(iri) => format!("<{}>", escape_iri(iri.as_str())),
        Resource::Blank(b) => format!("_:{}", b.label()),
    }
}

pub(crate) fn term(value: &Term) -> String {
    match value {
        Term::Iri(iri) => format!("<{}>", escape_iri(iri.as_str())),
        Term::Blank(b) => format!("_:{}", b.label()),
        Term::Literal(lit) => {
            let quoted = format!("\"{}\"", escape_string(&lit.lexical));
            match &lit.language {
                Some(lang) => format!("{quoted}@{lang}"),
                None if lit.datatype.as_str() == xsd::STRING => quoted,
                None => format!("{quoted}^^<{}>", escape_iri(lit.datatype.as_str())),
            }
        }
    }
}

pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn escape_iri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_control() || matches!(c, '<' | '>' | '"' | '\\') {
            out.push_str(&format!("\\u{:04X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}
