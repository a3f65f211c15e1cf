//! Path-based field addressing.
//!
//! A path string identifies a field's position in the container graph:
//! `name`, `address.street`, `items[2].id`. [`parse_path`] turns the string
//! into ordered [`Segment`]s; [`resolve`] walks a container graph to locate
//! the addressed field.
//!
//! Resolution never panics and never returns an error for a malformed path —
//! the contract is a not-found result (`None`). Failures emit trace-level
//! `tracing` events naming the segment that failed, so path problems stay
//! diagnosable without a behavioral logging dependency.

pub mod tokenizer;

use crate::form::{ArrayForm, Field, Form};
use tokenizer::{tokenize, Token};

/// Errors from path parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("unexpected character at byte {0}")]
    InvalidCharacter(usize),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of path")]
    UnexpectedEnd,
}

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A field name, looked up in the current container.
    Field(String),
    /// An array index into the pinned field's repeatable containers.
    Index(usize),
}

/// Parse a path string into ordered segments.
///
/// Grammar: a path starts with a field name; each following segment is either
/// `.name`, a bracketed index `[n]`, or a bare numeric segment `.n` (the
/// bracket form is canonical — [`Field::path`] always prints brackets).
pub fn parse_path(input: &str) -> Result<Vec<Segment>, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    let tokens = tokenize(input).map_err(PathError::InvalidCharacter)?;

    let mut segments = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    // First segment must be a field name.
    match iter.next() {
        Some((Token::Ident, text)) => segments.push(Segment::Field(text)),
        Some((_, text)) => return Err(PathError::UnexpectedToken(text)),
        None => return Err(PathError::Empty),
    }

    while let Some((token, text)) = iter.next() {
        match token {
            Token::Index => {
                // Strip the brackets; digits only by construction.
                let digits = &text[1..text.len() - 1];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::UnexpectedToken(text.clone()))?;
                segments.push(Segment::Index(index));
            }
            Token::Dot => match iter.next() {
                Some((Token::Ident, name)) => segments.push(Segment::Field(name)),
                Some((Token::Number, digits)) => {
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| PathError::UnexpectedToken(digits.clone()))?;
                    segments.push(Segment::Index(index));
                }
                Some((_, text)) => return Err(PathError::UnexpectedToken(text)),
                None => return Err(PathError::UnexpectedEnd),
            },
            _ => return Err(PathError::UnexpectedToken(text)),
        }
    }

    Ok(segments)
}

/// Resolve a path against a root container.
///
/// Walks segments left to right keeping a current container and, across a
/// repeatable field, a pinned array awaiting its index segment. Only a field
/// segment produces a returned node: a trailing index segment addresses a
/// container, not a field, and yields `None`.
///
/// The bracket spelling is canonical: `resolve(root, p).path() == p` holds
/// for every resolvable bracket-form path. The bare-numeric spelling
/// (`items.0.id`) resolves to the same node but prints back normalized
/// (`items[0].id`).
pub fn resolve(root: &Form, path: &str) -> Option<Field> {
    let segments = match parse_path(path) {
        Ok(segments) => segments,
        Err(err) => {
            tracing::trace!(path, %err, "path did not parse");
            return None;
        }
    };

    let mut container = root.clone();
    let mut pinned: Option<ArrayForm> = None;
    let last = segments.len() - 1;

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Field(name) => {
                if pinned.is_some() {
                    // A repeatable field must be followed by an index.
                    tracing::trace!(path, segment = %name, "expected index after repeatable field");
                    return None;
                }
                let Some(field) = container.field(name) else {
                    tracing::trace!(path, segment = %name, "field not found in container");
                    return None;
                };
                if i == last {
                    return Some(field);
                }
                // More segments remain: descend or pin.
                if let Some(subform) = field.subform() {
                    container = subform;
                } else if let Some(array) = field.repeatable() {
                    pinned = Some(array);
                } else {
                    tracing::trace!(path, segment = %name, "leaf field but path continues");
                    return None;
                }
            }
            Segment::Index(index) => {
                let Some(array) = pinned.take() else {
                    tracing::trace!(path, index, "index segment without repeatable field");
                    return None;
                };
                let Some(item) = array.item(*index) else {
                    tracing::trace!(path, index, len = array.len(), "index out of bounds");
                    return None;
                };
                container = item;
            }
        }
    }

    // The walk ended on an index segment: a container, not a field.
    None
}
