//! Message body templates.
//!
//! `{field}` is replaced by the recipient field of that name. `{0.field}` is
//! accepted as a synonym. `{{` and `}}` produce literal braces.

use crate::recipient::Recipient;
use std::fmt::Write;

/// Errors raised while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The placeholder names no field of the recipient.
    #[error("Unknown template field {0:?}")]
    UnknownField(String),

    /// A `{` without its closing `}`.
    #[error("Unterminated placeholder at byte {0}")]
    Unterminated(usize),

    /// A `}` that closes nothing.
    #[error("Single '}}' at byte {0}")]
    UnmatchedBrace(usize),

    /// A placeholder without a field name.
    #[error("Empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Field(String),
}

/// A parsed body template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Parses template text.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced braces or empty placeholders.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = text.char_indices().peekable();

        while let Some((pos, c)) = rest.next() {
            match c {
                '{' if rest.peek().is_some_and(|&(_, next)| next == '{') => {
                    rest.next();
                    literal.push('{');
                }
                '}' if rest.peek().is_some_and(|&(_, next)| next == '}') => {
                    rest.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match rest.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => name.push(c),
                            None => return Err(TemplateError::Unterminated(pos)),
                        }
                    }
                    let name = name.trim();
                    let name = name.strip_prefix("0.").unwrap_or(name);
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(pos));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Field(name.to_string()));
                }
                '}' => return Err(TemplateError::UnmatchedBrace(pos)),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Text(literal));
        }

        Ok(Self { pieces })
    }

    /// Renders the template against a recipient's fields.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownField`] for a field the recipient
    /// does not have.
    pub fn render(&self, recipient: &Recipient) -> Result<String, TemplateError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Field(name) => {
                    let value = recipient
                        .field(name)
                        .ok_or_else(|| TemplateError::UnknownField(name.clone()))?;
                    let _ = write!(out, "{value}");
                }
            }
        }
        Ok(out)
    }
}
