//! logos-based tokenizer for the path addressing grammar.
//!
//! A path is a dotted/bracketed address like `items[2].address.street`.
//! Four tokens cover the grammar:
//! - `Ident` — a field name (`items`, `street`);
//! - `Index` — a bracketed non-negative integer (`[2]`);
//! - `Number` — a bare non-negative integer segment (`items.0`);
//! - `Dot` — the segment separator.
//!
//! Whitespace is not part of the grammar and lexes as an error.

use logos::Logos;

/// Path token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// Field name: `name`, `home_address`, `line-2`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    /// Bracketed array index: `[0]`, `[12]`. The canonical index spelling.
    #[regex(r"\[[0-9]+\]")]
    Index,

    /// Bare non-negative integer. A dotted segment that is all digits
    /// (`items.0.id`) addresses an array index too.
    #[regex(r"[0-9]+")]
    Number,

    /// `.`
    #[token(".")]
    Dot,
}

/// Tokenize a path string into `(Token, text)` pairs.
///
/// Returns the byte offset of the first unlexable character on failure.
pub fn tokenize(input: &str) -> Result<Vec<(Token, String)>, usize> {
    let lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    for (result, span) in lexer.spanned() {
        match result {
            Ok(token) => tokens.push((token, input[span].to_string())),
            Err(()) => return Err(span.start),
        }
    }
    Ok(tokens)
}
