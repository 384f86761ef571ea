//! tsk-lex - Tokenizer for filter and modification text.
//!
//! Transforms a string into a sequence of typed tokens: quoted strings,
//! numbers, UUIDs, dates, durations, `key:value` pairs, tags,
//! substitutions, patterns, operators, identifiers and plain words.
//! Whitespace separates tokens and is not emitted.
//!
//! Recognizers are attempted in a fixed order so that overlapping forms
//! resolve deterministically: date before uuid before identifier,
//! duration before identifier, pair before identifier, hex before
//! number, separator before tag before operator, substitution before
//! pattern, word last.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
