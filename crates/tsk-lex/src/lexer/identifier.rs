//! Identifier and word lexing, plus the raw scans shared with the pair
//! recognizer.

use crate::lexer::{is_identifier_next, is_identifier_start, Lexer};
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// An identifier: starts with a non-digit, non-punctuation,
    /// non-whitespace character, continues until whitespace, a
    /// single-character operator or `:`.
    pub(crate) fn lex_identifier(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();
        if !self.scan_identifier() {
            return None;
        }
        Some(Token::new(
            self.cursor.slice_from(start),
            TokenKind::Identifier,
        ))
    }

    /// Any run of non-whitespace. The fallback of last resort.
    pub(crate) fn lex_word(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();
        if !self.scan_word() {
            return None;
        }
        Some(Token::new(self.cursor.slice_from(start), TokenKind::Word))
    }

    /// Advances over an identifier. Returns false (cursor unmoved) when
    /// the current character cannot start one.
    pub(crate) fn scan_identifier(&mut self) -> bool {
        if !is_identifier_start(self.cursor.current_char()) {
            return false;
        }
        self.cursor.advance();
        while is_identifier_next(self.cursor.current_char()) {
            self.cursor.advance();
        }
        true
    }

    /// Advances over a run of non-whitespace. Returns false at end of
    /// input.
    pub(crate) fn scan_word(&mut self) -> bool {
        let start = self.cursor.position();
        while !self.cursor.is_at_end() && !self.cursor.current_char().is_whitespace() {
            self.cursor.advance();
        }
        self.cursor.position() > start
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;

    fn kinds(text: &str) -> Vec<(String, TokenKind)> {
        Lexer::split(text)
            .into_iter()
            .map(|t| (t.text, t.kind))
            .collect()
    }

    #[test]
    fn test_simple_identifiers() {
        assert_eq!(
            kinds("project"),
            vec![("project".into(), TokenKind::Identifier)]
        );
        assert_eq!(
            kinds("due.before"),
            vec![("due.before".into(), TokenKind::Identifier)]
        );
    }

    #[test]
    fn test_identifier_may_contain_digits() {
        assert_eq!(kinds("foo123"), vec![("foo123".into(), TokenKind::Identifier)]);
    }

    #[test]
    fn test_word_fallback() {
        // Leading digit plus non-number tail degrades to number +
        // identifier; pure punctuation is a word.
        assert_eq!(kinds("§¶"), vec![("§¶".into(), TokenKind::Identifier)]);
        assert_eq!(kinds("...."), vec![("....".into(), TokenKind::Word)]);
    }
}
