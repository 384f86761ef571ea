//! `/from/to/[g]` substitutions and `/pattern/` patterns.
//!
//! Both keep their raw text; the slash-quoted segments share the middle
//! delimiter. Either form must be followed by whitespace or end of
//! input.

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// `/from/to/` with an optional trailing `g`.
    pub(crate) fn lex_substitution(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();

        if self.lex_quoted('/').is_none() {
            return None;
        }

        // Step back over the middle delimiter so the second segment can
        // reuse it.
        self.cursor.restore(self.cursor.position() - 1);

        if self.lex_quoted('/').is_none() {
            self.cursor.restore(start);
            return None;
        }

        self.cursor.match_char('g');

        let next = self.cursor.current_char();
        if next != '\0' && !next.is_whitespace() {
            self.cursor.restore(start);
            return None;
        }

        Some(Token::new(
            self.cursor.slice_from(start),
            TokenKind::Substitution,
        ))
    }

    /// `/pattern/`.
    pub(crate) fn lex_pattern(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();

        if self.lex_quoted('/').is_none() {
            return None;
        }

        let next = self.cursor.current_char();
        if next != '\0' && !next.is_whitespace() {
            self.cursor.restore(start);
            return None;
        }

        Some(Token::new(self.cursor.slice_from(start), TokenKind::Pattern))
    }
}
