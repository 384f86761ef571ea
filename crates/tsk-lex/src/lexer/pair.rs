//! `key:value` pairs and `+tag`/`-tag` lexing.

use crate::lexer::{is_identifier_next, is_identifier_start, Lexer};
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// `<identifier> (':' | '=') (<string> | <word> | empty)`.
    ///
    /// The token carries the raw text, quotes included.
    pub(crate) fn lex_pair(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();

        if !self.scan_identifier() {
            return None;
        }

        let sep = self.cursor.current_char();
        if sep != ':' && sep != '=' {
            self.cursor.restore(start);
            return None;
        }
        self.cursor.advance();

        let next = self.cursor.current_char();
        let value_ok = self.lex_quoted('\'').is_some()
            || self.lex_quoted('"').is_some()
            || self.scan_word()
            || next == '\0'
            || next.is_whitespace();

        if !value_ok {
            self.cursor.restore(start);
            return None;
        }

        Some(Token::new(self.cursor.slice_from(start), TokenKind::Pair))
    }

    /// `+` or `-` followed by an identifier.
    pub(crate) fn lex_tag(&mut self) -> Option<Token> {
        let start = self.cursor.snapshot();

        let sign = self.cursor.current_char();
        if sign != '+' && sign != '-' {
            return None;
        }
        self.cursor.advance();

        if !is_identifier_start(self.cursor.current_char()) {
            self.cursor.restore(start);
            return None;
        }
        self.cursor.advance();
        while is_identifier_next(self.cursor.current_char()) {
            self.cursor.advance();
        }

        Some(Token::new(self.cursor.slice_from(start), TokenKind::Tag))
    }
}
