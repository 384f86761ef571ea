//! Operator lexing.
//!
//! Longest match first: pseudo-op names, then three-, two- and
//! one-character operators. The word operators `and`, `or`, `xor` are
//! only recognized when followed by a boundary.

use crate::lexer::{is_boundary, is_single_char_operator, Lexer};
use crate::token::{Token, TokenKind};

/// Pseudo-operator names.
const NAMED_OPS: &[&str] = &["_hastag_", "_notag_", "_neg_", "_pos_"];

impl<'a> Lexer<'a> {
    pub(crate) fn lex_operator(&mut self) -> Option<Token> {
        for named in NAMED_OPS {
            if self.cursor.remaining().starts_with(named) {
                self.cursor.advance_bytes(named.len());
                return Some(Token::new(*named, TokenKind::Op));
            }
        }

        let c0 = self.cursor.current_char();
        let c1 = self.cursor.char_at(1);
        let c2 = self.cursor.char_at(2);
        let c3 = self.cursor.char_at(3);

        // Three characters.
        if (c0 == 'a' && c1 == 'n' && c2 == 'd' && is_boundary(c2, c3))
            || (c0 == 'x' && c1 == 'o' && c2 == 'r' && is_boundary(c2, c3))
            || (c0 == '!' && c1 == '=' && c2 == '=')
        {
            let start = self.cursor.snapshot();
            self.cursor.advance_bytes(3);
            return Some(Token::new(self.cursor.slice_from(start), TokenKind::Op));
        }

        // Two characters.
        if (c0 == '=' && c1 == '=')
            || (c0 == '!' && c1 == '=')
            || (c0 == '<' && c1 == '=')
            || (c0 == '>' && c1 == '=')
            || (c0 == 'o' && c1 == 'r' && is_boundary(c1, c2))
            || (c0 == '|' && c1 == '|')
            || (c0 == '&' && c1 == '&')
            || (c0 == '!' && c1 == '~')
        {
            let start = self.cursor.snapshot();
            self.cursor.advance_bytes(2);
            return Some(Token::new(self.cursor.slice_from(start), TokenKind::Op));
        }

        // One character.
        if is_single_char_operator(c0) {
            self.cursor.advance();
            return Some(Token::new(c0.to_string(), TokenKind::Op));
        }

        None
    }
}
