//! Quoted string lexing.
//!
//! Handles `'...'` and `"..."` with escape sequences and `\uXXXX` /
//! `U+XXXX` codepoint escapes. The produced token text is the decoded
//! content; embedded NUL is permitted.

use crate::lexer::{is_hex_digit, Lexer};
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lexes a string quoted with `quote`.
    pub(crate) fn lex_string(&mut self, quote: char) -> Option<Token> {
        self.lex_quoted(quote)
            .map(|content| Token::new(content, TokenKind::String))
    }

    /// Recognizes a `quote`-delimited string and returns the decoded
    /// content, cursor advanced past the closing quote. Restores the
    /// cursor and returns `None` when unterminated.
    pub(crate) fn lex_quoted(&mut self, quote: char) -> Option<String> {
        let start = self.cursor.snapshot();

        if !self.cursor.match_char(quote) {
            return None;
        }

        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() {
                // Unterminated.
                self.cursor.restore(start);
                return None;
            }

            let c = self.cursor.current_char();

            if c == quote {
                self.cursor.advance();
                return Some(content);
            }

            // U+XXXX or \uXXXX codepoint.
            if self.codepoint_ahead() {
                let value = self.take_codepoint();
                content.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                continue;
            }

            if c == '\\' {
                self.cursor.advance();
                let escaped = self.cursor.current_char();
                if escaped == '\0' && self.cursor.is_at_end() {
                    self.cursor.restore(start);
                    return None;
                }
                content.push(match escaped {
                    'b' => '\u{0008}',
                    'f' => '\u{000C}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\u{000B}',
                    // Anything else escapes harmlessly to itself,
                    // including the quote and the backslash.
                    other => other,
                });
                self.cursor.advance();
                continue;
            }

            content.push(c);
            self.cursor.advance();
        }
    }

    /// True when the cursor sits on `U+XXXX` or `\uXXXX`.
    fn codepoint_ahead(&self) -> bool {
        let intro = (self.cursor.current_char(), self.cursor.char_at(1));
        if intro != ('U', '+') && intro != ('\\', 'u') {
            return false;
        }
        (2..6).all(|i| is_hex_digit(self.cursor.char_at(i)))
    }

    /// Consumes a 6-character codepoint escape and returns its value.
    fn take_codepoint(&mut self) -> u32 {
        let mut value = 0u32;
        for i in 2..6 {
            value = value * 16 + self.cursor.char_at(i).to_digit(16).unwrap_or(0);
        }
        self.cursor.advance_bytes(6);
        value
    }
}
