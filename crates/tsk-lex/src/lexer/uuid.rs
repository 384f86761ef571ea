//! UUID lexing: full canonical form and 8-35 character prefixes.

use crate::lexer::{is_hex_digit, Lexer};
use crate::token::{Token, TokenKind};

/// Canonical layout: hex digits with dashes at offsets 8, 13, 18, 23.
const UUID_PATTERN: &[u8; 36] = b"xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";

/// Minimum usable prefix length.
const UUID_MIN_LENGTH: usize = 8;

impl<'a> Lexer<'a> {
    /// Full 36-character UUID.
    pub(crate) fn lex_uuid(&mut self) -> Option<Token> {
        if self.pattern_match_len() == 36 && self.boundary_at(36) {
            let start = self.cursor.snapshot();
            self.cursor.advance_bytes(36);
            return Some(Token::new(self.cursor.slice_from(start), TokenKind::Uuid));
        }
        None
    }

    /// UUID prefix of 8 to 35 characters matching the canonical layout.
    pub(crate) fn lex_partial_uuid(&mut self) -> Option<Token> {
        let len = self.pattern_match_len();
        if len >= UUID_MIN_LENGTH && self.boundary_at(len) {
            let start = self.cursor.snapshot();
            self.cursor.advance_bytes(len);
            return Some(Token::new(self.cursor.slice_from(start), TokenKind::Uuid));
        }
        None
    }

    /// Length of the longest canonical-layout match at the cursor.
    fn pattern_match_len(&self) -> usize {
        let mut i = 0;
        while i < 36 {
            let c = self.cursor.char_at(i);
            let ok = if UUID_PATTERN[i] == b'x' {
                is_hex_digit(c)
            } else {
                c == '-'
            };
            if !ok {
                break;
            }
            i += 1;
        }
        i
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;

    #[test]
    fn test_full_uuid() {
        let tokens = Lexer::split("a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Uuid);
        assert_eq!(tokens[0].text, "a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5");
    }

    #[test]
    fn test_partial_uuid() {
        for text in [
            "a0b1c2d3",
            "a0b1c2d3-e4f5",
            "a0b1c2d3-e4f5-a6b7",
            "a0b1c2d3-e4f5-a6b7-c8d9",
            "a0b1c2d3-e4f5-a6b7-c8d9-e0f1",
        ] {
            let tokens = Lexer::split(text);
            assert_eq!(tokens.len(), 1, "{}", text);
            assert_eq!(tokens[0].kind, TokenKind::Uuid, "{}", text);
            assert_eq!(tokens[0].text, text);
        }
    }

    #[test]
    fn test_short_prefix_is_not_uuid() {
        // Under 8 leading hex digits falls through to other kinds.
        let tokens = Lexer::split("a0b1c2d");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_digits_only_is_number_not_uuid() {
        // 8+ digits without a dash at offset 8 are a number, not a
        // truncated UUID.
        let tokens = Lexer::split("1450000000");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "1450000000");
    }
}
