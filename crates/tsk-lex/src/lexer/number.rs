//! Numeric literal lexing: hex and decimal.

use crate::lexer::{is_hex_digit, Lexer};
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// `0x` followed by at least one hex digit.
    pub(crate) fn lex_hex_number(&mut self) -> Option<Token> {
        if self.cursor.current_char() != '0' || self.cursor.char_at(1) != 'x' {
            return None;
        }

        let mut len = 2;
        while is_hex_digit(self.cursor.char_at(len)) {
            len += 1;
        }
        if len == 2 {
            // Bare "0x" is not a hex number.
            return None;
        }

        let start = self.cursor.snapshot();
        self.cursor.advance_bytes(len);
        Some(Token::new(self.cursor.slice_from(start), TokenKind::Hex))
    }

    /// Digits, optional fraction, optional exponent. No leading sign;
    /// unary minus is an operator.
    pub(crate) fn lex_number(&mut self) -> Option<Token> {
        if !self.cursor.current_char().is_ascii_digit() {
            return None;
        }

        let mut len = 1;
        while self.cursor.char_at(len).is_ascii_digit() {
            len += 1;
        }

        if self.cursor.char_at(len) == '.' && self.cursor.char_at(len + 1).is_ascii_digit() {
            len += 1;
            while self.cursor.char_at(len).is_ascii_digit() {
                len += 1;
            }
        }

        let e = self.cursor.char_at(len);
        if e == 'e' || e == 'E' {
            let mut exp = len + 1;
            if self.cursor.char_at(exp) == '+' || self.cursor.char_at(exp) == '-' {
                exp += 1;
            }
            if self.cursor.char_at(exp).is_ascii_digit() {
                exp += 1;
                while self.cursor.char_at(exp).is_ascii_digit() {
                    exp += 1;
                }
                len = exp;
            }
        }

        let start = self.cursor.snapshot();
        self.cursor.advance_bytes(len);
        Some(Token::new(self.cursor.slice_from(start), TokenKind::Number))
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
    fn test_integers() {
        assert_eq!(kinds("0"), vec![("0".into(), TokenKind::Number)]);
        assert_eq!(kinds("123"), vec![("123".into(), TokenKind::Number)]);
    }

    #[test]
    fn test_fractions_and_exponents() {
        assert_eq!(kinds("3.14"), vec![("3.14".into(), TokenKind::Number)]);
        assert_eq!(kinds("1e6"), vec![("1e6".into(), TokenKind::Number)]);
        assert_eq!(kinds("1.2e-3"), vec![("1.2e-3".into(), TokenKind::Number)]);
        assert_eq!(kinds("1.2E+3"), vec![("1.2E+3".into(), TokenKind::Number)]);
    }

    #[test]
    fn test_hex() {
        assert_eq!(kinds("0xdeadBEEF"), vec![("0xdeadBEEF".into(), TokenKind::Hex)]);
        assert_eq!(kinds("0x0"), vec![("0x0".into(), TokenKind::Hex)]);
    }

    #[test]
    fn test_bare_0x_is_not_hex() {
        let t = kinds("0x");
        assert_eq!(t[0], ("0".into(), TokenKind::Number));
        assert_eq!(t[1], ("x".into(), TokenKind::Identifier));
    }

    #[test]
    fn test_no_leading_sign() {
        let t = kinds("-5");
        assert_eq!(t[0], ("-".into(), TokenKind::Op));
        assert_eq!(t[1], ("5".into(), TokenKind::Number));
    }

    #[test]
    fn test_trailing_dot_not_consumed() {
        let t = kinds("5.");
        assert_eq!(t[0], ("5".into(), TokenKind::Number));
    }
}
