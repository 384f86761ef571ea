//! Date and duration literal recognition.
//!
//! Both delegate to the temporal parsers and then require a word
//! boundary, so that `2d+1h` lexes as duration, operator, duration and
//! `5-10` stays an ID range.

use tsk_time::date::parse_iso;
use tsk_time::Span;

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// ISO-8601 calendar date at the cursor.
    pub(crate) fn lex_date(&mut self) -> Option<Token> {
        let (_, len) = parse_iso(self.cursor.remaining())?;
        if !self.boundary_at(len) {
            return None;
        }
        let start = self.cursor.snapshot();
        self.cursor.advance_bytes(len);
        Some(Token::new(self.cursor.slice_from(start), TokenKind::Date))
    }

    /// Designated or colloquial duration at the cursor.
    pub(crate) fn lex_duration(&mut self) -> Option<Token> {
        let (_, len) = Span::parse(self.cursor.remaining())?;
        if !self.boundary_at(len) {
            return None;
        }
        let start = self.cursor.snapshot();
        self.cursor.advance_bytes(len);
        Some(Token::new(
            self.cursor.slice_from(start),
            TokenKind::Duration,
        ))
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
    fn test_iso_dates() {
        assert_eq!(
            kinds("2015-07-04"),
            vec![("2015-07-04".into(), TokenKind::Date)]
        );
        assert_eq!(
            kinds("2015-07-04T10:20:30Z"),
            vec![("2015-07-04T10:20:30Z".into(), TokenKind::Date)]
        );
        assert_eq!(
            kinds("2015-W01-1"),
            vec![("2015-W01-1".into(), TokenKind::Date)]
        );
    }

    #[test]
    fn test_durations() {
        assert_eq!(kinds("2d"), vec![("2d".into(), TokenKind::Duration)]);
        assert_eq!(kinds("P1Y2M"), vec![("P1Y2M".into(), TokenKind::Duration)]);
        assert_eq!(
            kinds("weekly"),
            vec![("weekly".into(), TokenKind::Duration)]
        );
    }

    #[test]
    fn test_duration_arithmetic_splits() {
        let t = kinds("2d+1h");
        assert_eq!(
            t,
            vec![
                ("2d".into(), TokenKind::Duration),
                ("+".into(), TokenKind::Op),
                ("1h".into(), TokenKind::Duration),
            ]
        );
    }

    #[test]
    fn test_id_range_is_not_a_date() {
        let t = kinds("3-5");
        assert_eq!(t[0], ("3".into(), TokenKind::Number));
        assert_eq!(t[1], ("-".into(), TokenKind::Op));
        assert_eq!(t[2], ("5".into(), TokenKind::Number));
    }

    #[test]
    fn test_duration_requires_boundary() {
        // "3dx" is not a duration.
        let t = kinds("3dx");
        assert_eq!(t[0], ("3".into(), TokenKind::Number));
        assert_eq!(t[1].1, TokenKind::Identifier);
    }
}
