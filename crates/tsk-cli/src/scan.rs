//! A small forward scanner for decomposing single arguments.
//!
//! The desugar and decompose passes pick arguments apart
//! (`name.mod:value`, `/from/to/g`) without re-lexing; this scanner
//! provides the primitive cuts they need.

/// Forward-only scanner over one argument's text.
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner { text, pos: 0 }
    }

    /// True when all input is consumed.
    pub fn depleted(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Consume `c` if it is next.
    pub fn skip(&mut self, c: char) -> bool {
        if self.current() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume an identifier: a leading non-digit, non-punctuation
    /// character, then anything up to whitespace, `:`, `=` or another
    /// single-character operator.
    pub fn get_name(&mut self) -> Option<String> {
        let start = self.pos;
        let first = self.current()?;
        if !tsk_lex::lexer::is_identifier_start(first) {
            return None;
        }
        self.pos += first.len_utf8();
        while let Some(c) = self.current() {
            if !tsk_lex::lexer::is_identifier_next(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        Some(self.text[start..self.pos].to_string())
    }

    /// Consume up to (not including) the first occurrence of `c`, or to
    /// the end when `c` is absent.
    pub fn until(&mut self, c: char) -> String {
        let rest = &self.text[self.pos..];
        let len = rest.find(c).unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }

    /// Consume up to the first character contained in `set`.
    pub fn until_one_of(&mut self, set: &str) -> String {
        let rest = &self.text[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| set.contains(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }

    /// Consume everything remaining. Returns `None` when depleted.
    pub fn rest(&mut self) -> Option<String> {
        if self.depleted() {
            return None;
        }
        let out = self.text[self.pos..].to_string();
        self.pos = self.text.len();
        Some(out)
    }

    /// Consume a `quote`-delimited segment, returning the inner text.
    /// No escape processing; the closing quote must be present.
    pub fn quoted(&mut self, quote: char) -> Option<String> {
        if self.current() != Some(quote) {
            return None;
        }
        let inner_start = self.pos + quote.len_utf8();
        let rest = &self.text[inner_start..];
        let close = rest.find(quote)?;
        let inner = rest[..close].to_string();
        self.pos = inner_start + close + quote.len_utf8();
        Some(inner)
    }

    /// Consume a run of digits as an unsigned integer.
    pub fn unsigned(&mut self) -> Option<u64> {
        let rest = &self.text[self.pos..];
        let len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 {
            return None;
        }
        let value = rest[..len].parse().ok()?;
        self.pos += len;
        Some(value)
    }

    /// Step back one character. Used to share a delimiter between two
    /// quoted segments.
    pub fn back(&mut self) {
        if self.pos > 0 {
            let mut new_pos = self.pos - 1;
            while new_pos > 0 && !self.text.is_char_boundary(new_pos) {
                new_pos -= 1;
            }
            self.pos = new_pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_name() {
        let mut s = Scanner::new("project:Home");
        assert_eq!(s.get_name().unwrap(), "project");
        assert!(s.skip(':'));
        assert_eq!(s.rest().unwrap(), "Home");
        assert!(s.depleted());
    }

    #[test]
    fn test_name_with_dots() {
        let mut s = Scanner::new("due.before:eom");
        assert_eq!(s.until('.'), "due");
        assert!(s.skip('.'));
        assert_eq!(s.until_one_of(":="), "before");
        assert!(s.skip(':'));
        assert_eq!(s.rest().unwrap(), "eom");
    }

    #[test]
    fn test_quoted() {
        let mut s = Scanner::new("'Home Office'");
        assert_eq!(s.quoted('\'').unwrap(), "Home Office");
        assert!(s.depleted());
    }

    #[test]
    fn test_quoted_unterminated() {
        let mut s = Scanner::new("'oops");
        assert!(s.quoted('\'').is_none());
        assert!(!s.depleted());
    }

    #[test]
    fn test_substitution_shape() {
        let mut s = Scanner::new("/foo/bar/g");
        let from = s.quoted('/').unwrap();
        s.back();
        let to = s.quoted('/').unwrap();
        let global = s.skip('g');
        assert_eq!(from, "foo");
        assert_eq!(to, "bar");
        assert!(global);
        assert!(s.depleted());
    }

    #[test]
    fn test_unsigned() {
        let mut s = Scanner::new("42-10");
        assert_eq!(s.unsigned().unwrap(), 42);
        assert!(s.skip('-'));
        assert_eq!(s.unsigned().unwrap(), 10);
        assert!(s.depleted());
    }

    #[test]
    fn test_get_name_rejects_leading_digit() {
        let mut s = Scanner::new("1project");
        assert!(s.get_name().is_none());
    }
}
