//! Durations.
//!
//! A `Span` is a signed number of seconds. Parsing accepts ISO-8601
//! designated form (`P1Y2M3DT4H5M6S`), colloquial quantities with a unit
//! (`3.5days`, `2 min`), and fixed recurrence words (`weekly`,
//! `fortnight`). Rendering offers the canonical day-normalized form and
//! a vague human form.

/// Conversion factors, in seconds.
const SECOND: i64 = 1;
const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const QUARTER: i64 = 91 * DAY;
const YEAR: i64 = 365 * DAY;

/// Unit words matched by unique prefix. Singular forms are prefixes of
/// the plurals, and the short forms `s min h d w mo q y` fall out of the
/// same rule.
const UNITS: &[(&str, i64)] = &[
    ("seconds", SECOND),
    ("minutes", MINUTE),
    ("hours", HOUR),
    ("days", DAY),
    ("weeks", WEEK),
    ("months", MONTH),
    ("quarters", QUARTER),
    ("years", YEAR),
];

/// Fixed words, matched exactly. Quantities multiply.
const WORDS: &[(&str, i64)] = &[
    ("annual", YEAR),
    ("biannual", 2 * YEAR),
    ("bimonthly", 61 * DAY),
    ("biweekly", 14 * DAY),
    ("biyearly", 2 * YEAR),
    ("daily", DAY),
    ("fortnight", 14 * DAY),
    ("monthly", MONTH),
    ("quarterly", QUARTER),
    ("semiannual", 183 * DAY),
    ("sennight", 14 * DAY),
    ("weekdays", DAY),
    ("weekly", WEEK),
    ("yearly", YEAR),
];

/// A signed duration with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    seconds: i64,
}

impl Span {
    /// From raw seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Span { seconds }
    }

    /// Signed seconds.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Recognize a duration at the start of `input`. Returns the span
    /// and the number of bytes consumed. Does not require the whole
    /// input to be consumed; callers enforce their own boundary.
    pub fn parse(input: &str) -> Option<(Span, usize)> {
        parse_designated(input).or_else(|| parse_colloquial(input))
    }

    /// Parse a complete string as a duration. Also accepts a bare run
    /// of digits as epoch-like literal seconds.
    pub fn parse_str(input: &str) -> Option<Span> {
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            return input.parse::<i64>().ok().map(Span::from_seconds);
        }
        match Span::parse(input) {
            Some((span, len)) if len == input.len() => Some(span),
            _ => None,
        }
    }

    /// Canonical rendering: days plus a time part, e.g. `P396DT1H1M1S`.
    /// Zero renders `PT0S`.
    pub fn format(&self) -> String {
        let mut out = String::new();
        let mut rem = self.seconds;
        if rem < 0 {
            out.push('-');
            rem = -rem;
        }
        out.push('P');

        let days = rem / DAY;
        rem %= DAY;
        if days > 0 {
            out.push_str(&format!("{}D", days));
        }

        let hours = rem / HOUR;
        let minutes = (rem % HOUR) / MINUTE;
        let secs = rem % MINUTE;
        if hours > 0 || minutes > 0 || secs > 0 || days == 0 {
            out.push('T');
            if hours > 0 {
                out.push_str(&format!("{}H", hours));
            }
            if minutes > 0 {
                out.push_str(&format!("{}M", minutes));
            }
            if secs > 0 || (days == 0 && hours == 0 && minutes == 0) {
                out.push_str(&format!("{}S", secs));
            }
        }

        out
    }

    /// Vague rendering, scaled to the largest sensible unit:
    /// `1.3y`, `3mo`, `2w`, `5d`, `4h`, `10min`, `30s`. Zero renders
    /// empty.
    pub fn format_vague(&self) -> String {
        let s = self.seconds.abs();
        let sign = if self.seconds < 0 { "-" } else { "" };
        if s >= YEAR {
            format!("{}{:.1}y", sign, s as f64 / YEAR as f64)
        } else if s >= 90 * DAY {
            format!("{}{}mo", sign, s / MONTH)
        } else if s >= 14 * DAY {
            format!("{}{}w", sign, s / WEEK)
        } else if s >= DAY {
            format!("{}{}d", sign, s / DAY)
        } else if s >= HOUR {
            format!("{}{}h", sign, s / HOUR)
        } else if s >= MINUTE {
            format!("{}{}min", sign, s / MINUTE)
        } else if s >= 1 {
            format!("{}{}s", sign, s)
        } else {
            String::new()
        }
    }
}

impl std::ops::Neg for Span {
    type Output = Span;

    fn neg(self) -> Span {
        Span::from_seconds(-self.seconds)
    }
}

impl std::ops::Add for Span {
    type Output = Span;

    fn add(self, rhs: Span) -> Span {
        Span::from_seconds(self.seconds + rhs.seconds)
    }
}

impl std::ops::Sub for Span {
    type Output = Span;

    fn sub(self, rhs: Span) -> Span {
        Span::from_seconds(self.seconds - rhs.seconds)
    }
}

/// ISO-8601 designated form. Requires at least one dated or timed
/// component; `P`, `PT`, `P1` and `P1T` are rejected.
fn parse_designated(input: &str) -> Option<(Span, usize)> {
    let b = input.as_bytes();
    if b.first() != Some(&b'P') {
        return None;
    }

    let mut pos = 1;
    let mut seconds: i64 = 0;
    let mut components = 0;
    let mut in_time = false;

    // Unit order within each part is enforced by a falling rank.
    let mut rank = 0;
    loop {
        if pos < b.len() && b[pos] == b'T' && !in_time {
            in_time = true;
            rank = 0;
            pos += 1;
            continue;
        }

        let start = pos;
        while pos < b.len() && b[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == start {
            break;
        }
        let value: i64 = input[start..pos].parse().ok()?;

        let unit = *b.get(pos)?;
        let (mult, this_rank) = match (in_time, unit) {
            (false, b'Y') => (YEAR, 1),
            (false, b'M') => (MONTH, 2),
            (false, b'D') => (DAY, 3),
            (true, b'H') => (HOUR, 1),
            (true, b'M') => (MINUTE, 2),
            (true, b'S') => (SECOND, 3),
            _ => return None,
        };
        if this_rank <= rank {
            return None;
        }
        rank = this_rank;
        seconds += value * mult;
        components += 1;
        pos += 1;
    }

    if components == 0 {
        return None;
    }
    Some((Span::from_seconds(seconds), pos))
}

/// Colloquial form: optional quantity (fractions allowed), optional
/// space, then a unit word. The result truncates toward zero to whole
/// seconds.
fn parse_colloquial(input: &str) -> Option<(Span, usize)> {
    let b = input.as_bytes();
    let mut pos = 0;

    // Quantity.
    let digits_start = pos;
    while pos < b.len() && b[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut quantity = 1.0f64;
    let mut has_quantity = false;
    if pos > digits_start {
        let mut end = pos;
        if pos < b.len() && b[pos] == b'.' {
            let mut frac = pos + 1;
            while frac < b.len() && b[frac].is_ascii_digit() {
                frac += 1;
            }
            if frac > pos + 1 {
                end = frac;
            }
        }
        quantity = input[digits_start..end].parse().ok()?;
        has_quantity = true;
        pos = end;
        // A single separating space is tolerated.
        if pos < b.len() && b[pos] == b' ' {
            pos += 1;
        }
    }

    // Unit word.
    let word_start = pos;
    while pos < b.len() && b[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    if pos == word_start {
        return None;
    }
    let word = &input[word_start..pos];

    let mult = lookup_unit(word)?;
    if !has_quantity && WORDS.iter().all(|(w, _)| *w != word) {
        // A bare unit without a quantity is not a duration; fixed words
        // stand alone.
        return None;
    }

    let seconds = (quantity * mult as f64).trunc() as i64;
    Some((Span::from_seconds(seconds), pos))
}

fn lookup_unit(word: &str) -> Option<i64> {
    for (name, mult) in WORDS {
        if *name == word {
            return Some(*mult);
        }
    }

    let mut found: Option<i64> = None;
    for (name, mult) in UNITS {
        if name.starts_with(word) {
            if found.is_some() {
                return None; // ambiguous, e.g. "m"
            }
            found = Some(*mult);
        }
    }
    found
}
