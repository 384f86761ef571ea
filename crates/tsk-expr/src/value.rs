//! Tagged variant values with coercion.
//!
//! A `Value` is one of bool, int, real, string, date (epoch seconds) or
//! duration (signed seconds). Values keep their source literal and, when
//! DOM-resolved, the attribute they came from, so that attribute-name-
//! conditioned behaviors (priority ordering, project prefix matching)
//! can apply.
//!
//! Binary operators promote both sides to the richer type in the order
//! bool < int < real < string < duration < date, with the exceptions:
//! date ± duration is a date, date − date is a duration, and string +
//! string concatenates.

use tsk_lex::TokenKind;
use tsk_time::{CalDate, Span};
use tsk_util::{Error, Result};

/// The payload of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    /// Epoch seconds.
    Date(i64),
    /// Signed seconds.
    Duration(i64),
}

/// Promotion rank; richer kinds are greater.
fn rank(data: &Data) -> u8 {
    match data {
        Data::Bool(_) => 0,
        Data::Int(_) => 1,
        Data::Real(_) => 2,
        Data::Str(_) => 3,
        Data::Duration(_) => 4,
        Data::Date(_) => 5,
    }
}

/// Configuration consulted during coercion and matching.
#[derive(Debug, Clone)]
pub struct ValueContext {
    /// Print/parse format for non-ISO dates.
    pub dateformat: String,
    /// First day of the week, 0 = Sunday.
    pub weekstart: u32,
    /// Case sensitivity of `~` and `!~`.
    pub case_sensitive: bool,
}

impl Default for ValueContext {
    fn default() -> Self {
        ValueContext {
            dateformat: "m/d/Y".to_string(),
            weekstart: 1,
            case_sensitive: true,
        }
    }
}

/// A tagged variant value.
#[derive(Debug, Clone)]
pub struct Value {
    data: Data,
    /// The source literal, when the value came from one.
    raw: Option<String>,
    /// How the literal lexed; `Pattern` marks regex right operands.
    raw_kind: Option<TokenKind>,
    /// Attribute name, when DOM-resolved.
    source: Option<String>,
}

impl Value {
    pub fn bool(v: bool) -> Self {
        Value::new(Data::Bool(v))
    }

    pub fn int(v: i64) -> Self {
        Value::new(Data::Int(v))
    }

    pub fn real(v: f64) -> Self {
        Value::new(Data::Real(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::new(Data::Str(v.into()))
    }

    pub fn date(epoch: i64) -> Self {
        Value::new(Data::Date(epoch))
    }

    pub fn duration(seconds: i64) -> Self {
        Value::new(Data::Duration(seconds))
    }

    fn new(data: Data) -> Self {
        Value {
            data,
            raw: None,
            raw_kind: None,
            source: None,
        }
    }

    /// Attach the source literal and its lexed kind.
    pub fn with_raw(mut self, raw: impl Into<String>, kind: TokenKind) -> Self {
        self.raw = Some(raw.into());
        self.raw_kind = Some(kind);
        self
    }

    /// Attach the attribute name this value was resolved from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// True when the source literal was lexed as a regex pattern.
    pub fn is_regex_literal(&self) -> bool {
        self.raw_kind == Some(TokenKind::Pattern)
    }

    /// Build a literal value from a lexed token.
    pub fn from_token(text: &str, kind: TokenKind, ctx: &ValueContext) -> Result<Value> {
        let value = match kind {
            TokenKind::Number => {
                if text.bytes().all(|b| b.is_ascii_digit()) {
                    Value::int(text.parse::<i64>().map_err(|_| {
                        Error::Parse(format!("'{}' is out of range", text))
                    })?)
                } else {
                    Value::real(text.parse::<f64>().map_err(|_| {
                        Error::Parse(format!("'{}' is not a number", text))
                    })?)
                }
            }
            TokenKind::Hex => {
                let digits = text.trim_start_matches("0x");
                Value::int(i64::from_str_radix(digits, 16).map_err(|_| {
                    Error::Parse(format!("'{}' is not a hex number", text))
                })?)
            }
            TokenKind::Date => {
                let date = CalDate::parse(text, &ctx.dateformat, ctx.weekstart)?;
                Value::date(date.epoch())
            }
            TokenKind::Duration => {
                let span = Span::parse_str(text).ok_or_else(|| {
                    Error::Parse(format!("'{}' is not a duration", text))
                })?;
                Value::duration(span.seconds())
            }
            _ => Value::string(text),
        };
        Ok(value.with_raw(text, kind))
    }

    /// Truthiness, used by logical operators and filter results.
    pub fn as_bool(&self) -> bool {
        match &self.data {
            Data::Bool(v) => *v,
            Data::Int(v) => *v != 0,
            Data::Real(v) => *v != 0.0,
            Data::Str(v) => !v.is_empty() && v != "false" && v != "0",
            Data::Date(v) => *v != 0,
            Data::Duration(v) => *v != 0,
        }
    }

    /// String form, used by concatenation, matching and substitution.
    pub fn as_string(&self) -> String {
        match &self.data {
            Data::Bool(v) => if *v { "true" } else { "false" }.to_string(),
            Data::Int(v) => v.to_string(),
            Data::Real(v) => v.to_string(),
            Data::Str(v) => v.clone(),
            Data::Date(v) => v.to_string(),
            Data::Duration(v) => v.to_string(),
        }
    }

    fn as_int(&self) -> Result<i64> {
        match &self.data {
            Data::Bool(v) => Ok(*v as i64),
            Data::Int(v) => Ok(*v),
            Data::Real(v) => Ok(*v as i64),
            Data::Str(v) => v
                .parse::<i64>()
                .map_err(|_| Error::Validation(format!("'{}' is not an integer", v))),
            Data::Date(v) => Ok(*v),
            Data::Duration(v) => Ok(*v),
        }
    }

    fn as_real(&self) -> Result<f64> {
        match &self.data {
            Data::Bool(v) => Ok(*v as i64 as f64),
            Data::Int(v) => Ok(*v as f64),
            Data::Real(v) => Ok(*v),
            Data::Str(v) => v
                .parse::<f64>()
                .map_err(|_| Error::Validation(format!("'{}' is not a number", v))),
            Data::Date(v) => Ok(*v as f64),
            Data::Duration(v) => Ok(*v as f64),
        }
    }

    /// Epoch seconds. Strings parse leniently (named dates included);
    /// the empty string has no date form.
    fn as_date(&self, ctx: &ValueContext) -> Result<Option<i64>> {
        match &self.data {
            Data::Str(v) => {
                if v.is_empty() {
                    return Ok(None);
                }
                let date = CalDate::parse(v, &ctx.dateformat, ctx.weekstart)?;
                Ok(Some(date.epoch()))
            }
            Data::Date(v) => Ok(Some(*v)),
            other => {
                let _ = other;
                Ok(Some(self.as_int()?))
            }
        }
    }

    /// Signed seconds. The empty string has no duration form.
    fn as_duration(&self) -> Result<Option<i64>> {
        match &self.data {
            Data::Str(v) => {
                if v.is_empty() {
                    return Ok(None);
                }
                Span::parse_str(v)
                    .map(|s| Some(s.seconds()))
                    .ok_or_else(|| Error::Validation(format!("'{}' is not a duration", v)))
            }
            Data::Duration(v) => Ok(Some(*v)),
            _ => Ok(Some(self.as_int()?)),
        }
    }

    // ------------------------------------------------------------------
    // Logical operators.

    pub fn and(&self, other: &Value) -> Value {
        Value::bool(self.as_bool() && other.as_bool())
    }

    pub fn or(&self, other: &Value) -> Value {
        Value::bool(self.as_bool() || other.as_bool())
    }

    pub fn xor(&self, other: &Value) -> Value {
        Value::bool(self.as_bool() != other.as_bool())
    }

    pub fn not(&self) -> Value {
        Value::bool(!self.as_bool())
    }

    // ------------------------------------------------------------------
    // Arithmetic.

    pub fn add(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        let target = rank(&self.data).max(rank(&other.data));
        match target {
            5 => {
                // date + duration (either side) → date.
                if matches!((&self.data, &other.data), (Data::Date(_), Data::Date(_))) {
                    return Err(Error::Validation("cannot add two dates".to_string()));
                }
                let l = self.as_date(ctx)?.unwrap_or(0);
                let r = other.as_date(ctx)?.unwrap_or(0);
                Ok(Value::date(l + r))
            }
            4 => {
                if let (Ok(Some(l)), Ok(Some(r))) = (self.as_duration(), other.as_duration()) {
                    return Ok(Value::duration(l + r));
                }
                // A string operand that is not a duration may name a
                // date; the sum is then a date.
                let (date, dur) = if matches!(self.data, Data::Duration(_)) {
                    (other.as_date(ctx)?, self.as_duration()?)
                } else {
                    (self.as_date(ctx)?, other.as_duration()?)
                };
                match (date, dur) {
                    (Some(d), Some(s)) => Ok(Value::date(d + s)),
                    _ => Err(Error::Validation("invalid operands for '+'".to_string())),
                }
            }
            3 => Ok(Value::string(self.as_string() + &other.as_string())),
            2 => Ok(Value::real(self.as_real()? + other.as_real()?)),
            _ => Ok(Value::int(self.as_int()? + other.as_int()?)),
        }
    }

    pub fn sub(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        let target = rank(&self.data).max(rank(&other.data));
        match target {
            5 => {
                if matches!((&self.data, &other.data), (Data::Date(_), Data::Date(_))) {
                    let l = self.as_date(ctx)?.unwrap_or(0);
                    let r = other.as_date(ctx)?.unwrap_or(0);
                    return Ok(Value::duration(l - r));
                }
                let l = self.as_date(ctx)?.unwrap_or(0);
                let r = other.as_date(ctx)?.unwrap_or(0);
                Ok(Value::date(l - r))
            }
            4 => {
                if let (Ok(Some(l)), Ok(Some(r))) = (self.as_duration(), other.as_duration()) {
                    return Ok(Value::duration(l - r));
                }
                // date-naming string minus a duration.
                match (self.as_date(ctx)?, other.as_duration()?) {
                    (Some(d), Some(s)) => Ok(Value::date(d - s)),
                    _ => Err(Error::Validation("invalid operands for '-'".to_string())),
                }
            }
            3 => Err(Error::Validation(
                "cannot subtract strings".to_string(),
            )),
            2 => Ok(Value::real(self.as_real()? - other.as_real()?)),
            _ => Ok(Value::int(self.as_int()? - other.as_int()?)),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        let target = rank(&self.data).max(rank(&other.data));
        match target {
            5 | 3 => Err(Error::Validation("invalid operands for '*'".to_string())),
            4 => {
                // One side is the duration; the other scales it.
                let (secs, factor) = if matches!(self.data, Data::Duration(_)) {
                    (self.as_duration()?.unwrap_or(0), other.as_real()?)
                } else {
                    (other.as_duration()?.unwrap_or(0), self.as_real()?)
                };
                Ok(Value::duration((secs as f64 * factor).trunc() as i64))
            }
            2 => Ok(Value::real(self.as_real()? * other.as_real()?)),
            _ => Ok(Value::int(self.as_int()? * other.as_int()?)),
        }
    }

    pub fn div(&self, other: &Value) -> Result<Value> {
        let target = rank(&self.data).max(rank(&other.data));
        match target {
            5 | 3 => Err(Error::Validation("invalid operands for '/'".to_string())),
            4 => {
                let divisor = other.as_int()?;
                if divisor == 0 {
                    return Err(Error::Validation("division by zero".to_string()));
                }
                Ok(Value::duration(self.as_duration()?.unwrap_or(0) / divisor))
            }
            2 => {
                let divisor = other.as_real()?;
                if divisor == 0.0 {
                    return Err(Error::Validation("division by zero".to_string()));
                }
                Ok(Value::real(self.as_real()? / divisor))
            }
            _ => {
                let divisor = other.as_int()?;
                if divisor == 0 {
                    return Err(Error::Validation("division by zero".to_string()));
                }
                Ok(Value::int(self.as_int()? / divisor))
            }
        }
    }

    pub fn modulo(&self, other: &Value) -> Result<Value> {
        let divisor = other.as_int()?;
        if divisor == 0 {
            return Err(Error::Validation("modulo by zero".to_string()));
        }
        Ok(Value::int(self.as_int()? % divisor))
    }

    pub fn pow(&self, other: &Value) -> Result<Value> {
        if matches!(self.data, Data::Real(_)) || matches!(other.data, Data::Real(_)) {
            return Ok(Value::real(self.as_real()?.powf(other.as_real()?)));
        }
        let exp = other.as_int()?;
        if exp < 0 {
            return Ok(Value::real((self.as_real()?).powf(exp as f64)));
        }
        let exp = u32::try_from(exp)
            .map_err(|_| Error::Validation("exponent out of range".to_string()))?;
        self.as_int()?
            .checked_pow(exp)
            .map(Value::int)
            .ok_or_else(|| Error::Validation("exponent overflow".to_string()))
    }

    pub fn negate(&self, ctx: &ValueContext) -> Result<Value> {
        Value::int(0).sub(self, ctx)
    }

    // ------------------------------------------------------------------
    // Comparison.

    /// Three-way comparison after promotion. Returns `None` when one
    /// side is a date or duration and the other is an empty string:
    /// such comparisons are false both ways.
    fn compare(&self, other: &Value, ctx: &ValueContext) -> Result<Option<std::cmp::Ordering>> {
        use std::cmp::Ordering;

        let target = rank(&self.data).max(rank(&other.data));
        let ord = match target {
            5 => {
                let (l, r) = (self.as_date(ctx)?, other.as_date(ctx)?);
                match (l, r) {
                    (Some(l), Some(r)) => l.cmp(&r),
                    _ => return Ok(None),
                }
            }
            4 => {
                let (l, r) = (self.as_duration()?, other.as_duration()?);
                match (l, r) {
                    (Some(l), Some(r)) => l.cmp(&r),
                    _ => return Ok(None),
                }
            }
            3 => {
                // Priority ordering: "" < L < M < H.
                if self.source() == Some("priority") || other.source() == Some("priority") {
                    priority_rank(&self.as_string()).cmp(&priority_rank(&other.as_string()))
                } else {
                    self.as_string().cmp(&other.as_string())
                }
            }
            2 => {
                let (l, r) = (self.as_real()?, other.as_real()?);
                l.partial_cmp(&r).unwrap_or(Ordering::Equal)
            }
            _ => self.as_int()?.cmp(&other.as_int()?),
        };
        Ok(Some(ord))
    }

    /// An unset attribute has no position in an ordering; comparisons
    /// against it fail both ways. Priority is the exception: the empty
    /// priority orders below `L`.
    fn orderable(&self, other: &Value) -> bool {
        if self.source() == Some("priority") || other.source() == Some("priority") {
            return true;
        }
        !matches!(&self.data, Data::Str(s) if s.is_empty())
            && !matches!(&other.data, Data::Str(s) if s.is_empty())
    }

    pub fn lt(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(
            self.orderable(other)
                && self.compare(other, ctx)? == Some(std::cmp::Ordering::Less),
        ))
    }

    pub fn le(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(
            self.orderable(other)
                && matches!(
                    self.compare(other, ctx)?,
                    Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
                ),
        ))
    }

    pub fn gt(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(
            self.orderable(other)
                && self.compare(other, ctx)? == Some(std::cmp::Ordering::Greater),
        ))
    }

    pub fn ge(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(
            self.orderable(other)
                && matches!(
                    self.compare(other, ctx)?,
                    Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                ),
        ))
    }

    /// Exact equality (`==`).
    pub fn eq_exact(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(
            self.compare(other, ctx)? == Some(std::cmp::Ordering::Equal),
        ))
    }

    /// Partial equality (`=`): for project-path-like attributes the
    /// right side matches when it is a leftmost path component of the
    /// left; everywhere else it is exact.
    pub fn eq_partial(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        if matches!(self.source(), Some("project") | Some("recur")) {
            if let (Data::Str(left), Data::Str(right)) = (&self.data, &other.data) {
                return Ok(Value::bool(leftmost_match(left, right)));
            }
        }
        // Partial UUID prefixes compare by prefix.
        if self.source() == Some("uuid") {
            let left = self.as_string();
            let right = other.as_string();
            if right.len() >= 8 && right.len() < 36 {
                return Ok(Value::bool(left.starts_with(&right)));
            }
        }
        self.eq_exact(other, ctx)
    }

    pub fn ne_exact(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(!self.eq_exact(other, ctx)?.as_bool()))
    }

    pub fn ne_partial(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(!self.eq_partial(other, ctx)?.as_bool()))
    }

    // ------------------------------------------------------------------
    // Matching.

    /// `~`: regex match when the right operand was lexed as a regex,
    /// substring containment otherwise. Case sensitivity from the
    /// context.
    pub fn matches(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        let haystack = self.as_string();
        let needle = other.as_string();

        if other.is_regex_literal() {
            let re = regex::RegexBuilder::new(&needle)
                .case_insensitive(!ctx.case_sensitive)
                .build()
                .map_err(|e| Error::Parse(format!("bad regex '{}': {}", needle, e)))?;
            return Ok(Value::bool(re.is_match(&haystack)));
        }

        if ctx.case_sensitive {
            Ok(Value::bool(haystack.contains(&needle)))
        } else {
            Ok(Value::bool(
                haystack.to_lowercase().contains(&needle.to_lowercase()),
            ))
        }
    }

    pub fn no_match(&self, other: &Value, ctx: &ValueContext) -> Result<Value> {
        Ok(Value::bool(!self.matches(other, ctx)?.as_bool()))
    }
}

/// Priority letters order below any other value: "" < L < M < H.
fn priority_rank(p: &str) -> u8 {
    match p {
        "" => 0,
        "L" => 1,
        "M" => 2,
        "H" => 3,
        _ => 4,
    }
}

/// True when `right` is a leftmost path component prefix of `left`:
/// `Home` matches `Home` and `Home.Garden` but not `Homework`.
fn leftmost_match(left: &str, right: &str) -> bool {
    if right.is_empty() {
        return left.is_empty();
    }
    if let Some(rest) = left.strip_prefix(right) {
        return rest.is_empty() || rest.starts_with('.');
    }
    false
}
