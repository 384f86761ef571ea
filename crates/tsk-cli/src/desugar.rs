//! Filter-side desugaring.
//!
//! Each pass walks the vector and rewrites syntactic sugar on FILTER
//! nodes into explicit infix terms. A node is rewritten at most once:
//! nodes produced by an earlier pass are never candidates again.

use tsk_util::{Error, Result};

use crate::arg::{Arg, ArgTag};
use crate::pipeline::Pipeline;
use crate::scan::Scanner;

/// A FILTER node that no pass has classified yet.
fn is_sugar_candidate(arg: &Arg) -> bool {
    arg.has_tag(ArgTag::Filter)
        && !arg.has_tag(ArgTag::Op)
        && !arg.has_tag(ArgTag::Attribute)
        && !arg.has_tag(ArgTag::AttMod)
        && !arg.has_tag(ArgTag::Literal)
        && !arg.has_tag(ArgTag::Regex)
        && !arg.has_tag(ArgTag::Number)
        && !arg.has_tag(ArgTag::Str)
        && !arg.has_tag(ArgTag::Id)
        && !arg.has_tag(ArgTag::Uuid)
}

fn filter_arg(raw: impl Into<String>, tag: ArgTag) -> Arg {
    let mut arg = Arg::tagged(raw, tag);
    arg.tag(ArgTag::Filter);
    arg
}

impl Pipeline {
    /// `+tag` → `tags _hastag_ tag`; `-tag` → `tags _notag_ tag`.
    pub(crate) fn desugar_tags(&mut self) {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in self.args.drain(..) {
            if !is_sugar_candidate(&arg) {
                reconstructed.push(arg);
                continue;
            }

            let mut chars = arg.raw.chars();
            let sign = chars.next();
            let tag: String = chars.collect();

            if matches!(sign, Some('+') | Some('-')) && !tag.is_empty() && !tag.contains(' ') {
                reconstructed.push(filter_arg("tags", ArgTag::Attribute));
                let op = if sign == Some('+') {
                    "_hastag_"
                } else {
                    "_notag_"
                };
                reconstructed.push(filter_arg(op, ArgTag::Op));
                reconstructed.push(filter_arg(tag, ArgTag::Literal));
            } else {
                reconstructed.push(arg);
            }
        }

        self.args = reconstructed;
    }

    /// `<name>:<value>` → `name = value` (`==` for `status`); UDA and
    /// pseudo attributes route to their own shapes.
    pub(crate) fn desugar_attributes(&mut self) -> Result<()> {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in std::mem::take(&mut self.args) {
            if !is_sugar_candidate(&arg) {
                reconstructed.push(arg);
                continue;
            }

            let mut s = Scanner::new(&arg.raw);
            let name = match s.get_name() {
                Some(name) if !name.is_empty() && s.skip(':') => name,
                _ => {
                    reconstructed.push(arg);
                    continue;
                }
            };

            let value = s
                .quoted('"')
                .or_else(|| s.quoted('\''))
                .or_else(|| s.rest())
                .unwrap_or_default();

            if let Some(canonical) = self.canon_soft("uda", &name) {
                let mut lhs = filter_arg(&name, ArgTag::Uda);
                lhs.tag(ArgTag::Attribute);
                lhs.attrs.name = Some(canonical);
                reconstructed.push(lhs);
                reconstructed.push(filter_arg("=", ArgTag::Op));
                reconstructed.push(filter_arg(value, ArgTag::Literal));
            } else if let Some(canonical) = self.canon_soft("pseudo", &name) {
                let mut node = Arg::tagged(&name, ArgTag::Pseudo);
                node.attrs.name = Some(canonical);
                node.attrs.value = Some(value);
                reconstructed.push(node);
            } else if let Some(canonical) = self.canon_soft("attribute", &name) {
                let operator = if canonical == "status" { "==" } else { "=" };
                let mut lhs = filter_arg(&name, ArgTag::Attribute);
                lhs.attrs.name = Some(canonical);
                reconstructed.push(lhs);
                reconstructed.push(filter_arg(operator, ArgTag::Op));
                reconstructed.push(filter_arg(value, ArgTag::Literal));
            } else {
                reconstructed.push(arg);
            }
        }

        self.args = reconstructed;
        Ok(())
    }

    /// `<name>.<mod>[:=]<value>` → `name <op> <literal>` per the
    /// modifier table. A `~` after the dot inverts the sense.
    pub(crate) fn desugar_attribute_modifiers(&mut self) -> Result<()> {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in std::mem::take(&mut self.args) {
            if !is_sugar_candidate(&arg) {
                reconstructed.push(arg);
                continue;
            }

            let mut s = Scanner::new(&arg.raw);
            let name = s.until('.');
            if name.is_empty() {
                reconstructed.push(arg);
                continue;
            }
            let canonical = match self
                .canon_soft("attribute", &name)
                .or_else(|| self.canon_soft("uda", &name))
            {
                Some(c) => c,
                None => {
                    reconstructed.push(arg);
                    continue;
                }
            };
            if !s.skip('.') {
                reconstructed.push(arg);
                continue;
            }

            let sense = if s.skip('~') { "-" } else { "+" };
            let modifier = s.until_one_of(":=");
            if !s.skip(':') && !s.skip('=') {
                reconstructed.push(arg);
                continue;
            }
            let value = s
                .quoted('"')
                .or_else(|| s.quoted('\''))
                .or_else(|| s.rest())
                .unwrap_or_default();

            let (op, rhs_raw, regex) = modifier_rewrite(&modifier, &value)?;
            let op = if sense == "-" { complement(op) } else { op };

            let mut lhs = filter_arg(&name, ArgTag::AttMod);
            lhs.attrs.name = Some(canonical);
            lhs.attrs.modifier = Some(modifier);
            lhs.attrs.sense = Some(sense.to_string());
            reconstructed.push(lhs);
            reconstructed.push(filter_arg(op, ArgTag::Op));
            reconstructed.push(filter_arg(
                rhs_raw,
                if regex { ArgTag::Regex } else { ArgTag::Literal },
            ));
        }

        self.args = reconstructed;
        Ok(())
    }

    /// `/pattern/` → `description ~ 'pattern'`.
    pub(crate) fn desugar_patterns(&mut self) {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in self.args.drain(..) {
            if !is_sugar_candidate(&arg) {
                reconstructed.push(arg);
                continue;
            }

            let mut s = Scanner::new(&arg.raw);
            match s.quoted('/') {
                Some(pattern) if s.depleted() && !pattern.is_empty() => {
                    reconstructed.push(filter_arg("description", ArgTag::Attribute));
                    reconstructed.push(filter_arg("~", ArgTag::Op));
                    reconstructed.push(filter_arg(format!("'{}'", pattern), ArgTag::Literal));
                }
                _ => reconstructed.push(arg),
            }
        }

        self.args = reconstructed;
    }

    /// ID sequences (`1`, `1,3`, `3-5`, combinations) → a parenthesized
    /// disjunction over `id` equalities and ranges.
    pub(crate) fn desugar_ids(&mut self) -> Result<()> {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in self.args.drain(..) {
            if !is_sugar_candidate(&arg)
                || !arg.raw.bytes().all(|b| b.is_ascii_digit() || b == b',' || b == b'-')
            {
                reconstructed.push(arg);
                continue;
            }

            match parse_id_ranges(&arg.raw)? {
                Some(ranges) => {
                    let id_arg = |raw: String, tag: ArgTag| {
                        let mut a = filter_arg(raw, tag);
                        a.tag(ArgTag::Id);
                        a
                    };

                    reconstructed.push(id_arg("(".to_string(), ArgTag::Op));
                    for (i, (lo, hi)) in ranges.iter().enumerate() {
                        if i > 0 {
                            reconstructed.push(id_arg("or".to_string(), ArgTag::Op));
                        }
                        if lo == hi {
                            reconstructed.push(id_arg("id".to_string(), ArgTag::Attribute));
                            reconstructed.push(id_arg("==".to_string(), ArgTag::Op));
                            reconstructed.push(id_arg(lo.to_string(), ArgTag::Number));
                        } else {
                            reconstructed.push(id_arg("(".to_string(), ArgTag::Op));
                            reconstructed.push(id_arg("id".to_string(), ArgTag::Attribute));
                            reconstructed.push(id_arg(">=".to_string(), ArgTag::Op));
                            reconstructed.push(id_arg(lo.to_string(), ArgTag::Number));
                            reconstructed.push(id_arg("and".to_string(), ArgTag::Op));
                            reconstructed.push(id_arg("id".to_string(), ArgTag::Attribute));
                            reconstructed.push(id_arg("<=".to_string(), ArgTag::Op));
                            reconstructed.push(id_arg(hi.to_string(), ArgTag::Number));
                            reconstructed.push(id_arg(")".to_string(), ArgTag::Op));
                        }
                    }
                    reconstructed.push(id_arg(")".to_string(), ArgTag::Op));
                }
                None => reconstructed.push(arg),
            }
        }

        self.args = reconstructed;
        Ok(())
    }

    /// UUID lists (full or partial, comma-separated) → a disjunction
    /// over `uuid = '...'`.
    pub(crate) fn desugar_uuids(&mut self) -> Result<()> {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());

        for arg in self.args.drain(..) {
            let hex_charset = arg
                .raw
                .bytes()
                .all(|b| b.is_ascii_hexdigit() || b == b'-' || b == b',');
            if !is_sugar_candidate(&arg) || !hex_charset {
                reconstructed.push(arg);
                continue;
            }

            match parse_uuid_list(&arg.raw)? {
                Some(uuids) => {
                    let uuid_arg = |raw: String, tag: ArgTag| {
                        let mut a = filter_arg(raw, tag);
                        a.tag(ArgTag::Uuid);
                        a
                    };

                    reconstructed.push(uuid_arg("(".to_string(), ArgTag::Op));
                    for (i, uuid) in uuids.iter().enumerate() {
                        if i > 0 {
                            reconstructed.push(uuid_arg("or".to_string(), ArgTag::Op));
                        }
                        reconstructed.push(uuid_arg("uuid".to_string(), ArgTag::Attribute));
                        reconstructed.push(uuid_arg("=".to_string(), ArgTag::Op));
                        reconstructed.push(uuid_arg(format!("'{}'", uuid), ArgTag::Str));
                    }
                    reconstructed.push(uuid_arg(")".to_string(), ArgTag::Op));
                }
                None => reconstructed.push(arg),
            }
        }

        self.args = reconstructed;
        Ok(())
    }

    /// Canonicalize, treating ambiguity as a miss. Unrecognized
    /// arguments stay words; only command lookup reports ambiguity.
    pub(crate) fn canon_soft(&self, category: &str, value: &str) -> Option<String> {
        self.entities()
            .canonicalize(category, value)
            .ok()
            .flatten()
    }
}

/// The modifier table: modifier name and value → operator, right-hand
/// raw text and whether the right side is a regex.
fn modifier_rewrite(modifier: &str, value: &str) -> Result<(&'static str, String, bool)> {
    let rewrite = match modifier {
        "before" | "under" | "below" => ("<", value.to_string(), false),
        "after" | "over" | "above" => (">", value.to_string(), false),
        "none" => ("==", "''".to_string(), false),
        "any" => ("!=", "''".to_string(), false),
        "is" | "equals" => ("==", value.to_string(), false),
        "isnt" | "not" => ("!=", value.to_string(), false),
        "has" | "contains" => ("~", value.to_string(), false),
        "hasnt" => ("!~", value.to_string(), false),
        "startswith" | "left" => ("~", format!("'^{}'", value), true),
        "endswith" | "right" => ("~", format!("'{}$'", value), true),
        "word" => ("~", format!("'\\b{}\\b'", value), true),
        "noword" => ("!~", format!("'\\b{}\\b'", value), true),
        other => {
            return Err(Error::Parse(format!(
                "unknown attribute modifier '{}'",
                other
            )))
        }
    };
    Ok(rewrite)
}

/// Complement an operator for an inverted modifier sense.
fn complement(op: &'static str) -> &'static str {
    match op {
        "<" => ">=",
        ">" => "<=",
        "==" => "!=",
        "!=" => "==",
        "~" => "!~",
        "!~" => "~",
        other => other,
    }
}

/// Parse an ID sequence into (lo, hi) ranges. `Ok(None)` when the text
/// is not a pure ID sequence; an error on an inverted range.
fn parse_id_ranges(raw: &str) -> Result<Option<Vec<(u64, u64)>>> {
    let mut ranges = Vec::new();

    for element in raw.split(',') {
        let terms: Vec<&str> = element.split('-').collect();
        match terms.as_slice() {
            [single] => {
                if single.is_empty() || !single.bytes().all(|b| b.is_ascii_digit()) {
                    return Ok(None);
                }
                let id: u64 = single
                    .parse()
                    .map_err(|_| Error::Parse(format!("'{}' is not an ID", single)))?;
                ranges.push((id, id));
            }
            [lo, hi] => {
                if lo.is_empty()
                    || hi.is_empty()
                    || !lo.bytes().all(|b| b.is_ascii_digit())
                    || !hi.bytes().all(|b| b.is_ascii_digit())
                {
                    return Ok(None);
                }
                let lo: u64 = lo
                    .parse()
                    .map_err(|_| Error::Parse(format!("'{}' is not an ID", lo)))?;
                let hi: u64 = hi
                    .parse()
                    .map_err(|_| Error::Parse(format!("'{}' is not an ID", hi)))?;
                if lo > hi {
                    return Err(Error::Parse(format!(
                        "inverted range '{}' in ID sequence",
                        element
                    )));
                }
                ranges.push((lo, hi));
            }
            _ => return Ok(None),
        }
    }

    if ranges.is_empty() {
        return Ok(None);
    }
    Ok(Some(ranges))
}

/// Parse a comma-separated UUID list. `Ok(None)` when the first element
/// is not a UUID; an error when a later element is malformed.
fn parse_uuid_list(raw: &str) -> Result<Option<Vec<String>>> {
    let mut uuids = Vec::new();

    let mut first = true;
    for element in raw.split(',') {
        if !is_uuid(element) {
            if first {
                return Ok(None);
            }
            return Err(Error::Parse(format!(
                "'{}' is not a UUID in the UUID list",
                element
            )));
        }
        uuids.push(element.to_string());
        first = false;
    }

    Ok(Some(uuids))
}

/// Full (36 char) or partial (8-35 char) canonical-layout UUID.
fn is_uuid(text: &str) -> bool {
    const PATTERN: &[u8; 36] = b"xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";
    let bytes = text.as_bytes();
    if bytes.len() < 8 || bytes.len() > 36 {
        return false;
    }
    bytes.iter().zip(PATTERN.iter()).all(|(b, p)| {
        if *p == b'x' {
            b.is_ascii_hexdigit()
        } else {
            *b == b'-'
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_ranges() {
        assert_eq!(parse_id_ranges("5").unwrap(), Some(vec![(5, 5)]));
        assert_eq!(
            parse_id_ranges("1,3-5").unwrap(),
            Some(vec![(1, 1), (3, 5)])
        );
        assert_eq!(parse_id_ranges("-").unwrap(), None);
        assert_eq!(parse_id_ranges("1-2-3").unwrap(), None);
        assert!(parse_id_ranges("5-3").is_err());
    }

    #[test]
    fn test_parse_uuid_list() {
        let full = "a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5";
        assert_eq!(
            parse_uuid_list(full).unwrap(),
            Some(vec![full.to_string()])
        );
        assert_eq!(
            parse_uuid_list("a0b1c2d3,deadbeef").unwrap(),
            Some(vec!["a0b1c2d3".to_string(), "deadbeef".to_string()])
        );
        // Not a UUID at all.
        assert_eq!(parse_uuid_list("abc").unwrap(), None);
        // Malformed after a valid first element.
        assert!(parse_uuid_list("a0b1c2d3,xyz").is_err());
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("a0b1c2d3"));
        assert!(is_uuid("a0b1c2d3-e4f5"));
        assert!(!is_uuid("a0b1c2d"));
        assert!(!is_uuid("a0b1c2d3x"));
        assert!(!is_uuid("a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5ff"));
    }

    #[test]
    fn test_modifier_rewrite() {
        assert_eq!(modifier_rewrite("before", "eom").unwrap(), ("<", "eom".into(), false));
        assert_eq!(modifier_rewrite("none", "").unwrap(), ("==", "''".into(), false));
        assert_eq!(
            modifier_rewrite("startswith", "Home").unwrap(),
            ("~", "'^Home'".into(), true)
        );
        let (op, raw, regex) = modifier_rewrite("word", "milk").unwrap();
        assert_eq!(op, "~");
        assert_eq!(raw, "'\\bmilk\\b'");
        assert!(regex);
        assert!(modifier_rewrite("bogus", "x").is_err());
    }

    #[test]
    fn test_complement() {
        assert_eq!(complement("<"), ">=");
        assert_eq!(complement("~"), "!~");
        assert_eq!(complement("=="), "!=");
    }
}
