//! The ordered argument-pipeline passes.
//!
//! Each pass reads and rewrites the argument vector; relative ordering
//! of surviving arguments is preserved. The passes are idempotent, so a
//! re-run after default-command injection cannot re-classify settled
//! nodes.

use rustc_hash::FxHashMap;
use tracing::trace;

use tsk_lex::{Lexer, Token, TokenKind};
use tsk_util::Result;

use crate::arg::{Arg, ArgTag};
use crate::entities::Entities;

/// Alias expansion gives up after this many rounds.
const ALIAS_SAFETY_CEILING: usize = 10;

/// Program basenames that mark the standard invocation.
const TW_NAMES: &[&str] = &["task", "tsk", "tw", "t"];

/// Program basenames that mark the calendar invocation.
const CALENDAR_NAMES: &[&str] = &["cal", "calendar"];

/// The argument pipeline.
pub struct Pipeline {
    pub args: Vec<Arg>,
    entities: Entities,
    aliases: FxHashMap<String, String>,
    default_command: Option<String>,
    modifiable: Vec<String>,
}

impl Pipeline {
    pub fn new(
        entities: Entities,
        aliases: FxHashMap<String, String>,
        default_command: Option<String>,
        modifiable: Vec<String>,
    ) -> Self {
        Pipeline {
            args: Vec::new(),
            entities,
            aliases,
            default_command,
            modifiable,
        }
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub(crate) fn is_modifiable(&self, attribute: &str) -> bool {
        self.modifiable.iter().any(|m| m == attribute)
    }

    /// Pass 1: capture argv. The first element is the BINARY and
    /// carries its basename; later elements are plain ORIGINAL nodes.
    pub fn capture(&mut self, argv: &[String]) {
        for (i, raw) in argv.iter().enumerate() {
            let mut arg = Arg::tagged(raw.clone(), ArgTag::Original);
            if i == 0 {
                arg.tag(ArgTag::Binary);
                let basename = raw.rsplit('/').next().unwrap_or("task").to_string();
                if TW_NAMES.contains(&basename.as_str()) {
                    arg.tag(ArgTag::Tw);
                } else if CALENDAR_NAMES.contains(&basename.as_str()) {
                    arg.tag(ArgTag::Calendar);
                }
                arg.attrs.basename = Some(basename);
            }
            self.args.push(arg);
        }
    }

    /// Append tokens read from standard input; they behave as if typed,
    /// with an extra STDIN tag.
    pub fn capture_stdin(&mut self, words: &[String]) {
        for raw in words {
            let mut arg = Arg::tagged(raw.clone(), ArgTag::Original);
            arg.tag(ArgTag::Stdin);
            self.args.push(arg);
        }
    }

    /// Run every pass in order.
    pub fn analyze(&mut self) -> Result<()> {
        self.alias_expansion();
        self.find_overrides();
        self.categorize()?;

        self.desugar_tags();
        self.desugar_attributes()?;
        self.desugar_attribute_modifiers()?;
        self.desugar_patterns();
        self.desugar_ids()?;
        self.desugar_uuids()?;
        self.find_operators();
        self.insert_junctions();

        self.decompose_mod_attributes()?;
        self.decompose_mod_attribute_modifiers()?;
        self.decompose_mod_tags();
        self.decompose_mod_substitutions();

        self.inject_defaults()?;
        Ok(())
    }

    /// Pass 2: replace aliases with their lexed expansions, repeating
    /// to a fixed point or the safety ceiling.
    fn alias_expansion(&mut self) {
        let mut counter = 0;
        loop {
            let mut action = false;
            let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());
            let mut terminated = false;

            for arg in std::mem::take(&mut self.args) {
                if arg.raw == "--" {
                    terminated = true;
                }

                if terminated || arg.has_tag(ArgTag::Binary) {
                    reconstructed.push(arg);
                    continue;
                }

                match self.aliases.get(&arg.raw) {
                    Some(expansion) => {
                        trace!(alias = %arg.raw, %expansion, "expanding alias");
                        for token in Lexer::split(expansion) {
                            let mut a = Arg::tagged(token.text, ArgTag::Alias);
                            a.tag(ArgTag::Lex);
                            reconstructed.push(a);
                        }
                        action = true;
                    }
                    None => reconstructed.push(arg),
                }
            }

            self.args = reconstructed;
            counter += 1;
            if !action || counter >= ALIAS_SAFETY_CEILING {
                break;
            }
        }
    }

    /// Pass 3: `rc:<path>` and `rc.<name>[:=]<value>` overrides, not
    /// past `--`.
    fn find_overrides(&mut self) {
        let mut terminated = false;
        for arg in &mut self.args {
            if arg.raw == "--" {
                terminated = true;
            }
            if terminated {
                continue;
            }

            if let Some(path) = arg.raw.strip_prefix("rc:") {
                let path = path.to_string();
                arg.tag(ArgTag::Rc);
                arg.attrs.file = Some(path);
            } else if let Some(setting) = arg.raw.strip_prefix("rc.") {
                let setting = setting.to_string();
                let sep = setting.find('=').or_else(|| setting.find(':'));
                if let Some(sep) = sep {
                    arg.tag(ArgTag::Config);
                    arg.attrs.name = Some(setting[..sep].to_string());
                    arg.attrs.value = Some(setting[sep + 1..].to_string());
                }
            }
        }
    }

    /// Pass 4: find the command; everything after `--` is a literal
    /// word; remaining args become FILTER or MODIFICATION depending on
    /// whether the command is read-only.
    ///
    /// Idempotent: settled nodes are not re-classified, so the pass can
    /// re-run after default injection.
    fn categorize(&mut self) -> Result<()> {
        let mut found_command = self.args.iter().any(|a| a.has_tag(ArgTag::Cmd));
        let mut read_only = self
            .args
            .iter()
            .find(|a| a.has_tag(ArgTag::Cmd))
            .map(|a| a.has_tag(ArgTag::ReadCmd))
            .unwrap_or(true);
        let mut terminated = false;

        for arg in &mut self.args {
            if arg.raw == "--" && !terminated && !arg.has_tag(ArgTag::Terminated) {
                arg.untag_all();
                arg.tag(ArgTag::Original);
                arg.tag(ArgTag::Terminator);
                terminated = true;
                continue;
            }

            if terminated {
                if !arg.has_tag(ArgTag::Terminated) {
                    arg.untag_all();
                    arg.tag(ArgTag::Original);
                    arg.tag(ArgTag::Terminated);
                    arg.tag(ArgTag::Word);
                }
                continue;
            }

            if arg.has_tag(ArgTag::Binary)
                || arg.has_tag(ArgTag::Rc)
                || arg.has_tag(ArgTag::Config)
                || arg.has_tag(ArgTag::Cmd)
                || arg.has_tag(ArgTag::Filter)
                || arg.has_tag(ArgTag::Modification)
                || arg.has_tag(ArgTag::Pseudo)
            {
                continue;
            }

            if !found_command {
                if let Some(canonical) = self.entities.canonicalize("cmd", &arg.raw)? {
                    read_only = !self.entities.exact_match("writecmd", &canonical);
                    arg.tag(ArgTag::Cmd);
                    arg.tag(if read_only {
                        ArgTag::ReadCmd
                    } else {
                        ArgTag::WriteCmd
                    });
                    if canonical.starts_with('_') {
                        arg.tag(ArgTag::Helper);
                    }
                    arg.attrs.canonical = Some(canonical);
                    found_command = true;
                    continue;
                }
            }

            if found_command && !read_only {
                arg.tag(ArgTag::Modification);
            } else {
                arg.tag(ArgTag::Filter);
            }
        }

        Ok(())
    }

    /// Pass 6: re-tag FILTER nodes whose raw text is a known operator.
    pub(crate) fn find_operators(&mut self) {
        let operators: Vec<&String> = self.entities.names("operator").iter().collect();
        for arg in &mut self.args {
            if arg.has_tag(ArgTag::Filter) && operators.iter().any(|o| **o == arg.raw) {
                arg.tag(ArgTag::Op);
            }
        }
    }

    /// Pass 7: insert junctions between adjacent FILTER terms.
    ///
    /// Consecutive ID/UUID sequences take `or`; any other adjacency
    /// that does not already supply an operator takes `and`:
    /// `) <non-op>`, `<non-op> (`, `) (`, `<non-op> <non-op>`.
    pub(crate) fn insert_junctions(&mut self) {
        let mut reconstructed: Vec<Arg> = Vec::with_capacity(self.args.len());
        let mut prev: Option<Arg> = None;

        for arg in self.args.drain(..) {
            if arg.has_tag(ArgTag::Filter) {
                if let Some(prev) = &prev {
                    let prev_seq = prev.has_tag(ArgTag::Id) || prev.has_tag(ArgTag::Uuid);
                    let this_seq = arg.has_tag(ArgTag::Id) || arg.has_tag(ArgTag::Uuid);

                    if prev_seq && this_seq {
                        if prev.raw == ")" && arg.raw == "(" {
                            let mut or = Arg::tagged("or", ArgTag::Filter);
                            or.tag(ArgTag::Op);
                            reconstructed.push(or);
                        }
                    } else {
                        let prev_op = prev.has_tag(ArgTag::Op);
                        let this_op = arg.has_tag(ArgTag::Op);
                        if (!prev_op && arg.raw == "(")
                            || (!prev_op && !this_op)
                            || (prev.raw == ")" && !this_op)
                            || (prev.raw == ")" && arg.raw == "(")
                        {
                            let mut and = Arg::tagged("and", ArgTag::Filter);
                            and.tag(ArgTag::Op);
                            reconstructed.push(and);
                        }
                    }
                }
                prev = Some(arg.clone());
            }

            reconstructed.push(arg);
        }

        self.args = reconstructed;
    }

    /// Pass 9: when no command was found, an ID/UUID-only filter means
    /// the implicit `information` command; an otherwise contentful or
    /// empty command line takes the configured `default.command`.
    fn inject_defaults(&mut self) -> Result<()> {
        if self.args.iter().any(|a| a.has_tag(ArgTag::Cmd)) {
            return Ok(());
        }

        let has_sequence = self
            .args
            .iter()
            .any(|a| a.has_tag(ArgTag::Id) || a.has_tag(ArgTag::Uuid));
        let has_other = self.args.iter().any(|a| {
            a.has_tag(ArgTag::Filter)
                && !a.has_tag(ArgTag::Id)
                && !a.has_tag(ArgTag::Uuid)
                && !(a.has_tag(ArgTag::Op) && (a.raw == "or" || a.raw == "and"))
        });

        if has_sequence && !has_other {
            let mut info = Arg::tagged("information", ArgTag::Cmd);
            info.tag(ArgTag::ReadCmd);
            info.tag(ArgTag::Assumed);
            info.tag(ArgTag::Default);
            info.attrs.canonical = Some("information".to_string());
            self.args.push(info);
            return Ok(());
        }

        if let Some(default_command) = self.default_command.clone() {
            if !default_command.is_empty() {
                let insert_at = self
                    .args
                    .iter()
                    .position(|a| a.has_tag(ArgTag::Binary))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                for (offset, token) in Lexer::split(&default_command).into_iter().enumerate() {
                    let mut a = Arg::tagged(token.text, ArgTag::Default);
                    a.tag(ArgTag::Lex);
                    self.args.insert(insert_at + offset, a);
                }
                self.categorize()?;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Extraction.

    /// The canonical command name and its read-only flag.
    pub fn command(&self) -> Option<(String, bool)> {
        self.args.iter().find(|a| a.has_tag(ArgTag::Cmd)).map(|a| {
            (
                a.attrs
                    .canonical
                    .clone()
                    .unwrap_or_else(|| a.raw.clone()),
                a.has_tag(ArgTag::ReadCmd),
            )
        })
    }

    /// `rc:<path>` override, last occurrence wins.
    pub fn rc_file(&self) -> Option<String> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Rc))
            .filter_map(|a| a.attrs.file.clone())
            .last()
    }

    /// `rc.<name>[:=]<value>` overrides, in order.
    pub fn config_overrides(&self) -> Vec<(String, String)> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Config))
            .filter_map(|a| {
                Some((a.attrs.name.clone()?, a.attrs.value.clone()?))
            })
            .collect()
    }

    /// Words after the `--` terminator.
    pub fn terminated_words(&self) -> Vec<String> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Terminated))
            .map(|a| a.raw.clone())
            .collect()
    }

    /// The FILTER-tagged nodes.
    pub fn filter_args(&self) -> Vec<&Arg> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Filter))
            .collect()
    }

    /// The MODIFICATION-tagged nodes, in order.
    pub fn modification_args(&self) -> Vec<&Arg> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Modification))
            .collect()
    }

    /// Pseudo-attribute nodes (`limit:`), consumed by reports.
    pub fn pseudo_args(&self) -> Vec<&Arg> {
        self.args
            .iter()
            .filter(|a| a.has_tag(ArgTag::Pseudo))
            .collect()
    }

    /// Flatten the FILTER nodes into expression tokens.
    ///
    /// Desugared literals become string/number tokens directly;
    /// REGEX-marked literals become pattern tokens so the match
    /// operator selects regex semantics; everything else is re-lexed.
    pub fn filter_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for arg in self.filter_args() {
            if arg.has_tag(ArgTag::Op) {
                tokens.push(Token::new(arg.raw.clone(), TokenKind::Op));
            } else if arg.has_tag(ArgTag::Regex) {
                tokens.push(Token::new(strip_quotes(&arg.raw), TokenKind::Pattern));
            } else if arg.has_tag(ArgTag::Number) {
                tokens.push(Token::new(arg.raw.clone(), TokenKind::Number));
            } else if arg.has_tag(ArgTag::Str) || arg.has_tag(ArgTag::Literal) {
                tokens.push(Token::new(strip_quotes(&arg.raw), TokenKind::String));
            } else {
                // Attribute nodes carry their canonical name; prefer it
                // over an abbreviated raw.
                let term = arg.attrs.name.as_deref().unwrap_or(arg.raw.as_str());
                tokens.extend(Lexer::split(term));
            }
        }
        tokens
    }

    /// Render the vector for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for arg in &self.args {
            out.push_str(&format!("{:?} {:?}\n", arg.raw, arg.tags()));
        }
        out
    }
}

/// Strip one layer of matching quotes.
fn strip_quotes(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::arg::ArgTag;

    pub(crate) fn test_entities() -> Entities {
        let mut e = Entities::new();
        for cmd in [
            "add",
            "annotate",
            "append",
            "count",
            "delete",
            "done",
            "export",
            "help",
            "information",
            "list",
            "modify",
            "prepend",
            "projects",
            "start",
            "stop",
            "tags",
            "undo",
            "version",
        ] {
            e.add("cmd", cmd);
        }
        for cmd in [
            "add", "annotate", "append", "delete", "done", "modify", "prepend", "start", "stop",
            "undo",
        ] {
            e.add("writecmd", cmd);
        }
        for attr in [
            "description",
            "status",
            "project",
            "priority",
            "due",
            "scheduled",
            "start",
            "end",
            "entry",
            "until",
            "wait",
            "recur",
            "depends",
            "tags",
            "uuid",
            "id",
        ] {
            e.add("attribute", attr);
        }
        e.add("pseudo", "limit");
        for op in tsk_expr::ops::names() {
            e.add("operator", op);
        }
        e
    }

    pub(crate) fn analyzed(argv: &[&str]) -> Pipeline {
        let mut p = Pipeline::new(
            test_entities(),
            FxHashMap::default(),
            None,
            vec!["description".into(), "project".into(), "due".into()],
        );
        let args: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        p.capture(&args);
        p.analyze().expect("analyze");
        p
    }

    fn filter_text(p: &Pipeline) -> String {
        p.filter_tokens()
            .iter()
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_capture_binary() {
        let p = analyzed(&["/usr/bin/task", "list"]);
        assert!(p.args[0].has_tag(ArgTag::Binary));
        assert!(p.args[0].has_tag(ArgTag::Tw));
        assert_eq!(p.args[0].attrs.basename.as_deref(), Some("task"));
    }

    #[test]
    fn test_command_detection() {
        let p = analyzed(&["task", "list"]);
        assert_eq!(p.command(), Some(("list".to_string(), true)));

        let p = analyzed(&["task", "done"]);
        assert_eq!(p.command(), Some(("done".to_string(), false)));
    }

    #[test]
    fn test_command_prefix_completion() {
        let p = analyzed(&["task", "lis"]);
        assert_eq!(p.command(), Some(("list".to_string(), true)));
    }

    #[test]
    fn test_filter_vs_modification() {
        let p = analyzed(&["task", "project:Home", "list"]);
        assert!(p.modification_args().is_empty());
        assert!(!p.filter_args().is_empty());

        let p = analyzed(&["task", "add", "project:Home", "Buy", "milk"]);
        assert_eq!(p.modification_args().len(), 3);
        assert!(p.filter_args().is_empty());
    }

    #[test]
    fn test_terminator() {
        let p = analyzed(&["task", "add", "--", "+literal", "word"]);
        assert_eq!(p.terminated_words(), vec!["+literal", "word"]);
        let terminator = p.args.iter().find(|a| a.raw == "--").unwrap();
        assert!(terminator.has_tag(ArgTag::Terminator));
    }

    #[test]
    fn test_overrides() {
        let p = analyzed(&["task", "rc:/tmp/rc", "rc.confirmation=off", "list"]);
        assert_eq!(p.rc_file().as_deref(), Some("/tmp/rc"));
        assert_eq!(
            p.config_overrides(),
            vec![("confirmation".to_string(), "off".to_string())]
        );
        // Overrides are not part of the filter.
        assert_eq!(filter_text(&p), "");
    }

    #[test]
    fn test_tag_desugar() {
        let p = analyzed(&["task", "+urgent", "list"]);
        assert_eq!(filter_text(&p), "tags _hastag_ urgent");

        let p = analyzed(&["task", "-urgent", "list"]);
        assert_eq!(filter_text(&p), "tags _notag_ urgent");
    }

    #[test]
    fn test_attribute_desugar() {
        let p = analyzed(&["task", "project:Home", "list"]);
        assert_eq!(filter_text(&p), "project = Home");

        let p = analyzed(&["task", "status:pending", "list"]);
        assert_eq!(filter_text(&p), "status == pending");
    }

    #[test]
    fn test_abbreviated_attribute_canonicalizes() {
        let p = analyzed(&["task", "proj:Home", "list"]);
        assert_eq!(filter_text(&p), "project = Home");

        let p = analyzed(&["task", "pri.above:L", "list"]);
        assert_eq!(filter_text(&p), "priority > L");
    }

    #[test]
    fn test_attmod_desugar() {
        let p = analyzed(&["task", "due.before:eom", "list"]);
        assert_eq!(filter_text(&p), "due < eom");

        let p = analyzed(&["task", "project.none:", "list"]);
        assert_eq!(filter_text(&p), "project == ");
    }

    #[test]
    fn test_pattern_desugar() {
        let p = analyzed(&["task", "/foo/", "list"]);
        assert_eq!(filter_text(&p), "description ~ foo");
    }

    #[test]
    fn test_id_desugar() {
        let p = analyzed(&["task", "1,3-5", "list"]);
        assert_eq!(
            filter_text(&p),
            "( id == 1 or ( id >= 3 and id <= 5 ) )"
        );
    }

    #[test]
    fn test_id_sequences_joined_with_or() {
        let p = analyzed(&["task", "1", "3", "list"]);
        assert_eq!(filter_text(&p), "( id == 1 ) or ( id == 3 )");
    }

    #[test]
    fn test_uuid_desugar() {
        let p = analyzed(&["task", "a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5", "list"]);
        assert_eq!(
            filter_text(&p),
            "( uuid = a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5 )"
        );
    }

    #[test]
    fn test_and_junction() {
        let p = analyzed(&["task", "project:Home", "+urgent", "list"]);
        assert_eq!(
            filter_text(&p),
            "project = Home and tags _hastag_ urgent"
        );
    }

    #[test]
    fn test_explicit_operator_not_junctioned() {
        let p = analyzed(&["task", "project:Home", "or", "+urgent", "list"]);
        assert_eq!(filter_text(&p), "project = Home or tags _hastag_ urgent");
    }

    #[test]
    fn test_implicit_information() {
        let p = analyzed(&["task", "5"]);
        assert_eq!(p.command(), Some(("information".to_string(), true)));
    }

    #[test]
    fn test_default_command_injection() {
        let mut p = Pipeline::new(test_entities(), FxHashMap::default(), Some("list".into()), vec![]);
        p.capture(&["task".to_string()]);
        p.analyze().unwrap();
        assert_eq!(p.command(), Some(("list".to_string(), true)));
    }

    #[test]
    fn test_no_command_no_default() {
        let p = analyzed(&["task"]);
        assert_eq!(p.command(), None);
    }

    #[test]
    fn test_alias_expansion() {
        let mut aliases = FxHashMap::default();
        aliases.insert("rm".to_string(), "delete".to_string());
        let mut p = Pipeline::new(test_entities(), aliases, None, vec![]);
        p.capture(&["task".to_string(), "1".to_string(), "rm".to_string()]);
        p.analyze().unwrap();
        assert_eq!(p.command(), Some(("delete".to_string(), false)));
    }

    #[test]
    fn test_alias_fixed_point_ceiling() {
        // A self-referential alias must stop at the ceiling.
        let mut aliases = FxHashMap::default();
        aliases.insert("x".to_string(), "x".to_string());
        let mut p = Pipeline::new(test_entities(), aliases, None, vec![]);
        p.capture(&["task".to_string(), "x".to_string(), "list".to_string()]);
        p.analyze().unwrap();
        assert_eq!(p.command(), Some(("list".to_string(), true)));
    }

    #[test]
    fn test_modification_decomposition() {
        let p = analyzed(&["task", "1", "modify", "project:Work", "+work", "/a/b/g"]);
        let mods = p.modification_args();
        assert_eq!(mods.len(), 3);
        assert!(mods[0].has_tag(ArgTag::Attribute));
        assert_eq!(mods[0].attrs.name.as_deref(), Some("project"));
        assert_eq!(mods[0].attrs.value.as_deref(), Some("Work"));
        assert!(mods[1].has_tag(ArgTag::Tag));
        assert_eq!(mods[1].attrs.sign.as_deref(), Some("+"));
        assert!(mods[2].has_tag(ArgTag::Substitution));
        assert_eq!(mods[2].attrs.from.as_deref(), Some("a"));
        assert_eq!(mods[2].attrs.to.as_deref(), Some("b"));
        assert_eq!(mods[2].attrs.global, Some(true));
    }

    #[test]
    fn test_stdin_capture() {
        let mut p = Pipeline::new(test_entities(), FxHashMap::default(), None, vec![]);
        p.capture(&["task".to_string()]);
        p.capture_stdin(&["+home".to_string(), "list".to_string()]);
        p.analyze().unwrap();
        assert_eq!(p.command(), Some(("list".to_string(), true)));
        let stdin_arg = p.args.iter().find(|a| a.has_tag(ArgTag::Stdin)).unwrap();
        assert!(stdin_arg.has_tag(ArgTag::Original));
    }
}
