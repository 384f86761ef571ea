//! Pipeline argument nodes.
//!
//! Each node carries its raw text, a set of category tags, and a typed
//! attribute bag filled in by the classification passes.

/// Category tags. A node may carry several at once; `Unknown` means
/// "unclassified, please try to classify me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgTag {
    Original,
    Binary,
    Tw,
    Calendar,
    Stdin,
    Terminator,
    Terminated,
    Rc,
    Config,
    Cmd,
    ReadCmd,
    WriteCmd,
    Helper,
    Filter,
    Modification,
    Word,
    Pattern,
    Substitution,
    Tag,
    Attribute,
    AttMod,
    Uda,
    Pseudo,
    Op,
    Literal,
    Regex,
    Id,
    Uuid,
    Number,
    Str,
    Modifiable,
    Default,
    Assumed,
    Alias,
    Lex,
    Unknown,
}

/// Parsed pieces attached by the passes.
#[derive(Debug, Clone, Default)]
pub struct ArgAttrs {
    /// Program basename, on the BINARY node.
    pub basename: Option<String>,
    /// Canonical name after prefix completion.
    pub canonical: Option<String>,
    /// `rc:<path>` override path.
    pub file: Option<String>,
    /// Attribute or configuration variable name.
    pub name: Option<String>,
    /// Attribute or configuration value.
    pub value: Option<String>,
    /// Attribute modifier (`before`, `has`, ...).
    pub modifier: Option<String>,
    /// Modifier sense: `+` normal, `-` inverted.
    pub sense: Option<String>,
    /// Tag sign: `+` or `-`.
    pub sign: Option<String>,
    /// Substitution source.
    pub from: Option<String>,
    /// Substitution replacement.
    pub to: Option<String>,
    /// Substitution applies globally.
    pub global: Option<bool>,
}

/// One element of the argument vector.
#[derive(Debug, Clone)]
pub struct Arg {
    pub raw: String,
    tags: Vec<ArgTag>,
    pub attrs: ArgAttrs,
}

impl Arg {
    pub fn new(raw: impl Into<String>) -> Self {
        Arg {
            raw: raw.into(),
            tags: Vec::new(),
            attrs: ArgAttrs::default(),
        }
    }

    /// A node born with one tag.
    pub fn tagged(raw: impl Into<String>, tag: ArgTag) -> Self {
        let mut arg = Arg::new(raw);
        arg.tag(tag);
        arg
    }

    pub fn has_tag(&self, tag: ArgTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn tag(&mut self, tag: ArgTag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn untag(&mut self, tag: ArgTag) {
        self.tags.retain(|t| *t != tag);
    }

    pub fn untag_all(&mut self) {
        self.tags.clear();
    }

    pub fn tags(&self) -> &[ArgTag] {
        &self.tags
    }
}
