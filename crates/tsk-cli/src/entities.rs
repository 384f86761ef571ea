//! The entities registry.
//!
//! A configuration-seeded multimap from category (`cmd`, `attribute`,
//! `operator`, ...) to canonical names. Classification canonicalizes
//! user input against a category by prefix completion.

use indexmap::IndexMap;

use tsk_util::{autocomplete, Error, Result, MINIMUM_MATCH_LENGTH};

/// Category → canonical names.
#[derive(Debug, Clone, Default)]
pub struct Entities {
    categories: IndexMap<String, Vec<String>>,
}

impl Entities {
    pub fn new() -> Self {
        Entities::default()
    }

    /// Register `name` under `category`.
    pub fn add(&mut self, category: &str, name: &str) {
        let names = self.categories.entry(category.to_string()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    /// All canonical names in a category.
    pub fn names(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True when `value` is exactly a canonical name in `category`.
    pub fn exact_match(&self, category: &str, value: &str) -> bool {
        self.names(category).iter().any(|n| n == value)
    }

    /// Complete `value` against `category`.
    ///
    /// `Ok(Some(name))` on an exact or unique-prefix match, `Ok(None)`
    /// on a miss, and an ambiguity error when the prefix matches two or
    /// more names.
    pub fn canonicalize(&self, category: &str, value: &str) -> Result<Option<String>> {
        let options = self.names(category);
        let matches = autocomplete(value, options, MINIMUM_MATCH_LENGTH);
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.into_iter().next().expect("one match"))),
            _ => Err(Error::ambiguity(category, value, matches)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Entities {
        let mut e = Entities::new();
        for cmd in ["add", "annotate", "append", "delete", "done", "list"] {
            e.add("cmd", cmd);
        }
        e
    }

    #[test]
    fn test_exact_match() {
        let e = registry();
        assert!(e.exact_match("cmd", "add"));
        assert!(!e.exact_match("cmd", "ad"));
        assert!(!e.exact_match("bogus", "add"));
    }

    #[test]
    fn test_canonicalize_prefix() {
        let e = registry();
        assert_eq!(e.canonicalize("cmd", "del").unwrap(), Some("delete".into()));
        assert_eq!(e.canonicalize("cmd", "lis").unwrap(), Some("list".into()));
        assert_eq!(e.canonicalize("cmd", "xyz").unwrap(), None);
    }

    #[test]
    fn test_exact_beats_prefix() {
        let mut e = registry();
        e.add("cmd", "adder");
        assert_eq!(e.canonicalize("cmd", "add").unwrap(), Some("add".into()));
    }

    #[test]
    fn test_minimum_prefix_length() {
        let e = registry();
        // Two characters never complete.
        assert_eq!(e.canonicalize("cmd", "de").unwrap(), None);
    }

    #[test]
    fn test_ambiguity_error() {
        let e = registry();
        // "ann" is unique; "an" is too short; craft a real collision.
        let mut e2 = e.clone();
        e2.add("cmd", "annul");
        let err = e2.canonicalize("cmd", "ann").unwrap_err();
        assert!(err.to_string().contains("annotate"));
        assert!(err.to_string().contains("annul"));
    }

    #[test]
    fn test_no_duplicates() {
        let mut e = Entities::new();
        e.add("cmd", "list");
        e.add("cmd", "list");
        assert_eq!(e.names("cmd").len(), 1);
    }
}
