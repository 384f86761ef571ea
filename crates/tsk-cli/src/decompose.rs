//! Modification decomposition.
//!
//! MODIFICATION nodes are not rewritten; the passes attach parsed
//! pieces to the node's attribute bag and tag the node with its shape:
//! ATTRIBUTE, ATTMOD, TAG or SUBSTITUTION. Attributes whose column is
//! modifiable also receive MODIFIABLE.

use crate::arg::ArgTag;
use crate::pipeline::Pipeline;
use crate::scan::Scanner;
use tsk_util::Result;

/// A MODIFICATION node no decompose pass has claimed yet.
fn undecomposed(arg: &crate::arg::Arg) -> bool {
    arg.has_tag(ArgTag::Modification)
        && !arg.has_tag(ArgTag::Attribute)
        && !arg.has_tag(ArgTag::Uda)
        && !arg.has_tag(ArgTag::AttMod)
        && !arg.has_tag(ArgTag::Tag)
        && !arg.has_tag(ArgTag::Substitution)
}

impl Pipeline {
    /// `<name>:<value>` on the write side.
    pub(crate) fn decompose_mod_attributes(&mut self) -> Result<()> {
        for i in 0..self.args.len() {
            if !undecomposed(&self.args[i]) {
                continue;
            }

            let raw = self.args[i].raw.clone();
            let mut s = Scanner::new(&raw);
            let name = match s.get_name() {
                Some(name) if !name.is_empty() && s.skip(':') => name,
                _ => continue,
            };
            let value = s
                .quoted('"')
                .or_else(|| s.quoted('\''))
                .or_else(|| s.rest())
                .unwrap_or_default();

            if let Some(canonical) = self.canon_soft("uda", &name) {
                let arg = &mut self.args[i];
                arg.attrs.name = Some(canonical);
                arg.attrs.value = Some(value);
                arg.tag(ArgTag::Uda);
                arg.tag(ArgTag::Modifiable);
            } else if let Some(canonical) = self.canon_soft("attribute", &name) {
                let modifiable = self.is_modifiable(&canonical);
                let arg = &mut self.args[i];
                arg.attrs.name = Some(canonical);
                arg.attrs.value = Some(value);
                arg.tag(ArgTag::Attribute);
                if modifiable {
                    arg.tag(ArgTag::Modifiable);
                }
            }
        }
        Ok(())
    }

    /// `<name>.<mod>[:=]<value>` on the write side.
    pub(crate) fn decompose_mod_attribute_modifiers(&mut self) -> Result<()> {
        for i in 0..self.args.len() {
            if !undecomposed(&self.args[i]) {
                continue;
            }

            let raw = self.args[i].raw.clone();
            let mut s = Scanner::new(&raw);
            let name = s.until('.');
            if name.is_empty() {
                continue;
            }
            let (canonical, is_uda) = match self.canon_soft("attribute", &name) {
                Some(c) => (c, false),
                None => match self.canon_soft("uda", &name) {
                    Some(c) => (c, true),
                    None => continue,
                },
            };
            if !s.skip('.') {
                continue;
            }
            let sense = if s.skip('~') { "-" } else { "+" };
            let modifier = s.until_one_of(":=");
            if !s.skip(':') && !s.skip('=') {
                continue;
            }
            let value = s
                .quoted('"')
                .or_else(|| s.quoted('\''))
                .or_else(|| s.rest())
                .unwrap_or_default();

            let modifiable = is_uda || self.is_modifiable(&canonical);
            let arg = &mut self.args[i];
            arg.attrs.name = Some(canonical);
            arg.attrs.modifier = Some(modifier);
            arg.attrs.sense = Some(sense.to_string());
            arg.attrs.value = Some(value);
            arg.tag(if is_uda { ArgTag::Uda } else { ArgTag::AttMod });
            if modifiable {
                arg.tag(ArgTag::Modifiable);
            }
        }
        Ok(())
    }

    /// `+tag` / `-tag` on the write side.
    pub(crate) fn decompose_mod_tags(&mut self) {
        for arg in &mut self.args {
            if !undecomposed(arg) {
                continue;
            }

            let mut chars = arg.raw.chars();
            let sign = chars.next();
            let tag: String = chars.collect();

            if let Some(sign @ ('+' | '-')) = sign {
                if !tag.is_empty() && !tag.contains(' ') {
                    arg.attrs.name = Some(tag);
                    arg.attrs.sign = Some(sign.to_string());
                    arg.tag(ArgTag::Tag);
                }
            }
        }
    }

    /// `/from/to/[g]` on the write side.
    pub(crate) fn decompose_mod_substitutions(&mut self) {
        for arg in &mut self.args {
            if !undecomposed(arg) {
                continue;
            }

            let mut s = Scanner::new(&arg.raw);
            let from = match s.quoted('/') {
                Some(from) => from,
                None => continue,
            };
            s.back();
            let to = match s.quoted('/') {
                Some(to) => to,
                None => continue,
            };
            let global = s.skip('g');
            if !s.depleted() {
                continue;
            }

            arg.attrs.from = Some(from);
            arg.attrs.to = Some(to);
            arg.attrs.global = Some(global);
            arg.tag(ArgTag::Substitution);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::arg::ArgTag;
    use crate::pipeline::tests::analyzed;

    #[test]
    fn test_attribute_modification() {
        let p = analyzed(&["task", "1", "modify", "due:tomorrow"]);
        let mods = p.modification_args();
        assert_eq!(mods.len(), 1);
        assert!(mods[0].has_tag(ArgTag::Attribute));
        assert!(mods[0].has_tag(ArgTag::Modifiable));
        assert_eq!(mods[0].attrs.name.as_deref(), Some("due"));
        assert_eq!(mods[0].attrs.value.as_deref(), Some("tomorrow"));
    }

    #[test]
    fn test_attribute_clear() {
        let p = analyzed(&["task", "1", "modify", "due:"]);
        let mods = p.modification_args();
        assert_eq!(mods[0].attrs.value.as_deref(), Some(""));
    }

    #[test]
    fn test_non_modifiable_column() {
        let p = analyzed(&["task", "1", "modify", "uuid:oops"]);
        let mods = p.modification_args();
        assert!(mods[0].has_tag(ArgTag::Attribute));
        assert!(!mods[0].has_tag(ArgTag::Modifiable));
    }

    #[test]
    fn test_attmod_modification() {
        let p = analyzed(&["task", "1", "modify", "due.is:tomorrow"]);
        let mods = p.modification_args();
        assert!(mods[0].has_tag(ArgTag::AttMod));
        assert_eq!(mods[0].attrs.modifier.as_deref(), Some("is"));
    }

    #[test]
    fn test_tag_modification() {
        let p = analyzed(&["task", "1", "modify", "-work"]);
        let mods = p.modification_args();
        assert!(mods[0].has_tag(ArgTag::Tag));
        assert_eq!(mods[0].attrs.sign.as_deref(), Some("-"));
        assert_eq!(mods[0].attrs.name.as_deref(), Some("work"));
    }

    #[test]
    fn test_substitution_modification() {
        let p = analyzed(&["task", "1", "modify", "/foo/bar/"]);
        let mods = p.modification_args();
        assert!(mods[0].has_tag(ArgTag::Substitution));
        assert_eq!(mods[0].attrs.global, Some(false));
    }

    #[test]
    fn test_plain_words_stay_words() {
        let p = analyzed(&["task", "1", "modify", "new", "words"]);
        let mods = p.modification_args();
        assert_eq!(mods.len(), 2);
        assert!(!mods[0].has_tag(ArgTag::Attribute));
        assert!(!mods[1].has_tag(ArgTag::Tag));
    }
}
