//! The operator table.
//!
//! Precedence borrowed from C++; higher binds tighter. The table is
//! consulted by the shunting-yard converter and exported to the entity
//! registry so the argument pipeline can tag operators.

/// Operator arity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Binary,
    Unary,
    Circumfix,
}

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Neither,
}

/// One operator's characteristics.
#[derive(Debug, Clone, Copy)]
pub struct OpDef {
    pub name: &'static str,
    pub precedence: u8,
    pub kind: OpKind,
    pub assoc: Assoc,
}

/// Supported operators.
pub const OPERATORS: &[OpDef] = &[
    op("^", 16, OpKind::Binary, Assoc::Right),
    op("!", 15, OpKind::Unary, Assoc::Right),
    op("_neg_", 15, OpKind::Unary, Assoc::Right),
    op("_pos_", 15, OpKind::Unary, Assoc::Right),
    op("_hastag_", 14, OpKind::Binary, Assoc::Left),
    op("_notag_", 14, OpKind::Binary, Assoc::Left),
    op("*", 13, OpKind::Binary, Assoc::Left),
    op("/", 13, OpKind::Binary, Assoc::Left),
    op("%", 13, OpKind::Binary, Assoc::Left),
    op("+", 12, OpKind::Binary, Assoc::Left),
    op("-", 12, OpKind::Binary, Assoc::Left),
    op("<=", 10, OpKind::Binary, Assoc::Left),
    op(">=", 10, OpKind::Binary, Assoc::Left),
    op(">", 10, OpKind::Binary, Assoc::Left),
    op("<", 10, OpKind::Binary, Assoc::Left),
    op("=", 9, OpKind::Binary, Assoc::Left),
    op("==", 9, OpKind::Binary, Assoc::Left),
    op("!=", 9, OpKind::Binary, Assoc::Left),
    op("!==", 9, OpKind::Binary, Assoc::Left),
    op("~", 8, OpKind::Binary, Assoc::Left),
    op("!~", 8, OpKind::Binary, Assoc::Left),
    op("and", 5, OpKind::Binary, Assoc::Left),
    op("or", 4, OpKind::Binary, Assoc::Left),
    op("xor", 3, OpKind::Binary, Assoc::Left),
    op("(", 0, OpKind::Circumfix, Assoc::Neither),
    op(")", 0, OpKind::Circumfix, Assoc::Neither),
];

const fn op(name: &'static str, precedence: u8, kind: OpKind, assoc: Assoc) -> OpDef {
    OpDef {
        name,
        precedence,
        kind,
        assoc,
    }
}

/// Characteristics for an operator symbol, if it is one.
pub fn lookup(name: &str) -> Option<&'static OpDef> {
    OPERATORS.iter().find(|o| o.name == name)
}

/// All operator names.
pub fn names() -> Vec<&'static str> {
    OPERATORS.iter().map(|o| o.name).collect()
}

/// Binary operator names only.
pub fn binary_names() -> Vec<&'static str> {
    OPERATORS
        .iter()
        .filter(|o| o.kind == OpKind::Binary)
        .map(|o| o.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("^").unwrap().precedence, 16);
        assert_eq!(lookup("^").unwrap().assoc, Assoc::Right);
        assert_eq!(lookup("and").unwrap().precedence, 5);
        assert!(lookup("bogus").is_none());
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(lookup("*").unwrap().precedence > lookup("+").unwrap().precedence);
        assert!(lookup("+").unwrap().precedence > lookup("<").unwrap().precedence);
        assert!(lookup("<").unwrap().precedence > lookup("==").unwrap().precedence);
        assert!(lookup("==").unwrap().precedence > lookup("~").unwrap().precedence);
        assert!(lookup("~").unwrap().precedence > lookup("and").unwrap().precedence);
        assert!(lookup("and").unwrap().precedence > lookup("or").unwrap().precedence);
        assert!(lookup("or").unwrap().precedence > lookup("xor").unwrap().precedence);
    }

    #[test]
    fn test_binary_names_exclude_unary() {
        let names = binary_names();
        assert!(names.contains(&"and"));
        assert!(!names.contains(&"_neg_"));
        assert!(!names.contains(&"("));
    }
}
