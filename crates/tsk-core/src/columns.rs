//! Column metadata for the built-in attributes.
//!
//! The modifier consults the column type to decide how a value is
//! evaluated (dates run through the expression engine, durations keep
//! their raw text, numerics must parse); the DOM resolver uses it to
//! produce typed values.

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    DateTime,
    Duration,
    Numeric,
}

/// One built-in attribute.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub modifiable: bool,
}

const fn col(name: &'static str, col_type: ColumnType, modifiable: bool) -> Column {
    Column {
        name,
        col_type,
        modifiable,
    }
}

/// The built-in columns.
pub const COLUMNS: &[Column] = &[
    col("description", ColumnType::Text, true),
    col("status", ColumnType::Text, true),
    col("project", ColumnType::Text, true),
    col("priority", ColumnType::Text, true),
    col("due", ColumnType::DateTime, true),
    col("scheduled", ColumnType::DateTime, true),
    col("start", ColumnType::DateTime, true),
    col("end", ColumnType::DateTime, true),
    col("until", ColumnType::DateTime, true),
    col("wait", ColumnType::DateTime, true),
    col("entry", ColumnType::DateTime, false),
    col("modified", ColumnType::DateTime, false),
    col("recur", ColumnType::Duration, true),
    col("depends", ColumnType::Text, true),
    col("tags", ColumnType::Text, true),
    col("annotations", ColumnType::Text, false),
    col("uuid", ColumnType::Text, false),
    col("id", ColumnType::Numeric, false),
    col("urgency", ColumnType::Numeric, false),
];

/// Look up a column by name.
pub fn column(name: &str) -> Option<&'static Column> {
    COLUMNS.iter().find(|c| c.name == name)
}

/// All column names.
pub fn names() -> Vec<&'static str> {
    COLUMNS.iter().map(|c| c.name).collect()
}

/// Names of the modifiable columns.
pub fn modifiable_names() -> Vec<String> {
    COLUMNS
        .iter()
        .filter(|c| c.modifiable)
        .map(|c| c.name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(column("due").unwrap().col_type, ColumnType::DateTime);
        assert_eq!(column("recur").unwrap().col_type, ColumnType::Duration);
        assert!(column("bogus").is_none());
    }

    #[test]
    fn test_read_only_columns() {
        for name in ["uuid", "id", "entry", "modified", "urgency"] {
            assert!(!column(name).unwrap().modifiable, "{}", name);
        }
        assert!(column("description").unwrap().modifiable);
    }
}
