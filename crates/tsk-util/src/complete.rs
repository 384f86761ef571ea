//! Prefix auto-completion.
//!
//! Canonicalization of user input (command names, attribute names, named
//! dates) completes an abbreviated prefix to the unique full name within
//! a candidate set. An exact match always wins, even when it is also a
//! prefix of other candidates.

/// Minimum prefix length for a non-exact completion.
pub const MINIMUM_MATCH_LENGTH: usize = 3;

/// Complete `input` against `options`.
///
/// Returns the matching candidates: a single-element vector on an exact
/// match, otherwise every option that `input` is a prefix of, provided
/// `input` is at least `min_length` characters long.
///
/// # Example
///
/// ```
/// use tsk_util::complete::autocomplete;
///
/// let options = ["start".to_string(), "stop".to_string()];
/// assert_eq!(autocomplete("sta", &options, 3), vec!["start".to_string()]);
/// assert_eq!(autocomplete("st", &options, 3).len(), 0);
/// assert_eq!(autocomplete("st", &options, 2).len(), 2);
/// ```
pub fn autocomplete(input: &str, options: &[String], min_length: usize) -> Vec<String> {
    // Exact match shortcut.
    for option in options {
        if option == input {
            return vec![option.clone()];
        }
    }

    if input.len() < min_length {
        return Vec::new();
    }

    let mut matches: Vec<String> = Vec::new();
    for option in options {
        if option.starts_with(input) {
            matches.push(option.clone());
        }
    }

    matches
}
