//! Interactive confirmation prompts.
//!
//! Single-task confirmations are yes/no; bulk operations ask a
//! four-way yes/no/all/quit per task. Answers match case-insensitively
//! by prefix.

use std::io::{BufRead, Write};

/// Four-way answer for bulk confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    All,
    Quit,
}

/// Ask a yes/no question. EOF counts as no.
pub fn confirmed(question: &str) -> bool {
    loop {
        match ask(&format!("{} (yes/no) ", question)) {
            None => return false,
            Some(input) => match parse_answer(&input, false) {
                Some(Answer::Yes) => return true,
                Some(Answer::No) => return false,
                _ => continue,
            },
        }
    }
}

/// Ask a yes/no/all/quit question. EOF counts as quit.
pub fn confirmed4(question: &str) -> Answer {
    loop {
        match ask(&format!("{} (yes/no/all/quit) ", question)) {
            None => return Answer::Quit,
            Some(input) => {
                if let Some(answer) = parse_answer(&input, true) {
                    return answer;
                }
            }
        }
    }
}

fn ask(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Case-insensitive prefix match against yes/no (and all/quit for the
/// four-way form).
fn parse_answer(input: &str, four_way: bool) -> Option<Answer> {
    if input.is_empty() {
        return None;
    }
    let lower = input.to_lowercase();
    let candidates: &[(&str, Answer)] = if four_way {
        &[
            ("yes", Answer::Yes),
            ("no", Answer::No),
            ("all", Answer::All),
            ("quit", Answer::Quit),
        ]
    } else {
        &[("yes", Answer::Yes), ("no", Answer::No)]
    };

    let mut matched = None;
    for (word, answer) in candidates {
        if word.starts_with(&lower) {
            if matched.is_some() {
                return None; // ambiguous prefix
            }
            matched = Some(*answer);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_prefixes() {
        assert_eq!(parse_answer("y", false), Some(Answer::Yes));
        assert_eq!(parse_answer("YES", false), Some(Answer::Yes));
        assert_eq!(parse_answer("n", false), Some(Answer::No));
        assert_eq!(parse_answer("No", false), Some(Answer::No));
        assert_eq!(parse_answer("maybe", false), None);
        assert_eq!(parse_answer("", false), None);
    }

    #[test]
    fn test_parse_answer_four_way() {
        assert_eq!(parse_answer("a", true), Some(Answer::All));
        assert_eq!(parse_answer("q", true), Some(Answer::Quit));
        assert_eq!(parse_answer("QUIT", true), Some(Answer::Quit));
        // "all"/"quit" are not offered in the two-way form.
        assert_eq!(parse_answer("a", false), None);
    }
}
