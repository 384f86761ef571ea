//! Infix structure validation.
//!
//! A recursive descent over the grammar below. The walk also rewrites
//! unary `-` and `+` to the pseudo-operators `_neg_` and `_pos_`, which
//! the postfix converter and evaluator understand.
//!
//! ```text
//! Logical     → Regex (('and' | 'or' | 'xor') Regex)*
//! Regex       → Equality (('~' | '!~') Equality)*
//! Equality    → Comparative (('==' | '=' | '!==' | '!=') Comparative)*
//! Comparative → Arithmetic (('<=' | '<' | '>=' | '>') Arithmetic)*
//! Arithmetic  → Geometric (('+' | '-') Geometric)*
//! Geometric   → Tag (('*' | '/' | '%') Tag)*
//! Tag         → Unary (('_hastag_' | '_notag_') Unary)*
//! Unary       → ('-' | '+' | '!')? Exponent
//! Exponent    → Primitive ('^' Primitive)?
//! Primitive   → '(' Logical ')' | literal | identifier
//! ```

use tsk_lex::{Token, TokenKind};
use tsk_util::{Error, Result};

/// Validate the infix token list, rewriting unary signs in place.
///
/// `known` reports whether an identifier resolves against a variable
/// source; resolvable names are accepted as primitives even when they
/// collide with operator spellings.
pub fn infix_parse(tokens: &mut [Token], known: &dyn Fn(&str) -> bool) -> Result<()> {
    if tokens.is_empty() {
        return Err(Error::Parse("empty expression".to_string()));
    }

    let mut i = 0;
    if !parse_logical(tokens, &mut i, known) {
        return Err(Error::Parse(format!(
            "malformed expression near '{}'",
            tokens
                .get(i)
                .map(|t| t.text.as_str())
                .unwrap_or("end of input")
        )));
    }
    if i != tokens.len() {
        return Err(Error::Parse(format!(
            "trailing content after expression: '{}'",
            tokens[i].text
        )));
    }
    Ok(())
}

fn is_op(tokens: &[Token], i: usize, names: &[&str]) -> bool {
    tokens
        .get(i)
        .map(|t| t.kind == TokenKind::Op && names.contains(&t.text.as_str()))
        .unwrap_or(false)
}

fn parse_binary_level(
    tokens: &mut [Token],
    i: &mut usize,
    names: &[&str],
    next: &dyn Fn(&mut [Token], &mut usize) -> bool,
) -> bool {
    if *i < tokens.len() && next(tokens, i) {
        while is_op(tokens, *i, names) {
            *i += 1;
            if !next(tokens, i) {
                return false;
            }
        }
        return true;
    }
    false
}

fn parse_logical(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["and", "or", "xor"], &|t, i| {
        parse_regex(t, i, known)
    })
}

fn parse_regex(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["~", "!~"], &|t, i| parse_equality(t, i, known))
}

fn parse_equality(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["==", "=", "!==", "!="], &|t, i| {
        parse_comparative(t, i, known)
    })
}

fn parse_comparative(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["<=", "<", ">=", ">"], &|t, i| {
        parse_arithmetic(t, i, known)
    })
}

fn parse_arithmetic(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["+", "-"], &|t, i| parse_geometric(t, i, known))
}

fn parse_geometric(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["*", "/", "%"], &|t, i| parse_tag(t, i, known))
}

fn parse_tag(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    parse_binary_level(tokens, i, &["_hastag_", "_notag_"], &|t, i| {
        parse_unary(t, i, known)
    })
}

fn parse_unary(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    if let Some(token) = tokens.get_mut(*i) {
        if token.kind == TokenKind::Op {
            match token.text.as_str() {
                "-" => {
                    token.text = "_neg_".to_string();
                    *i += 1;
                }
                "+" => {
                    token.text = "_pos_".to_string();
                    *i += 1;
                }
                "!" => {
                    *i += 1;
                }
                _ => {}
            }
        }
    }
    parse_exponent(tokens, i, known)
}

fn parse_exponent(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    if *i < tokens.len() && parse_primitive(tokens, i, known) {
        while is_op(tokens, *i, &["^"]) {
            *i += 1;
            if !parse_primitive(tokens, i, known) {
                return false;
            }
        }
        return true;
    }
    false
}

fn parse_primitive(tokens: &mut [Token], i: &mut usize, known: &dyn Fn(&str) -> bool) -> bool {
    if *i >= tokens.len() {
        return false;
    }

    if tokens[*i].text == "(" && tokens[*i].kind == TokenKind::Op {
        *i += 1;
        if *i < tokens.len() && parse_logical(tokens, i, known) {
            if *i < tokens.len() && tokens[*i].text == ")" {
                *i += 1;
                return true;
            }
        }
        return false;
    }

    if known(&tokens[*i].text) || tokens[*i].kind != TokenKind::Op {
        *i += 1;
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsk_lex::Lexer;

    fn parse(text: &str) -> Result<Vec<Token>> {
        let mut tokens = Lexer::split(text);
        infix_parse(&mut tokens, &|_| false)?;
        Ok(tokens)
    }

    #[test]
    fn test_simple_expressions() {
        assert!(parse("1 + 2").is_ok());
        assert!(parse("due < eom").is_ok());
        assert!(parse("project = 'Home'").is_ok());
        assert!(parse("status == 'pending' and tags _hastag_ 'urgent'").is_ok());
    }

    #[test]
    fn test_unary_rewrite() {
        let tokens = parse("- 5").unwrap();
        assert_eq!(tokens[0].text, "_neg_");
        let tokens = parse("+ 5").unwrap();
        assert_eq!(tokens[0].text, "_pos_");
        let tokens = parse("! 1").unwrap();
        assert_eq!(tokens[0].text, "!");
    }

    #[test]
    fn test_nested_parens() {
        assert!(parse("( ( 1 + 2 ) * 3 )").is_ok());
        assert!(parse("( 1 + 2").is_err());
        assert!(parse("1 + 2 )").is_err());
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse("1 + 2 3").is_err());
    }

    #[test]
    fn test_exponent() {
        assert!(parse("2 ^ 3").is_ok());
        assert!(parse("2 ^ 3 ^ 2").is_ok());
        assert!(parse("2 ^").is_err());
    }

    #[test]
    fn test_empty() {
        assert!(parse("").is_err());
    }
}
