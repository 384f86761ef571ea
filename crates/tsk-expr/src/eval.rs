//! Postfix evaluation.
//!
//! A stack machine over `Value`. Identifiers resolve through the
//! registered sources in priority order; identifiers that no source
//! recognizes degrade to string literals. The stack must reduce to
//! exactly one value.

use tracing::debug;

use tsk_lex::{Lexer, Token, TokenKind};
use tsk_util::{Error, Result};

use crate::parser::infix_parse;
use crate::postfix::to_postfix;
use crate::value::{Value, ValueContext};

/// A variable source consulted for identifiers.
///
/// The primary source is a DOM resolver reading task attributes by
/// dotted name; `has_tag` backs the `_hastag_`/`_notag_` pseudo-ops.
pub trait Resolver {
    fn resolve(&self, name: &str) -> Option<Value>;

    fn has_tag(&self, _tag: &str) -> bool {
        false
    }
}

/// Built-in named constants.
pub struct ConstantsResolver;

impl Resolver for ConstantsResolver {
    fn resolve(&self, name: &str) -> Option<Value> {
        match name {
            "true" => Some(Value::bool(true)),
            "false" => Some(Value::bool(false)),
            "pi" => Some(Value::real(std::f64::consts::PI)),
            _ => None,
        }
    }
}

/// The expression evaluator.
pub struct Eval {
    ctx: ValueContext,
    sources: Vec<Box<dyn Resolver>>,
}

impl Eval {
    /// A new evaluator with the constants source registered.
    pub fn new(ctx: ValueContext) -> Self {
        Eval {
            ctx,
            sources: vec![Box::new(ConstantsResolver)],
        }
    }

    /// Append a variable source; later sources have lower priority.
    pub fn add_source(&mut self, source: Box<dyn Resolver>) {
        self.sources.push(source);
    }

    pub fn context(&self) -> &ValueContext {
        &self.ctx
    }

    /// True when any registered source resolves `name`.
    pub fn knows(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.resolve(name).is_some())
    }

    fn lookup(&self, name: &str, extra: Option<&dyn Resolver>) -> Option<Value> {
        if let Some(v) = self.sources.iter().find_map(|s| s.resolve(name)) {
            return Some(v);
        }
        extra.and_then(|e| e.resolve(name))
    }

    /// Validate and convert an infix token list to postfix.
    pub fn compile(&self, mut tokens: Vec<Token>) -> Result<Vec<Token>> {
        infix_parse(&mut tokens, &|name| self.knows(name))?;
        to_postfix(tokens)
    }

    /// Lex, compile and evaluate an infix expression string.
    pub fn evaluate_infix(&self, text: &str, extra: Option<&dyn Resolver>) -> Result<Value> {
        let tokens = Lexer::split(text);
        let postfix = self.compile(tokens)?;
        self.evaluate_postfix(&postfix, extra)
    }

    /// Evaluate a postfix token sequence.
    pub fn evaluate_postfix(
        &self,
        tokens: &[Token],
        extra: Option<&dyn Resolver>,
    ) -> Result<Value> {
        if tokens.is_empty() {
            return Err(Error::Parse("empty expression".to_string()));
        }

        let mut stack: Vec<Value> = Vec::new();

        for token in tokens {
            if token.kind == TokenKind::Op {
                self.apply_operator(token, &mut stack, extra)?;
                continue;
            }

            // Literals and identifiers.
            let value = match token.kind {
                TokenKind::Identifier => match self.lookup(&token.text, extra) {
                    Some(v) => {
                        debug!(name = %token.text, "identifier resolved");
                        v
                    }
                    None => {
                        // An identifier that fails lookup is a string.
                        Value::string(token.text.clone()).with_raw(&token.text, token.kind)
                    }
                },
                kind => Value::from_token(&token.text, kind, &self.ctx)?,
            };
            stack.push(value);
        }

        if stack.len() != 1 {
            return Err(Error::Parse(
                "the expression could not be evaluated".to_string(),
            ));
        }
        Ok(stack.remove(0))
    }

    fn apply_operator(
        &self,
        token: &Token,
        stack: &mut Vec<Value>,
        extra: Option<&dyn Resolver>,
    ) -> Result<()> {
        let underflow = || Error::Parse("the expression could not be evaluated".to_string());

        // Unary operators.
        match token.text.as_str() {
            "!" => {
                let right = stack.pop().ok_or_else(underflow)?;
                stack.push(right.not());
                return Ok(());
            }
            "_neg_" => {
                let right = stack.pop().ok_or_else(underflow)?;
                stack.push(right.negate(&self.ctx)?);
                return Ok(());
            }
            "_pos_" => {
                // NOP.
                return Ok(());
            }
            _ => {}
        }

        // Binary operators.
        let right = stack.pop().ok_or_else(underflow)?;
        let left = stack.pop().ok_or_else(underflow)?;
        let ctx = &self.ctx;

        let result = match token.text.as_str() {
            "and" | "&&" => left.and(&right),
            "or" | "||" => left.or(&right),
            "xor" => left.xor(&right),
            "<" => left.lt(&right, ctx)?,
            "<=" => left.le(&right, ctx)?,
            ">" => left.gt(&right, ctx)?,
            ">=" => left.ge(&right, ctx)?,
            "==" => left.eq_exact(&right, ctx)?,
            "!==" => left.ne_exact(&right, ctx)?,
            "=" => left.eq_partial(&right, ctx)?,
            "!=" => left.ne_partial(&right, ctx)?,
            "+" => left.add(&right, ctx)?,
            "-" => left.sub(&right, ctx)?,
            "*" => left.mul(&right)?,
            "/" => left.div(&right)?,
            "^" => left.pow(&right)?,
            "%" => left.modulo(&right)?,
            "~" => left.matches(&right, ctx)?,
            "!~" => left.no_match(&right, ctx)?,
            "_hastag_" => Value::bool(self.has_tag(&left, &right, extra)),
            "_notag_" => Value::bool(!self.has_tag(&left, &right, extra)),
            other => {
                return Err(Error::Parse(format!("unsupported operator '{}'", other)));
            }
        };

        stack.push(result);
        Ok(())
    }

    /// Tag membership: the task resolver answers when present, else the
    /// left operand's comma-joined tag list is consulted.
    fn has_tag(&self, left: &Value, right: &Value, extra: Option<&dyn Resolver>) -> bool {
        let tag = right.as_string();
        if let Some(resolver) = extra {
            return resolver.has_tag(&tag);
        }
        left.as_string().split(',').any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Data;

    fn eval(text: &str) -> Result<Value> {
        Eval::new(ValueContext::default()).evaluate_infix(text, None)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap().data(), &Data::Int(7));
        assert_eq!(eval("( 1 + 2 ) * 3").unwrap().data(), &Data::Int(9));
        assert_eq!(eval("8 - 4 - 2").unwrap().data(), &Data::Int(2));
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap().data(), &Data::Int(512));
        assert_eq!(eval("10 % 3").unwrap().data(), &Data::Int(1));
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval("- 5 + 8").unwrap().data(), &Data::Int(3));
        assert!(eval("! 0").unwrap().as_bool());
    }

    #[test]
    fn test_constants() {
        assert!(eval("true").unwrap().as_bool());
        assert!(!eval("false").unwrap().as_bool());
        assert!(matches!(eval("pi").unwrap().data(), Data::Real(_)));
    }

    #[test]
    fn test_unresolved_identifier_is_string() {
        let v = eval("banana").unwrap();
        assert_eq!(v.data(), &Data::Str("banana".to_string()));
    }

    #[test]
    fn test_comparison_chain() {
        assert!(eval("1 < 2 and 2 < 3").unwrap().as_bool());
        assert!(!eval("1 < 2 and 3 < 2").unwrap().as_bool());
        assert!(eval("1 < 2 xor 3 < 2").unwrap().as_bool());
    }

    #[test]
    fn test_date_arithmetic() {
        let v = eval("2015-07-04 + 2d").unwrap();
        let expected = tsk_time::date::parse_iso("2015-07-06").unwrap().0;
        assert_eq!(v.data(), &Data::Date(expected.epoch()));
    }

    #[test]
    fn test_named_date_arithmetic() {
        // easter+2d: the identifier resolves through string promotion.
        let v = eval("easter + 2d").unwrap();
        let easter = tsk_time::CalDate::easter(tsk_time::CalDate::now().year()).unwrap();
        assert_eq!(v.data(), &Data::Date(easter.epoch() + 2 * 86_400));
    }

    #[test]
    fn test_custom_source() {
        struct Fixed;
        impl Resolver for Fixed {
            fn resolve(&self, name: &str) -> Option<Value> {
                (name == "answer").then(|| Value::int(42))
            }
        }
        let eval = Eval::new(ValueContext::default());
        let v = eval.evaluate_infix("answer + 1", Some(&Fixed)).unwrap();
        assert_eq!(v.data(), &Data::Int(43));
    }

    #[test]
    fn test_hastag() {
        struct Tagged;
        impl Resolver for Tagged {
            fn resolve(&self, name: &str) -> Option<Value> {
                (name == "tags").then(|| Value::string("home,urgent"))
            }
            fn has_tag(&self, tag: &str) -> bool {
                tag == "home" || tag == "urgent"
            }
        }
        let eval = Eval::new(ValueContext::default());
        assert!(eval
            .evaluate_infix("tags _hastag_ 'home'", Some(&Tagged))
            .unwrap()
            .as_bool());
        assert!(!eval
            .evaluate_infix("tags _hastag_ 'work'", Some(&Tagged))
            .unwrap()
            .as_bool());
        assert!(eval
            .evaluate_infix("tags _notag_ 'work'", Some(&Tagged))
            .unwrap()
            .as_bool());
    }

    #[test]
    fn test_malformed_stack() {
        assert!(eval("").is_err());
        assert!(eval("1 +").is_err());
    }

    #[test]
    fn test_string_equality() {
        assert!(eval("'pending' == 'pending'").unwrap().as_bool());
        assert!(!eval("'pending' == 'completed'").unwrap().as_bool());
    }
}
