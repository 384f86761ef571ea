//! Compiled filters.
//!
//! A filter is the postfix form of the FILTER-side expression. Two
//! shapes short-circuit the completed store: a leading
//! `status == 'pending'` clause, and filters that reference nothing
//! but working-set IDs.

use tsk_core::{Config, Task};
use tsk_expr::Eval;
use tsk_lex::{Token, TokenKind};
use tsk_util::Result;

use crate::resolver::TaskResolver;

/// A compiled, evaluable filter.
pub struct Filter {
    postfix: Vec<Token>,
}

impl Filter {
    /// Compile the filter tokens. An empty token list is the empty
    /// filter, which passes every task.
    pub fn compile(eval: &Eval, tokens: Vec<Token>) -> Result<Filter> {
        if tokens.is_empty() {
            return Ok(Filter {
                postfix: Vec::new(),
            });
        }
        let postfix = eval.compile(tokens)?;
        Ok(Filter { postfix })
    }

    pub fn is_empty(&self) -> bool {
        self.postfix.is_empty()
    }

    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    /// Evaluate against one task; the final value coerces to bool.
    pub fn pass(&self, eval: &Eval, task: &Task, config: &Config) -> Result<bool> {
        if self.postfix.is_empty() {
            return Ok(true);
        }
        let resolver = TaskResolver::new(task, config);
        let value = eval.evaluate_postfix(&self.postfix, Some(&resolver))?;
        Ok(value.as_bool())
    }

    /// True when evaluating this filter can never require the
    /// completed store.
    pub fn skips_completed(&self) -> bool {
        self.pending_only() || self.id_only()
    }

    /// The filter's first clause is `status == 'pending'`: postfix
    /// opens with `status 'pending' ==`.
    fn pending_only(&self) -> bool {
        if self.postfix.len() < 3 {
            return false;
        }
        self.postfix[0].kind == TokenKind::Identifier
            && self.postfix[0].text == "status"
            && self.postfix[1].text == "pending"
            && self.postfix[2].kind == TokenKind::Op
            && self.postfix[2].text == "=="
    }

    /// Every identifier is `id`, every literal a number, and only the
    /// operators an ID disjunction produces appear.
    fn id_only(&self) -> bool {
        if self.postfix.is_empty() {
            return false;
        }
        let mut saw_id = false;
        for token in &self.postfix {
            match token.kind {
                TokenKind::Identifier => {
                    if token.text != "id" {
                        return false;
                    }
                    saw_id = true;
                }
                TokenKind::Number => {}
                TokenKind::Op => {
                    if !matches!(
                        token.text.as_str(),
                        "==" | "<=" | ">=" | "<" | ">" | "and" | "or"
                    ) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        saw_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsk_expr::ValueContext;

    fn compile(text: &str) -> Filter {
        let eval = Eval::new(ValueContext::default());
        Filter::compile(&eval, tsk_lex::Lexer::split(text)).unwrap()
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let eval = Eval::new(ValueContext::default());
        let filter = Filter::compile(&eval, Vec::new()).unwrap();
        assert!(filter.is_empty());
        let config = Config::default();
        assert!(filter.pass(&eval, &Task::new("x"), &config).unwrap());
    }

    #[test]
    fn test_pending_only_shortcut() {
        assert!(compile("status == 'pending'").skips_completed());
        assert!(compile("status == 'pending' and +urgent").skips_completed());
        assert!(!compile("status == 'completed'").skips_completed());
        assert!(!compile("project = 'Home'").skips_completed());
    }

    #[test]
    fn test_id_only_shortcut() {
        assert!(compile("( id == 1 or ( id >= 3 and id <= 5 ) )").skips_completed());
        assert!(!compile("( uuid = 'a0b1c2d3' )").skips_completed());
        assert!(!compile("( id == 1 or project = 'x' )").skips_completed());
    }

    #[test]
    fn test_filter_evaluation() {
        let eval = Eval::new(ValueContext::default());
        let config = Config::default();

        let mut task = Task::new("Pay the bill");
        task.set("project", "Home.Garden");
        task.add_tag("urgent");

        let filter = compile("project = 'Home'");
        assert!(filter.pass(&eval, &task, &config).unwrap());

        let filter = compile("tags _hastag_ 'urgent'");
        assert!(filter.pass(&eval, &task, &config).unwrap());

        let filter = compile("description ~ 'bill'");
        assert!(filter.pass(&eval, &task, &config).unwrap());

        let filter = compile("project = 'Work'");
        assert!(!filter.pass(&eval, &task, &config).unwrap());
    }

    #[test]
    fn test_id_filter_depends_only_on_id() {
        let eval = Eval::new(ValueContext::default());
        let config = Config::default();
        let filter = compile("( id == 1 or ( id >= 3 and id <= 5 ) )");

        let mut task = Task::new("anything");
        for (id, expected) in [(1, true), (2, false), (3, true), (4, true), (5, true), (6, false)] {
            task.id = Some(id);
            assert_eq!(
                filter.pass(&eval, &task, &config).unwrap(),
                expected,
                "id {}",
                id
            );
        }
    }
}
