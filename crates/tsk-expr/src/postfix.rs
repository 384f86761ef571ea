//! Infix to postfix conversion.
//!
//! Dijkstra's shunting-yard over the operator table, honoring left and
//! right associativity. Mismatched parentheses are an error.

use tsk_lex::{Token, TokenKind};
use tsk_util::{Error, Result};

use crate::ops::{self, Assoc};

/// Convert an infix token sequence to postfix.
pub fn to_postfix(infix: Vec<Token>) -> Result<Vec<Token>> {
    // Short circuit.
    if infix.len() == 1 {
        return Ok(infix);
    }

    let mut postfix: Vec<Token> = Vec::with_capacity(infix.len());
    let mut op_stack: Vec<Token> = Vec::new();

    for token in infix {
        if token.kind == TokenKind::Op && token.text == "(" {
            op_stack.push(token);
        } else if token.kind == TokenKind::Op && token.text == ")" {
            let mut matched_open = false;
            while let Some(top) = op_stack.pop() {
                if top.text == "(" {
                    matched_open = true;
                    break;
                }
                postfix.push(top);
            }
            if !matched_open {
                return Err(Error::Parse(
                    "mismatched parentheses in expression".to_string(),
                ));
            }
        } else if token.kind == TokenKind::Op {
            if let Some(op) = ops::lookup(&token.text) {
                while let Some(top_op) = op_stack.last().and_then(|t| ops::lookup(&t.text)) {
                    let yields = match op.assoc {
                        Assoc::Left => op.precedence <= top_op.precedence,
                        Assoc::Right => op.precedence < top_op.precedence,
                        Assoc::Neither => false,
                    };
                    if !yields {
                        break;
                    }
                    if let Some(top) = op_stack.pop() {
                        postfix.push(top);
                    }
                }
                op_stack.push(token);
            } else {
                postfix.push(token);
            }
        } else {
            postfix.push(token);
        }
    }

    while let Some(top) = op_stack.pop() {
        if top.text == "(" || top.text == ")" {
            return Err(Error::Parse(
                "mismatched parentheses in expression".to_string(),
            ));
        }
        postfix.push(top);
    }

    Ok(postfix)
}
