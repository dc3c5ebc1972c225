//! The parser: recursive descent over the token stream, producing
//! heap-allocated S-expressions.
//!
//! Parsing runs with the heap in [`Phase::Read`] so that cons cells built
//! for a partially read form are never collected before they are attached
//! to their parent. The parser keeps a signed paren-balance counter; a
//! closing parenthesis that would drive it negative is an immediate syntax
//! error.

use crate::{
    error::{EvalError, EvalResult},
    heap::{Heap, Phase},
    lexer::{Token, Tokenizer},
    value::Value,
};

/// Recursive-descent parser over a tokenizer.
#[derive(Debug)]
pub struct Parser<I: Iterator<Item = char>> {
    tokens: Tokenizer<I>,
    depth: i64,
}

impl<'a> Parser<std::str::Chars<'a>> {
    /// Parser over an in-memory source string.
    #[must_use]
    pub fn from_source(source: &'a str) -> Self {
        Self::new(Tokenizer::new(source.chars()))
    }
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(tokens: Tokenizer<I>) -> Self {
        Self { tokens, depth: 0 }
    }

    /// Reads one complete form, or `None` at end of input.
    ///
    /// Puts the heap into the Read phase for the duration; the caller is
    /// responsible for switching back to [`Phase::Eval`] before evaluating
    /// the result, and for rooting the result before evaluation allocates.
    pub fn read(&mut self, heap: &mut Heap) -> EvalResult<Option<Value>> {
        heap.set_phase(Phase::Read);
        let Some(token) = self.tokens.next_token()? else {
            return Ok(None);
        };
        self.form(heap, token).map(Some)
    }

    fn form(&mut self, heap: &mut Heap, token: Token) -> EvalResult<Value> {
        match token {
            Token::Number(n) => Ok(Value::Int(n)),
            Token::Symbol(name) => Ok(match name.as_str() {
                "#t" => Value::Bool(true),
                "#f" => Value::Bool(false),
                _ => Value::Symbol(heap.intern(&name)),
            }),
            Token::Str(text) => Ok(heap.alloc_str(text)),
            Token::Quote => {
                let Some(next) = self.tokens.next_token()? else {
                    return Err(EvalError::syntax("expected a form after quote"));
                };
                let quoted = self.form(heap, next)?;
                let quote = Value::Symbol(heap.intern("quote"));
                let tail = heap.alloc_pair(quoted, Value::Nil);
                Ok(heap.alloc_pair(quote, tail))
            }
            Token::OpenParen => {
                self.depth += 1;
                self.list(heap)
            }
            Token::CloseParen => {
                self.depth -= 1;
                if self.depth < 0 {
                    Err(EvalError::syntax("unexpected closing parenthesis"))
                } else {
                    Err(EvalError::syntax("expected a form before closing parenthesis"))
                }
            }
            Token::Dot => Err(EvalError::syntax("unexpected dot")),
        }
    }

    /// Parses list elements after an opening parenthesis.
    fn list(&mut self, heap: &mut Heap) -> EvalResult<Value> {
        let mut items: Vec<Value> = Vec::new();
        loop {
            let Some(token) = self.tokens.next_token()? else {
                return Err(EvalError::syntax("unmatched opening parenthesis"));
            };
            match token {
                Token::CloseParen => {
                    self.depth -= 1;
                    return Ok(build_chain(heap, &items, Value::Nil));
                }
                Token::Dot => {
                    if items.is_empty() {
                        return Err(EvalError::syntax("improper list syntax"));
                    }
                    let tail = match self.tokens.next_token()? {
                        None => return Err(EvalError::syntax("unmatched opening parenthesis")),
                        Some(Token::CloseParen | Token::Dot) => {
                            return Err(EvalError::syntax("improper list syntax"));
                        }
                        Some(other) => self.form(heap, other)?,
                    };
                    return match self.tokens.next_token()? {
                        Some(Token::CloseParen) => {
                            self.depth -= 1;
                            Ok(build_chain(heap, &items, tail))
                        }
                        Some(_) => Err(EvalError::syntax("improper list syntax")),
                        None => Err(EvalError::syntax("unmatched opening parenthesis")),
                    };
                }
                other => {
                    let item = self.form(heap, other)?;
                    items.push(item);
                }
            }
        }
    }
}

/// Builds a cdr chain from collected elements, right to left.
///
/// Only callable during the Read phase, where collection is suppressed and
/// the intermediate cells need no rooting.
fn build_chain(heap: &mut Heap, items: &[Value], tail: Value) -> Value {
    let mut chain = tail;
    for &item in items.iter().rev() {
        chain = heap.alloc_pair(item, chain);
    }
    chain
}
