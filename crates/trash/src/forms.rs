//! Special forms: applied with their argument forms unevaluated.
//!
//! Keeping these as a separate value tag from builtins is what preserves the
//! two different argument-evaluation disciplines at the value level; a
//! special form decides itself what, and in which environment, to evaluate.

use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    eval::eval,
    heap::Heap,
    intern::SymbolId,
    io::PrintWriter,
    value::{Closure, Value},
};

/// The special forms installed in every top-level environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum SpecialForm {
    #[strum(serialize = "quote")]
    Quote,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "define")]
    Define,
    #[strum(serialize = "set!")]
    Set,
    #[strum(serialize = "lambda")]
    Lambda,
}

impl SpecialForm {
    /// Minimum and optional maximum argument-form counts.
    fn arity(self) -> (usize, Option<usize>) {
        match self {
            Self::Quote => (1, Some(1)),
            Self::If => (2, Some(3)),
            Self::And | Self::Or => (0, None),
            Self::Define | Self::Lambda => (2, None),
            Self::Set => (2, Some(2)),
        }
    }

    /// A form applied with the wrong number of argument forms is malformed
    /// input, not a runtime failure.
    pub(crate) fn check_arity(self, count: usize) -> EvalResult<()> {
        let (min, max) = self.arity();
        if count < min || max.is_some_and(|max| count > max) {
            return Err(EvalError::syntax(format!(
                "{self}: wrong number of arguments"
            )));
        }
        Ok(())
    }

    /// Applies the form to its unevaluated argument forms.
    pub(crate) fn apply<P: PrintWriter>(
        self,
        heap: &mut Heap,
        env: EnvId,
        args: &[Value],
        print: &mut P,
    ) -> EvalResult<Value> {
        match self {
            Self::Quote => Ok(args[0]),
            Self::If => form_if(heap, env, args, print),
            Self::And => form_and(heap, env, args, print),
            Self::Or => form_or(heap, env, args, print),
            Self::Define => form_define(heap, env, args, print),
            Self::Set => form_set(heap, env, args, print),
            Self::Lambda => form_lambda(heap, env, args),
        }
    }
}

/// `(if C T [E])`: evaluate the condition; pick the branch. A missing else
/// branch yields `()`.
fn form_if<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let condition = eval(heap, args[0], env, print)?;
    if condition.is_truthy() {
        eval(heap, args[1], env, print)
    } else {
        match args.get(2) {
            Some(&alternative) => eval(heap, alternative, env, print),
            None => Ok(Value::Nil),
        }
    }
}

/// `(and e…)`: left to right, stop at the first false value; the result is
/// the last value evaluated. `(and)` is `#t`.
fn form_and<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let mut result = Value::Bool(true);
    for &form in args {
        result = eval(heap, form, env, print)?;
        if result.is_false() {
            return Ok(result);
        }
    }
    Ok(result)
}

/// `(or e…)`: left to right, stop at the first non-false value. `(or)` is `#f`.
fn form_or<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    for &form in args {
        let result = eval(heap, form, env, print)?;
        if result.is_truthy() {
            return Ok(result);
        }
    }
    Ok(Value::Bool(false))
}

/// `(define name expr)` or `(define (name params…) body…)`.
///
/// The list shape desugars to binding `name` to a lambda over the same
/// params and body. Definitions always install into the current frame.
fn form_define<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    match args[0] {
        Value::Symbol(name) => {
            if args.len() != 2 {
                return Err(EvalError::syntax("define: wrong number of arguments"));
            }
            let value = eval(heap, args[1], env, print)?;
            heap.env_define(env, name, value);
            Ok(Value::Nil)
        }
        _ => {
            let Some(header) = heap.as_pair(args[0]) else {
                return Err(EvalError::syntax("define: wrong argument list"));
            };
            let Value::Symbol(name) = header.car else {
                return Err(EvalError::syntax("define: function name must be a symbol"));
            };
            let params = collect_params(heap, header.cdr)?;
            let closure = heap.alloc_closure(Closure {
                env,
                params,
                body: args[1..].to_vec(),
            });
            heap.env_define(env, name, closure);
            Ok(Value::Nil)
        }
    }
}

/// `(set! name expr)`: overwrite an existing binding in its defining frame.
fn form_set<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let Value::Symbol(name) = args[0] else {
        return Err(EvalError::runtime(
            "set!: trying to set something that is not a variable",
        ));
    };
    let value = eval(heap, args[1], env, print)?;
    heap.env_assign(env, name, value)?;
    Ok(Value::Nil)
}

/// `(lambda (params…) body…)`: build a closure capturing the current
/// environment. Free names resolve in the captured environment when the
/// closure is later applied, wherever that happens.
fn form_lambda(heap: &mut Heap, env: EnvId, args: &[Value]) -> EvalResult<Value> {
    let params = collect_params(heap, args[0])?;
    Ok(heap.alloc_closure(Closure {
        env,
        params,
        body: args[1..].to_vec(),
    }))
}

/// Walks a parameter list: `()` or a proper list of symbols.
fn collect_params(heap: &Heap, mut list: Value) -> EvalResult<Vec<SymbolId>> {
    let mut params = Vec::new();
    loop {
        match list {
            Value::Nil => return Ok(params),
            _ => {
                let Some(pair) = heap.as_pair(list) else {
                    return Err(EvalError::syntax("bad argument list"));
                };
                let Value::Symbol(name) = pair.car else {
                    return Err(EvalError::syntax("wrong argument name"));
                };
                params.push(name);
                list = pair.cdr;
            }
        }
    }
}
