//! The evaluator: a recursive interpreter over S-expressions.
//!
//! Literals self-evaluate, symbols resolve in the current environment, and
//! pairs are applications. Application evaluates the head; a special form
//! receives the unevaluated tail, while builtins and closures get the tail
//! evaluated left to right into an argument vector.
//!
//! Every intermediate produced here is pushed onto the heap's temporary
//! guard stack inside a [`Heap::scoped`] region, so a collection triggered
//! by a later allocation in the same expression can never reclaim it. The
//! scope releases on error unwinds too, which is what keeps the guard stack
//! balanced when an error propagates to the top level.

use smallvec::SmallVec;

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    heap::{Heap, HeapId},
    io::PrintWriter,
    value::{HeapData, Pair, Value},
};

/// Argument vector; calls rarely exceed a handful of arguments.
pub(crate) type ArgVec = SmallVec<[Value; 8]>;

/// Evaluates one form in the given environment.
pub(crate) fn eval<P: PrintWriter>(
    heap: &mut Heap,
    expr: Value,
    env: EnvId,
    print: &mut P,
) -> EvalResult<Value> {
    match expr {
        Value::Symbol(name) => heap.env_lookup(env, name).map(|(value, _)| value),
        Value::Ref(id) => match heap.get(id) {
            HeapData::Pair(pair) => {
                let pair = *pair;
                apply(heap, pair, env, print)
            }
            // Strings, closures and error values evaluate to themselves.
            _ => Ok(expr),
        },
        // A bare `()` is an application of nothing. Quoting it is how user
        // code gets its hands on the empty list.
        Value::Nil => Err(EvalError::runtime("the empty list is not applicable")),
        _ => Ok(expr),
    }
}

/// Applies a pair: `(head args…)`.
fn apply<P: PrintWriter>(
    heap: &mut Heap,
    pair: Pair,
    env: EnvId,
    print: &mut P,
) -> EvalResult<Value> {
    heap.scoped(|heap| {
        let head = eval(heap, pair.car, env, print)?;
        heap.guard(head);
        if let Value::Form(form) = head {
            let args = unevaluated_args(heap, pair.cdr)?;
            form.check_arity(args.len())?;
            return form.apply(heap, env, &args, print);
        }
        let args = evaluated_args(heap, pair.cdr, env, print)?;
        call_function(heap, head, &args, env, print)
    })
}

/// Invokes an applicable value with already-evaluated arguments.
///
/// The caller must hold `func` on the guard stack: a closure's body is only
/// reachable through the closure object itself while the call is running.
pub(crate) fn call_function<P: PrintWriter>(
    heap: &mut Heap,
    func: Value,
    args: &[Value],
    env: EnvId,
    print: &mut P,
) -> EvalResult<Value> {
    match func {
        Value::Builtin(builtin) => {
            builtin.check_args(heap, args)?;
            builtin.call(heap, env, args, print)
        }
        Value::Ref(id) if matches!(heap.get(id), HeapData::Closure(_)) => {
            apply_closure(heap, id, args, print)
        }
        _ => Err(EvalError::runtime(
            "first element of the list must be applicable",
        )),
    }
}

/// Collects an unevaluated argument list into a vector.
///
/// The tail of an application must be a proper list; an improper tail is a
/// runtime error, as is any attempt to apply through one.
pub(crate) fn unevaluated_args(heap: &Heap, mut tail: Value) -> EvalResult<ArgVec> {
    let mut args = ArgVec::new();
    loop {
        match tail {
            Value::Nil => return Ok(args),
            _ => {
                let Some(pair) = heap.as_pair(tail) else {
                    return Err(EvalError::runtime("argument list must be a proper list"));
                };
                args.push(pair.car);
                tail = pair.cdr;
            }
        }
    }
}

/// Evaluates an argument list left to right, guarding every result.
///
/// The guards land in the caller's scope, so all arguments stay alive until
/// the application completes.
fn evaluated_args<P: PrintWriter>(
    heap: &mut Heap,
    mut tail: Value,
    env: EnvId,
    print: &mut P,
) -> EvalResult<ArgVec> {
    let mut args = ArgVec::new();
    loop {
        match tail {
            Value::Nil => return Ok(args),
            _ => {
                let Some(pair) = heap.as_pair(tail) else {
                    return Err(EvalError::runtime("argument list must be a proper list"));
                };
                let value = eval(heap, pair.car, env, print)?;
                heap.guard(value);
                args.push(value);
                tail = pair.cdr;
            }
        }
    }
}

/// Invokes a closure.
///
/// A fresh frame is created as a child of the *captured* environment, not
/// the caller's, and guarded for the duration of the call. Parameters bind
/// to the evaluated arguments in that frame; body forms evaluate
/// sequentially and the last one's value is the result.
fn apply_closure<P: PrintWriter>(
    heap: &mut Heap,
    id: HeapId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let HeapData::Closure(closure) = heap.get(id) else {
        unreachable!("call_function only dispatches closures here");
    };
    let captured = closure.env;
    let params = closure.params.clone();
    let body = closure.body.clone();

    if args.len() != params.len() {
        return Err(EvalError::runtime(format!(
            "lambda function: expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }

    heap.scoped(|heap| {
        let frame = heap.env_create(Some(captured));
        heap.guard_env(frame);
        for (&param, &arg) in params.iter().zip(args) {
            heap.env_define(frame, param, arg);
        }
        let mut result = Value::Nil;
        for &form in &body {
            result = eval(heap, form, frame, print)?;
        }
        Ok(result)
    })
}
