//! List primitives: accessors, mutators, constructors, and `map`.
//!
//! Constructors that chain allocations guard every intermediate cell: the
//! spine of a half-built list is reachable from nowhere else, and any of
//! the remaining allocations may trigger a collection.

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    eval::call_function,
    heap::Heap,
    io::PrintWriter,
    value::{HeapData, Pair, Value},
};

fn pair(heap: &Heap, value: Value) -> Pair {
    heap.as_pair(value)
        .expect("argument types checked before dispatch")
}

/// `(car p)`.
pub(super) fn car(heap: &Heap, args: &[Value]) -> EvalResult<Value> {
    Ok(pair(heap, args[0]).car)
}

/// `(cdr p)`.
pub(super) fn cdr(heap: &Heap, args: &[Value]) -> EvalResult<Value> {
    Ok(pair(heap, args[0]).cdr)
}

/// `(set-car! p v)`: rewrite the car edge in place; returns the pair.
pub(super) fn set_car(heap: &mut Heap, args: &[Value]) -> EvalResult<Value> {
    let Value::Ref(id) = args[0] else {
        unreachable!("argument types checked before dispatch");
    };
    if let HeapData::Pair(pair) = heap.get_mut(id) {
        pair.car = args[1];
    }
    Ok(args[0])
}

/// `(set-cdr! p v)`: rewrite the cdr edge in place; returns the pair.
pub(super) fn set_cdr(heap: &mut Heap, args: &[Value]) -> EvalResult<Value> {
    let Value::Ref(id) = args[0] else {
        unreachable!("argument types checked before dispatch");
    };
    if let HeapData::Pair(pair) = heap.get_mut(id) {
        pair.cdr = args[1];
    }
    Ok(args[0])
}

/// `(list v…)`: a fresh proper list of the arguments.
pub(super) fn list(heap: &mut Heap, args: &[Value]) -> Value {
    heap.scoped(|heap| {
        let mut chain = Value::Nil;
        for &item in args.iter().rev() {
            chain = heap.alloc_pair(item, chain);
            heap.guard(chain);
        }
        chain
    })
}

/// `(list-ref p n)`: the element `n` cdr-steps in.
pub(super) fn list_ref(heap: &Heap, args: &[Value]) -> EvalResult<Value> {
    let Value::Int(index) = args[1] else {
        unreachable!("argument types checked before dispatch");
    };
    if index < 0 {
        return Err(EvalError::runtime("list-ref: index out of range"));
    }
    let mut current = args[0];
    for _ in 0..index {
        let Some(next) = heap.as_pair(current) else {
            return Err(EvalError::runtime("list-ref: list is too short"));
        };
        current = next.cdr;
    }
    match heap.as_pair(current) {
        Some(found) => Ok(found.car),
        None => Err(EvalError::runtime("list-ref: list is too short")),
    }
}

/// `(list-tail p)`: the final pair of a proper list.
pub(super) fn list_tail(heap: &Heap, args: &[Value]) -> EvalResult<Value> {
    let mut current = args[0];
    loop {
        let Some(here) = heap.as_pair(current) else {
            return Err(EvalError::runtime("list-tail: not a proper list"));
        };
        if here.cdr == Value::Nil {
            return Ok(current);
        }
        current = here.cdr;
    }
}

/// `(map f p)`: apply `f` to each element of a proper list, collecting the
/// results into a fresh list in order.
pub(super) fn map<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let func = args[0];
    heap.scoped(|heap| {
        // The callee itself must survive the element calls: a closure's
        // body is only reachable through the closure object.
        heap.guard(func);
        let mut results: Vec<Value> = Vec::new();
        let mut tail = args[1];
        loop {
            match tail {
                Value::Nil => break,
                _ => {
                    let Some(here) = heap.as_pair(tail) else {
                        return Err(EvalError::runtime("map: not a proper list"));
                    };
                    let mapped = call_function(heap, func, &[here.car], env, print)?;
                    heap.guard(mapped);
                    results.push(mapped);
                    tail = here.cdr;
                }
            }
        }
        let mut chain = Value::Nil;
        for &item in results.iter().rev() {
            chain = heap.alloc_pair(item, chain);
            heap.guard(chain);
        }
        Ok(chain)
    })
}
