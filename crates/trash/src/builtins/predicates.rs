//! Type predicates and the equality pair `eq?` / `eql?`.

use crate::{
    heap::Heap,
    value::{Value, structurally_equal},
};

/// `(list? x)`: true for `()` and for any cdr chain terminating in `()`.
///
/// An improper chain ending in an atom is not a list; the caller
/// distinguishes by inspection, never by type.
pub(super) fn is_list(heap: &Heap, value: Value) -> Value {
    let mut current = value;
    loop {
        match current {
            Value::Nil => return Value::Bool(true),
            _ => match heap.as_pair(current) {
                Some(pair) => current = pair.cdr,
                None => return Value::Bool(false),
            },
        }
    }
}

/// `(eql? a b)`: structural equality within a variant. `eq?` implies `eql?`.
pub(super) fn eql(heap: &Heap, a: Value, b: Value) -> Value {
    Value::Bool(structurally_equal(heap, a, b))
}
