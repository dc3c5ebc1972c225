use std::fmt::{self, Write};

use crate::{
    builtins::Builtin,
    env::EnvId,
    error::ErrorKind,
    forms::SpecialForm,
    heap::{Heap, HeapId},
    intern::SymbolId,
};

/// A runtime value.
///
/// This enum uses a hybrid design: small immediate values (integers,
/// booleans, interned symbols, the native callables) are stored inline,
/// while compound values (pairs, strings, closures, error values) live in
/// the heap arena and are referenced via `Ref(HeapId)`.
///
/// The immediates double as the collector's constant pool: nil, booleans,
/// integers and symbols never occupy an arena slot, so they are exempt from
/// collection by construction. `Value` is `Copy` because ownership is the
/// collector's business, not the borrow checker's; a copied `Value` is just
/// another edge into the heap graph.
///
/// Derived `PartialEq` is exactly `eq?`: identity for heap references,
/// payload equality for interned immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// The empty list `()`.
    Nil,
    /// `#t` / `#f`.
    Bool(bool),
    /// 64-bit signed integer; all arithmetic wraps.
    Int(i64),
    /// An interned symbol. Equal names always carry the same id.
    Symbol(SymbolId),
    /// A native function, applied with evaluated arguments.
    Builtin(Builtin),
    /// A special form, applied with unevaluated arguments.
    Form(SpecialForm),
    /// Reference into the heap arena (pair, string, closure, error).
    Ref(HeapId),
}

impl Value {
    /// The only false value is `#f`; everything else (including `()` and 0)
    /// is truthy.
    #[inline]
    #[must_use]
    pub fn is_false(self) -> bool {
        matches!(self, Self::Bool(false))
    }

    #[inline]
    #[must_use]
    pub fn is_truthy(self) -> bool {
        !self.is_false()
    }

    /// Human-readable variant name for error messages.
    #[must_use]
    pub fn kind_name(self, heap: &Heap) -> &'static str {
        match self {
            Self::Nil => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "number",
            Self::Symbol(_) => "symbol",
            Self::Builtin(_) => "function",
            Self::Form(_) => "special form",
            Self::Ref(id) => match heap.get(id) {
                HeapData::Pair(_) => "pair",
                HeapData::Str(_) => "string",
                HeapData::Closure(_) => "lambda function",
                HeapData::Error(_) => "error",
            },
        }
    }
}

/// Payload of a heap arena slot.
#[derive(Debug, Clone)]
pub enum HeapData {
    Pair(Pair),
    Str(Box<str>),
    Closure(Closure),
    Error(ErrorValue),
}

/// The one mutable compound shape. `set-car!` and `set-cdr!` rewrite these
/// edges in place, which is how user code builds cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

/// A user-defined function: captured environment, parameter names, and the
/// body forms evaluated sequentially on application.
#[derive(Debug, Clone)]
pub struct Closure {
    pub env: EnvId,
    pub params: Vec<SymbolId>,
    pub body: Vec<Value>,
}

/// A first-class error value.
///
/// Errors normally unwind through `Result`, but the REPL materialises caught
/// errors into these so they participate in the value graph and print with
/// the same shape as [`crate::EvalError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub message: Box<str>,
}

impl HeapData {
    /// Static variant name, used for heap statistics.
    #[must_use]
    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            Self::Pair(_) => "Pair",
            Self::Str(_) => "Str",
            Self::Closure(_) => "Closure",
            Self::Error(_) => "Error",
        }
    }

    /// Rough byte accounting for the collection threshold.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        let payload = match self {
            Self::Pair(_) => 0,
            Self::Str(s) => s.len(),
            Self::Closure(c) => {
                c.params.len() * size_of::<SymbolId>() + c.body.len() * size_of::<Value>()
            }
            Self::Error(e) => e.message.len(),
        };
        size_of::<Self>() + payload
    }

    /// Visits every value-to-value edge out of this payload.
    ///
    /// Pairs reach their car and cdr; closures reach their body forms. The
    /// closure's captured environment is an environment edge, reported via
    /// [`HeapData::captured_env`] instead. Strings and errors are leaves.
    pub(crate) fn trace(&self, visit: &mut impl FnMut(HeapId)) {
        match self {
            Self::Pair(pair) => {
                if let Value::Ref(id) = pair.car {
                    visit(id);
                }
                if let Value::Ref(id) = pair.cdr {
                    visit(id);
                }
            }
            Self::Closure(closure) => {
                for form in &closure.body {
                    if let Value::Ref(id) = *form {
                        visit(id);
                    }
                }
            }
            Self::Str(_) | Self::Error(_) => {}
        }
    }

    /// The environment edge out of this payload, if any.
    #[must_use]
    pub(crate) fn captured_env(&self) -> Option<EnvId> {
        match self {
            Self::Closure(closure) => Some(closure.env),
            _ => None,
        }
    }
}

/// Argument types a builtin can declare, forming a small subtype lattice.
///
/// `T` is the top type and admits any variant. `Symbol` admits booleans:
/// at the value level `#t` and `#f` behave as named symbols even though they
/// print through their own rules. `Function` admits anything applicable with
/// evaluated arguments, i.e. builtins and closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    T,
    Number,
    Symbol,
    Pair,
    Function,
    Str,
}

impl Ty {
    #[must_use]
    pub fn admits(self, heap: &Heap, value: Value) -> bool {
        match self {
            Self::T => true,
            Self::Number => matches!(value, Value::Int(_)),
            Self::Symbol => matches!(value, Value::Symbol(_) | Value::Bool(_)),
            Self::Pair => matches!(value, Value::Ref(id) if matches!(heap.get(id), HeapData::Pair(_))),
            Self::Function => match value {
                Value::Builtin(_) => true,
                Value::Ref(id) => matches!(heap.get(id), HeapData::Closure(_)),
                _ => false,
            },
            Self::Str => matches!(value, Value::Ref(id) if matches!(heap.get(id), HeapData::Str(_))),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::T => "any",
            Self::Number => "number",
            Self::Symbol => "symbol",
            Self::Pair => "pair",
            Self::Function => "function",
            Self::Str => "string",
        })
    }
}

/// Writes the printed form of `value`.
///
/// - `()` for nil, `#t`/`#f`, decimal integers, symbol names, quoted strings
/// - pairs as `(a b c)`, improper tails as `(a . b)`
/// - `#<function NAME>`, `#<special form NAME>`, `#<lambda function>`
/// - errors as `KIND error:` followed by the indented message
pub fn write_value<W: Write>(out: &mut W, heap: &Heap, value: Value) -> fmt::Result {
    match value {
        Value::Nil => out.write_str("()"),
        Value::Bool(true) => out.write_str("#t"),
        Value::Bool(false) => out.write_str("#f"),
        Value::Int(n) => write!(out, "{n}"),
        Value::Symbol(id) => out.write_str(heap.symbol_name(id)),
        Value::Builtin(builtin) => write!(out, "#<function {builtin}>"),
        Value::Form(form) => write!(out, "#<special form {form}>"),
        Value::Ref(id) => match heap.get(id) {
            HeapData::Pair(pair) => write_pair(out, heap, *pair),
            HeapData::Str(s) => write!(out, "\"{s}\""),
            HeapData::Closure(_) => out.write_str("#<lambda function>"),
            HeapData::Error(e) => write!(out, "{} error:\n {}", e.kind, e.message),
        },
    }
}

/// Prints a pair chain iteratively: walk the cdr spine, space-separating
/// cars, and close with ` . tail)` when the chain ends in a non-nil atom.
fn write_pair<W: Write>(out: &mut W, heap: &Heap, pair: Pair) -> fmt::Result {
    out.write_char('(')?;
    write_value(out, heap, pair.car)?;
    let mut tail = pair.cdr;
    loop {
        match tail {
            Value::Nil => break,
            Value::Ref(id) => {
                if let HeapData::Pair(next) = heap.get(id) {
                    out.write_char(' ')?;
                    write_value(out, heap, next.car)?;
                    tail = next.cdr;
                    continue;
                }
                out.write_str(" . ")?;
                write_value(out, heap, tail)?;
                break;
            }
            _ => {
                out.write_str(" . ")?;
                write_value(out, heap, tail)?;
                break;
            }
        }
    }
    out.write_char(')')
}

/// Structural equality, the `eql?` relation.
///
/// Values of different variants are never `eql?`. Pairs compare recursively,
/// strings by content, and the remaining heap variants fall back to
/// identity. `eq?` implies `eql?` by construction.
#[must_use]
pub fn structurally_equal(heap: &Heap, a: Value, b: Value) -> bool {
    if a == b {
        return true;
    }
    let (Value::Ref(left), Value::Ref(right)) = (a, b) else {
        return false;
    };
    match (heap.get(left), heap.get(right)) {
        (HeapData::Pair(p), HeapData::Pair(q)) => {
            let (p, q) = (*p, *q);
            structurally_equal(heap, p.car, q.car) && structurally_equal(heap, p.cdr, q.cdr)
        }
        (HeapData::Str(s), HeapData::Str(t)) => s == t,
        (HeapData::Error(e), HeapData::Error(f)) => e == f,
        _ => false,
    }
}
