//! Script execution and file loading.
//!
//! Both paths share one read-eval loop that toggles the heap between the
//! Read and Eval phases around every form: `load` feeds a file into a
//! running session's top-level frame, while script mode evaluates a file
//! against a fresh one and stops at the first error.

use std::fs;

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    eval::eval,
    heap::{Heap, Phase},
    io::PrintWriter,
    parse::Parser,
    repl::ReplSession,
    value::Value,
};

/// The one file extension the interpreter accepts.
pub const SOURCE_EXTENSION: &str = ".trash";

/// True when `path` names a loadable source file.
#[must_use]
pub fn has_source_extension(path: &str) -> bool {
    path.ends_with(SOURCE_EXTENSION)
}

fn read_source(path: &str) -> EvalResult<String> {
    if !has_source_extension(path) {
        return Err(EvalError::runtime(format!("wrong file extension: {path}")));
    }
    fs::read_to_string(path).map_err(|err| EvalError::runtime(format!("cannot read {path}: {err}")))
}

/// Parses and evaluates every form of `source` against `env`.
///
/// Each top-level form is guarded before evaluation, since it is reachable
/// from nothing else until the evaluator walks it. Returns the last form's
/// value, `()` for an empty source.
pub(crate) fn eval_forms<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    source: &str,
    print: &mut P,
) -> EvalResult<Value> {
    let mut parser = Parser::from_source(source);
    let mut last = Value::Nil;
    loop {
        let form = parser.read(heap);
        heap.set_phase(Phase::Eval);
        let Some(form) = form? else {
            return Ok(last);
        };
        last = heap.scoped(|heap| {
            heap.guard(form);
            eval(heap, form, env, print)
        })?;
    }
}

/// The core of the `load` builtin: checks the extension, reads the file,
/// and evaluates its forms against the given (global) frame.
pub(crate) fn load_path<P: PrintWriter>(
    heap: &mut Heap,
    global: EnvId,
    path: &str,
    print: &mut P,
) -> EvalResult<Value> {
    let source = read_source(path)?;
    eval_forms(heap, global, &source, print)
}

/// Script mode: evaluates `path` against a fresh top-level environment.
///
/// A wrong extension is fatal, as is the first error any form produces.
/// The exit sentinel stops evaluation early without error.
pub fn run_script<P: PrintWriter>(path: &str, print: &mut P) -> Result<(), EvalError> {
    let source = read_source(path)?;
    let mut session = ReplSession::new();
    session.execute(&source, print).map(|_| ())
}
