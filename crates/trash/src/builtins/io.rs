//! I/O builtins: `print`, `read`, `load`, `exit`.

use std::io::{self, Read as _};

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    heap::{Heap, Phase},
    io::PrintWriter,
    lexer::Tokenizer,
    parse::Parser,
    run,
    value::{HeapData, Value},
};

/// `(print v)`: write the printed form and a newline; the value passes
/// through as the result.
pub(super) fn print<P: PrintWriter>(heap: &Heap, args: &[Value], print: &mut P) -> Value {
    print.write_str(&heap.render(args[0]));
    print.write_char('\n');
    args[0]
}

/// `(read)`: parse one complete form from standard input.
///
/// The heap drops into the Read phase for the duration of the parse and
/// comes back to Eval before the form is handed to the caller, whether the
/// parse succeeded or not.
pub(super) fn read(heap: &mut Heap) -> EvalResult<Value> {
    let stdin = io::stdin().lock();
    let chars = stdin.bytes().map_while(Result::ok).map(char::from);
    let mut parser = Parser::new(Tokenizer::new(chars));
    let form = parser.read(heap);
    heap.set_phase(Phase::Eval);
    match form? {
        Some(value) => Ok(value),
        None => Err(EvalError::runtime("read: no input")),
    }
}

/// `(load "path")`: evaluate a source file against the calling session's
/// top-level frame, wherever the call itself happened.
pub(super) fn load<P: PrintWriter>(
    heap: &mut Heap,
    env: EnvId,
    args: &[Value],
    print: &mut P,
) -> EvalResult<Value> {
    let Value::Ref(id) = args[0] else {
        unreachable!("argument types checked before dispatch");
    };
    let HeapData::Str(path) = heap.get(id) else {
        unreachable!("argument types checked before dispatch");
    };
    let path = path.to_string();
    let global = heap.env_global_of(env);
    run::load_path(heap, global, &path, print)?;
    Ok(Value::Nil)
}
