#![doc = include_str!("../../../README.md")]

mod builtins;
mod env;
mod error;
mod eval;
mod forms;
mod heap;
mod intern;
mod io;
mod lexer;
mod parse;
mod repl;
mod run;
mod value;

pub use crate::{
    builtins::Builtin,
    env::EnvId,
    error::{ErrorKind, EvalError, EvalResult},
    forms::SpecialForm,
    heap::{DEFAULT_GC_THRESHOLD, Heap, HeapId, HeapStats, Phase},
    intern::SymbolId,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    lexer::{Token, Tokenizer},
    parse::Parser,
    repl::{ReplOutcome, ReplSession},
    run::{SOURCE_EXTENSION, has_source_extension, run_script},
    value::{Closure, ErrorValue, HeapData, Pair, Ty, Value, structurally_equal, write_value},
};
