//! A persistent interpreter session.
//!
//! `ReplSession` owns the heap and a pinned top-level frame, so variables,
//! functions, and interned symbols survive across `execute` calls. Errors
//! unwind out of a call but leave the session usable; the guard stack is
//! released on the way out and the phase flag is reset.

use crate::{
    builtins::{self, Builtin},
    env::EnvId,
    error::EvalError,
    eval::eval,
    heap::{DEFAULT_GC_THRESHOLD, Heap, Phase},
    io::{NoPrint, PrintWriter},
    parse::Parser,
    value::Value,
};

/// What a batch of forms produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplOutcome {
    /// The value of the last form.
    ///
    /// Nothing roots this value once `execute` returns; render or store it
    /// before the next `execute` call, which may collect it.
    Value(Value),
    /// A form evaluated to the exit sentinel; the driver should stop.
    Exit,
    /// The source contained no forms.
    Empty,
}

/// A persistent session: heap plus pinned top-level environment, populated
/// with the builtin registry.
#[derive(Debug)]
pub struct ReplSession {
    heap: Heap,
    global: EnvId,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_GC_THRESHOLD)
    }

    /// A session whose heap collects at the given live-byte threshold.
    /// Tests use a tiny threshold to force collections mid-expression.
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        let mut heap = Heap::with_threshold(threshold);
        let global = heap.env_create_global();
        builtins::install(&mut heap, global);
        Self { heap, global }
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The session's top-level frame.
    #[must_use]
    pub fn global(&self) -> EnvId {
        self.global
    }

    /// Renders a value through the printing rules.
    #[must_use]
    pub fn render(&self, value: Value) -> String {
        self.heap.render(value)
    }

    /// Parses and evaluates every form in `source` against the top-level
    /// frame, stopping early when a form produces the exit sentinel.
    ///
    /// An error from any form unwinds immediately; forms before it have
    /// already taken effect, which is exactly the top-level recovery
    /// behavior of the interactive loop.
    pub fn execute<P: PrintWriter>(
        &mut self,
        source: &str,
        print: &mut P,
    ) -> Result<ReplOutcome, EvalError> {
        let result = self.execute_forms(source, print);
        // Whatever happened, leave the session ready for the next call.
        self.heap.set_phase(Phase::Eval);
        result
    }

    fn execute_forms<P: PrintWriter>(
        &mut self,
        source: &str,
        print: &mut P,
    ) -> Result<ReplOutcome, EvalError> {
        let mut parser = Parser::from_source(source);
        let mut outcome = ReplOutcome::Empty;
        loop {
            let form = parser.read(&mut self.heap);
            self.heap.set_phase(Phase::Eval);
            let Some(form) = form? else {
                return Ok(outcome);
            };
            let global = self.global;
            let value = self.heap.scoped(|heap| {
                heap.guard(form);
                eval(heap, form, global, print)
            })?;
            if value == Value::Builtin(Builtin::Exit) {
                return Ok(ReplOutcome::Exit);
            }
            outcome = ReplOutcome::Value(value);
        }
    }

    /// Evaluates `source` with printing suppressed and returns the printed
    /// form of the last value. Test convenience.
    pub fn eval_to_string(&mut self, source: &str) -> Result<String, EvalError> {
        match self.execute(source, &mut NoPrint)? {
            ReplOutcome::Value(value) => Ok(self.render(value)),
            ReplOutcome::Exit => Ok(self.render(Value::Builtin(Builtin::Exit))),
            ReplOutcome::Empty => Ok(String::new()),
        }
    }

    /// Materialises an unwound error as a first-class error value in this
    /// session's heap.
    ///
    /// The interactive driver prints the value's printed form to stderr;
    /// user code can hold onto it like any other value.
    pub fn error_value(&mut self, error: &EvalError) -> Value {
        self.heap.alloc_error(error)
    }
}
