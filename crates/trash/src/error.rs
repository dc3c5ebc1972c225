use std::fmt;

use strum::{Display, IntoStaticStr};

/// Result type alias for operations that can fail with an interpreter error.
pub type EvalResult<T> = Result<T, EvalError>;

/// The three error categories the interpreter distinguishes.
///
/// `Syntax` comes out of the reader, `Name` out of environment lookup and
/// assignment, `Runtime` out of application failures (non-applicable head,
/// arity mismatch, argument-type mismatch, list-index range errors, division
/// by zero, and other builtin domain violations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    #[strum(serialize = "syntax")]
    Syntax,
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "runtime")]
    Runtime,
}

/// An interpreter error unwinding to the nearest top-level recovery point.
///
/// Errors propagate as `Err` through the recursive evaluator; the REPL and
/// the script driver are the recovery points that print them. The printed
/// form matches the first-class error value rendering, so a caught error and
/// an error value stored in the heap display identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    kind: ErrorKind,
    message: String,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A reader error: malformed input.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    /// An unbound-variable error, carrying the offending name.
    pub fn name(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("variable not found: {name}"))
    }

    /// An application or builtin domain error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error:\n {}", self.kind, self.message)
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_error_value_rendering() {
        let err = EvalError::name("x");
        assert_eq!(err.to_string(), "name error:\n variable not found: x");
        assert_eq!(EvalError::syntax("bad").to_string(), "syntax error:\n bad");
    }
}
