//! Session behavior: persistence across `execute` calls, error recovery,
//! print capture, the exit sentinel, and the file-loading drivers.

use pretty_assertions::assert_eq;
use trash::{
    CollectStringPrint, ErrorKind, NoPrint, ReplOutcome, ReplSession, Value, run_script,
};

/// Variables defined in one execute() call persist to the next.
#[test]
fn variables_persist_across_calls() {
    let mut session = ReplSession::new();
    session.execute("(define x 42)", &mut NoPrint).unwrap();
    assert_eq!(session.eval_to_string("x").unwrap(), "42");
    assert_eq!(session.eval_to_string("(+ x 1)").unwrap(), "43");
}

/// A function defined in one call can be applied in a later one.
#[test]
fn functions_persist_across_calls() {
    let mut session = ReplSession::new();
    session
        .execute("(define (double n) (* n 2))", &mut NoPrint)
        .unwrap();
    assert_eq!(session.eval_to_string("(double 21)").unwrap(), "42");
}

#[test]
fn empty_sources_yield_empty() {
    let mut session = ReplSession::new();
    assert_eq!(session.execute("", &mut NoPrint).unwrap(), ReplOutcome::Empty);
    assert_eq!(
        session.execute("   \n\t ", &mut NoPrint).unwrap(),
        ReplOutcome::Empty
    );
}

#[test]
fn last_form_wins() {
    let mut session = ReplSession::new();
    assert_eq!(
        session.execute("1 2 3", &mut NoPrint).unwrap(),
        ReplOutcome::Value(Value::Int(3))
    );
}

/// `(exit)` produces the sentinel and stops the remaining forms.
#[test]
fn exit_sentinel_stops_execution() {
    let mut session = ReplSession::new();
    assert_eq!(
        session.execute("(exit)", &mut NoPrint).unwrap(),
        ReplOutcome::Exit
    );

    let outcome = session
        .execute("(define x 1) (exit) (define y 2)", &mut NoPrint)
        .unwrap();
    assert_eq!(outcome, ReplOutcome::Exit);
    assert_eq!(session.eval_to_string("x").unwrap(), "1");
    let err = session.execute("y", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
}

/// An error unwinds to the top but the session stays usable.
#[test]
fn errors_leave_the_session_alive() {
    let mut session = ReplSession::new();
    let err = session.execute("(undefined-thing)", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
    assert_eq!(
        err.to_string(),
        "name error:\n variable not found: undefined-thing"
    );

    // Effects of forms before the failing one stick.
    let err = session
        .execute("(define kept 7) (car 0)", &mut NoPrint)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(session.eval_to_string("kept").unwrap(), "7");
}

/// A caught error materialises as a first-class error value whose printed
/// form matches the error's own rendering.
#[test]
fn errors_materialise_as_values() {
    let mut session = ReplSession::new();
    let err = session.execute("(set! ghost 1)", &mut NoPrint).unwrap_err();
    let value = session.error_value(&err);
    assert_eq!(session.render(value), err.to_string());
    assert_eq!(
        session.render(value),
        "name error:\n variable not found: ghost"
    );
}

#[test]
fn print_output_is_captured() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();
    let outcome = session.execute("(print 42)", &mut print).unwrap();
    assert_eq!(print.output(), "42\n");
    // print passes its argument through as the result.
    assert_eq!(outcome, ReplOutcome::Value(Value::Int(42)));
}

#[test]
fn print_uses_the_printing_rules() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();
    session
        .execute("(print \"hi\") (print '(1 . 2)) (print (+ 1 2))", &mut print)
        .unwrap();
    assert_eq!(print.output(), "\"hi\"\n(1 . 2)\n3\n");
}

#[test]
fn callables_print_by_name() {
    let mut session = ReplSession::new();
    assert_eq!(session.eval_to_string("car").unwrap(), "#<function car>");
    assert_eq!(session.eval_to_string("set-car!").unwrap(), "#<function set-car!>");
    assert_eq!(session.eval_to_string("if").unwrap(), "#<special form if>");
    assert_eq!(
        session.eval_to_string("(lambda (x) x)").unwrap(),
        "#<lambda function>"
    );
}

/// `load` refuses any path without the `.trash` extension before touching
/// the filesystem.
#[test]
fn load_requires_the_trash_extension() {
    let mut session = ReplSession::new();
    let err = session
        .execute("(load \"program.scm\")", &mut NoPrint)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
}

/// `load` evaluates file forms against the session's top-level frame.
#[test]
fn load_evaluates_into_the_global_frame() {
    let path = std::env::temp_dir().join("trash-load-test.trash");
    std::fs::write(&path, "(define loaded 41)\n").unwrap();

    let mut session = ReplSession::new();
    let source = format!("(load \"{}\")", path.display());
    session.execute(&source, &mut NoPrint).unwrap();
    assert_eq!(session.eval_to_string("(+ loaded 1)").unwrap(), "42");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn scripts_must_carry_the_extension() {
    let err = run_script("program.lisp", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
}

#[test]
fn script_mode_runs_a_file() {
    let path = std::env::temp_dir().join("trash-script-test.trash");
    std::fs::write(&path, "(define x 6)\n(print (* x 7))\n").unwrap();

    let mut print = CollectStringPrint::new();
    run_script(&path.to_string_lossy(), &mut print).unwrap();
    assert_eq!(print.output(), "42\n");

    let _ = std::fs::remove_file(&path);
}

/// Script mode surfaces the first error and stops.
#[test]
fn script_mode_stops_on_error() {
    let path = std::env::temp_dir().join("trash-script-error-test.trash");
    std::fs::write(&path, "(define x 1)\n(car x)\n(define y 2)\n").unwrap();

    let err = run_script(&path.to_string_lossy(), &mut NoPrint).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);

    let _ = std::fs::remove_file(&path);
}
