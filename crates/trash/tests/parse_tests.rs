//! Reader behavior: the grammar's positive space, the malformed inputs the
//! reader must reject, and the print → re-parse identity.

use pretty_assertions::assert_eq;
use trash::{ErrorKind, Heap, NoPrint, Parser, ReplSession, Value, structurally_equal};

/// Parses and evaluates in a fresh session, returning the printed value.
fn eval_str(source: &str) -> String {
    ReplSession::new()
        .eval_to_string(source)
        .expect("evaluation should succeed")
}

/// Asserts `source` fails to read with a SyntaxError.
fn assert_syntax_error(source: &str) {
    let err = ReplSession::new()
        .execute(source, &mut NoPrint)
        .expect_err("reading should fail");
    assert_eq!(err.kind(), ErrorKind::Syntax, "for input {source:?}: {err}");
}

/// Printing a parsed form and re-parsing it yields a structurally equal
/// tree, for inputs that do not involve quote expansion.
fn assert_reparse_identity(source: &str) {
    let mut heap = Heap::new();
    let first = Parser::from_source(source)
        .read(&mut heap)
        .expect("reading should succeed")
        .expect("input should contain a form");
    let printed = heap.render(first);
    let second = Parser::from_source(&printed)
        .read(&mut heap)
        .expect("re-reading should succeed")
        .expect("printed form should re-parse");
    assert!(
        structurally_equal(&heap, first, second),
        "printing {source:?} as {printed:?} should re-parse to an equal tree"
    );
}

#[test]
fn atoms() {
    assert_eq!(eval_str("-323"), "-323");
    assert_eq!(eval_str("+17"), "17");
    assert_eq!(eval_str("#t"), "#t");
    assert_eq!(eval_str("#f"), "#f");
    assert_eq!(eval_str("\"spaces inside\""), "\"spaces inside\"");
}

#[test]
fn quote_shorthand_expands() {
    assert_eq!(eval_str("'(1 2)"), "(1 2)");
    assert_eq!(eval_str("(quote (1 2))"), "(1 2)");

    // At the reader level, 'x is literally (quote x).
    let mut heap = Heap::new();
    let form = Parser::from_source("'x")
        .read(&mut heap)
        .unwrap()
        .expect("a form");
    assert_eq!(heap.render(form), "(quote x)");
}

#[test]
fn dotted_pairs() {
    assert_eq!(eval_str("'(1 . 2)"), "(1 . 2)");
    assert_eq!(eval_str("'(1 2 . 3)"), "(1 2 . 3)");
    assert_eq!(eval_str("'(1 . (2 . (3 . ())))"), "(1 2 3)");
}

#[test]
fn reader_yields_forms_in_order() {
    let mut heap = Heap::new();
    let mut parser = Parser::from_source("1 (2 3) x");
    assert_eq!(parser.read(&mut heap).unwrap(), Some(Value::Int(1)));
    let list = parser.read(&mut heap).unwrap().expect("a form");
    assert_eq!(heap.render(list), "(2 3)");
    let sym = parser.read(&mut heap).unwrap().expect("a form");
    assert_eq!(heap.render(sym), "x");
    assert_eq!(parser.read(&mut heap).unwrap(), None);
}

#[test]
fn reparse_identity() {
    for source in [
        "42",
        "-7",
        "#t",
        "sym",
        "\"text\"",
        "(1 2 3)",
        "(1 . 2)",
        "(a (b c) . d)",
        "(() (()) ((())))",
        "(\"s\" 1 (x . y))",
    ] {
        assert_reparse_identity(source);
    }
}

/// A 1000-level nested list parses, prints, re-parses equal, and is
/// collectable once nothing roots it.
#[test]
fn deeply_nested_structure() {
    let mut source = String::new();
    for _ in 0..1000 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..1000 {
        source.push(')');
    }

    let mut heap = Heap::new();
    let first = Parser::from_source(&source)
        .read(&mut heap)
        .unwrap()
        .expect("a form");
    let printed = heap.render(first);
    assert_eq!(printed, source);

    let second = Parser::from_source(&printed)
        .read(&mut heap)
        .unwrap()
        .expect("a form");
    assert!(structurally_equal(&heap, first, second));

    // Nothing roots the trees; a collection reclaims every cell.
    heap.collect();
    assert_eq!(heap.stats().live_objects, 0);
}

#[test]
fn negative_cases() {
    for source in [
        "(",
        "(1",
        "(1 .",
        "( .",
        "(1 . ()",
        "(1 . )",
        "(1 . 2 3)",
        ")(1)",
    ] {
        assert_syntax_error(source);
    }
}

#[test]
fn further_negative_cases() {
    assert_syntax_error("'");
    assert_syntax_error(".");
    assert_syntax_error("(1 . 2 . 3)");
    assert_syntax_error("\"unterminated");
    assert_syntax_error("12ab");
    assert_syntax_error("99999999999999999999");
}
