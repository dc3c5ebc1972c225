//! Collector behavior: root survival, temporary guard scopes, interning
//! identity, environment-root pruning, and cycle reclamation.
//!
//! Most tests run with a zero threshold so every allocation in the Eval
//! phase attempts a collection first, the harshest schedule the guard
//! discipline must survive.

use trash::{Heap, NoPrint, Phase, ReplSession, Value};

/// Values reachable from an environment binding survive collection.
#[test]
fn reachable_values_survive_collection() {
    let mut heap = Heap::with_threshold(0);
    let global = heap.env_create_global();
    let name = heap.intern("xs");
    let list = heap.scoped(|heap| {
        let tail = heap.alloc_pair(Value::Int(2), Value::Nil);
        heap.guard(tail);
        let list = heap.alloc_pair(Value::Int(1), tail);
        heap.guard(list);
        list
    });
    heap.env_define(global, name, list);

    heap.collect();
    assert_eq!(heap.render(list), "(1 2)");
    assert_eq!(heap.stats().live_objects, 2);
}

/// A guarded temporary survives the collection a later allocation forces;
/// once the scope exits it is reclaimable like anything else.
#[test]
fn guard_scope_protects_temporaries() {
    let mut heap = Heap::with_threshold(0);
    let _global = heap.env_create_global();

    let (cell_id, rendered) = heap.scoped(|heap| {
        let cell = heap.alloc_pair(Value::Int(1), Value::Nil);
        heap.guard(cell);
        // This allocation forces a collection; the guard is all that keeps
        // `cell` alive through it.
        let outer = heap.alloc_pair(Value::Int(2), cell);
        heap.guard(outer);
        let Value::Ref(cell_id) = cell else {
            panic!("alloc_pair returns a heap reference");
        };
        assert!(heap.is_live(cell_id));
        (cell_id, heap.render(outer))
    });
    assert_eq!(rendered, "(2 1)");

    heap.collect();
    assert!(!heap.is_live(cell_id));
    assert_eq!(heap.stats().live_objects, 0);
}

/// Without a guard, an unrooted intermediate is gone by the next allocation.
#[test]
fn unguarded_intermediates_are_reclaimed() {
    let mut heap = Heap::with_threshold(0);
    let _global = heap.env_create_global();
    heap.alloc_pair(Value::Int(1), Value::Nil);
    heap.alloc_pair(Value::Int(2), Value::Nil);
    assert_eq!(heap.stats().live_objects, 1);
}

/// Freed slots go onto the free list and back out.
#[test]
fn freed_slots_are_reused() {
    let mut heap = Heap::with_threshold(0);
    let _global = heap.env_create_global();
    heap.alloc_pair(Value::Int(1), Value::Nil);
    heap.alloc_pair(Value::Int(2), Value::Nil);
    let stats = heap.stats();
    assert_eq!(stats.live_objects, 1);
    assert_eq!(stats.total_slots, 1);
    assert!(heap.collections() >= 1);
}

/// During the Read phase the allocator never collects; parser intermediates
/// are unrooted by design.
#[test]
fn read_phase_gates_the_collector() {
    let mut heap = Heap::with_threshold(0);
    let _global = heap.env_create_global();
    heap.set_phase(Phase::Read);
    for i in 0..10 {
        heap.alloc_pair(Value::Int(i), Value::Nil);
    }
    assert_eq!(heap.stats().live_objects, 10);

    heap.set_phase(Phase::Eval);
    heap.collect();
    assert_eq!(heap.stats().live_objects, 0);
}

/// One id per distinct name, both at the interner and at the value level.
#[test]
fn symbol_interning_is_identity() {
    let mut heap = Heap::new();
    let a = heap.intern("foo");
    let b = heap.intern("foo");
    let c = heap.intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);

    let mut session = ReplSession::new();
    assert_eq!(session.eval_to_string("(eq? 'foo 'foo)").unwrap(), "#t");
    let source = "(define a 'hello) (define b 'hello) (eq? a b)";
    assert_eq!(session.eval_to_string(source).unwrap(), "#t");
}

/// A call frame nothing captured is pruned from the root table.
#[test]
fn call_frames_are_pruned_once_unreachable() {
    let mut session = ReplSession::new();
    session.execute("((lambda (x) x) 1)", &mut NoPrint).unwrap();
    session.heap_mut().collect();
    assert_eq!(session.heap().stats().live_envs, 1);
}

/// A frame captured by a live closure stays registered; dropping the last
/// reference to the closure releases the frame on the next cycle.
#[test]
fn captured_frames_survive_pruning() {
    let mut session = ReplSession::new();
    let source = "(define add5 ((lambda (n) (lambda (x) (+ x n))) 5))";
    session.execute(source, &mut NoPrint).unwrap();

    session.heap_mut().collect();
    assert_eq!(session.heap().stats().live_envs, 2);
    assert_eq!(session.eval_to_string("(add5 37)").unwrap(), "42");

    session.execute("(set! add5 0)", &mut NoPrint).unwrap();
    session.heap_mut().collect();
    assert_eq!(session.heap().stats().live_envs, 1);
}

/// Pair mutation builds cycles; the tracing collector reclaims them once
/// they are unreachable. Reference counting never could.
#[test]
fn cycles_are_reclaimed() {
    let mut session = ReplSession::new();
    let source = "(define p (cons 1 2)) (set-cdr! p p) (define ok 1)";
    session.execute(source, &mut NoPrint).unwrap();

    session.heap_mut().collect();
    assert_eq!(session.heap().stats().objects_by_type.get("Pair"), Some(&1));

    session.execute("(set! p 0)", &mut NoPrint).unwrap();
    session.heap_mut().collect();
    assert_eq!(session.heap().stats().objects_by_type.get("Pair"), None);
}

/// The evaluator's guard discipline holds up when every allocation
/// collects: half-built lists, mapped results, and nested constructor
/// calls all stay alive exactly as long as they must.
#[test]
fn evaluator_guards_survive_constant_collection() {
    let mut session = ReplSession::with_threshold(0);
    assert_eq!(
        session
            .eval_to_string("(map (lambda (x) (cons x x)) '(1 2 3))")
            .unwrap(),
        "((1 . 1) (2 . 2) (3 . 3))"
    );
    assert_eq!(
        session.eval_to_string("(list 1 2 3 4 5)").unwrap(),
        "(1 2 3 4 5)"
    );
    assert_eq!(
        session
            .eval_to_string("(define (dup x) (cons x x)) (dup (dup 1))")
            .unwrap(),
        "((1 . 1) 1 . 1)"
    );
    assert_eq!(
        session
            .eval_to_string("(define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1)))))) (fact 10)")
            .unwrap(),
        "3628800"
    );
}

/// An error unwind releases every temporary guard on the way out.
#[test]
fn guard_stack_unwinds_on_error() {
    let mut session = ReplSession::new();
    assert!(session.execute("(cons 1 (no-such-name))", &mut NoPrint).is_err());
    assert_eq!(session.heap().guard_depth(), 0);
    assert_eq!(session.eval_to_string("(+ 1 2)").unwrap(), "3");
}

/// Closures keep their body expressions alive through the heap graph.
#[test]
fn closure_bodies_survive_collection() {
    let mut session = ReplSession::with_threshold(0);
    let source = "(define (greet) (cons \"hi\" '())) (greet)";
    assert_eq!(session.eval_to_string(source).unwrap(), "(\"hi\")");
    // A second call after a full collection still sees the body.
    session.heap_mut().collect();
    assert_eq!(session.eval_to_string("(greet)").unwrap(), "(\"hi\")");
}
