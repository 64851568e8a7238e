//! Recursive shapes end to end: productivity validation, deep variants
//! over self-referential definitions, and the recursion limits.

use crate::catalog;
use crate::diagnostics::{ConstructionError, EvalError};
use crate::evaluate::TransformEvaluator;
use crate::format::ShapeFormatter;
use crate::intern::ShapeInterner;
use crate::recursion::RecursionProfile;
use crate::registry::ShapeRegistry;
use crate::test_util::init_tracing;
use crate::types::{FieldInfo, ShapeId};

#[test]
fn unproductive_self_reference_fails_fast() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let err = registry
        .define(&interner, "T", interner.reference("T"))
        .unwrap_err();
    assert!(matches!(err, ConstructionError::MalformedRecursion { name } if name == "T"));
}

#[test]
fn deep_read_only_terminates_on_a_recursive_record() {
    init_tracing();
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();

    // T = { value: string, next: T }
    let node = interner
        .record(vec![
            FieldInfo::new(interner.intern_string("value"), ShapeId::STRING),
            FieldInfo::new(interner.intern_string("next"), interner.reference("T")),
        ])
        .unwrap();
    registry.define(&interner, "T", node).unwrap();

    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let result = evaluator
        .apply(&catalog::deep_read_only(&interner), node)
        .unwrap();
    // The self-reference is left in place rather than unfolded forever.
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ readonly value: string; readonly next: T }"
    );
}

#[test]
fn deep_read_only_crosses_mutual_recursion_once() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();

    let a_shape = interner
        .record(vec![FieldInfo::new(
            interner.intern_string("b"),
            interner.reference("B"),
        )])
        .unwrap();
    let b_shape = interner
        .record(vec![FieldInfo::new(
            interner.intern_string("a"),
            interner.reference("A"),
        )])
        .unwrap();
    registry.define(&interner, "A", a_shape).unwrap();
    registry.define(&interner, "B", b_shape).unwrap();

    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let result = evaluator
        .apply(&catalog::deep_read_only(&interner), a_shape)
        .unwrap();
    // B's definition is transformed inline; the reference back to A is the
    // cycle cut-off.
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ readonly b: { readonly a: A } }"
    );
}

#[test]
fn unresolved_reference_is_left_untouched() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();

    let record = interner
        .record(vec![FieldInfo::new(
            interner.intern_string("next"),
            interner.reference("Missing"),
        )])
        .unwrap();

    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let result = evaluator
        .apply(&catalog::deep_read_only(&interner), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ readonly next: Missing }"
    );
}

fn nest_records(interner: &ShapeInterner, depth: usize) -> ShapeId {
    let leaf = interner.intern_string("leaf");
    let inner = interner.intern_string("inner");
    let mut shape = interner
        .record(vec![FieldInfo::new(leaf, ShapeId::STRING)])
        .unwrap();
    for _ in 0..depth {
        shape = interner
            .record(vec![FieldInfo::new(inner, shape)])
            .unwrap();
    }
    shape
}

#[test]
fn nesting_past_the_depth_limit_is_an_error() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    let deep = nest_records(&interner, 80);
    let err = evaluator
        .apply(&catalog::deep_read_only(&interner), deep)
        .unwrap_err();
    assert!(matches!(err, EvalError::RecursionLimitExceeded { .. }));
}

#[test]
fn the_depth_limit_is_configurable() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();

    let deep = nest_records(&interner, 80);
    let mut evaluator = TransformEvaluator::with_profile(
        &interner,
        &registry,
        RecursionProfile::Custom {
            max_depth: 200,
            max_iterations: 100_000,
        },
    );
    assert!(
        evaluator
            .apply(&catalog::deep_read_only(&interner), deep)
            .is_ok()
    );
}

#[test]
fn recursive_shape_from_json_spec_round_trips() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();

    let node = crate::builder::shape_from_json(
        &interner,
        r#"{ "kind": "record", "fields": {
            "value": { "shape": { "kind": "number" } },
            "children": { "shape": { "kind": "array",
                                      "element": { "kind": "ref", "name": "Tree" } } }
        } }"#,
    )
    .unwrap();
    registry.define(&interner, "Tree", node).unwrap();

    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let result = evaluator
        .apply(&catalog::deep_partial(&interner), node)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ value?: number; children?: Tree[] }"
    );
}
