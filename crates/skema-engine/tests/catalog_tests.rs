//! Utility catalog tests: every entry exercised against concrete shapes.

use crate::catalog;
use crate::diagnostics::EvalError;
use crate::equality::structurally_equal;
use crate::evaluate::{FieldFilter, TransformEvaluator};
use crate::format::ShapeFormatter;
use crate::intern::ShapeInterner;
use crate::registry::ShapeRegistry;
use crate::types::{FieldInfo, ShapeId};

fn user_record(interner: &ShapeInterner) -> ShapeId {
    let id = interner.intern_string("id");
    let name = interner.intern_string("name");
    let email = interner.intern_string("email");
    interner
        .record(vec![
            FieldInfo::new(id, ShapeId::NUMBER),
            FieldInfo::new(name, ShapeId::STRING),
            FieldInfo::new(email, ShapeId::STRING),
        ])
        .unwrap()
}

#[test]
fn make_optional_and_required_are_inverse_here() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = user_record(&interner);

    let optional = evaluator
        .apply(&catalog::make_optional(&interner), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(optional),
        "{ id?: number; name?: string; email?: string }"
    );
    let required = evaluator
        .apply(&catalog::make_required(&interner), optional)
        .unwrap();
    assert_eq!(required, record);
}

#[test]
fn make_read_only_then_mutable_round_trips() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = user_record(&interner);

    let frozen = evaluator
        .apply(&catalog::make_read_only(&interner), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(frozen),
        "{ readonly id: number; readonly name: string; readonly email: string }"
    );
    let thawed = evaluator
        .apply(&catalog::make_mutable(&interner), frozen)
        .unwrap();
    assert_eq!(thawed, record);
}

#[test]
fn pick_and_omit_select_fields() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = user_record(&interner);

    let picked = evaluator
        .apply(&catalog::pick(&interner, &["id", "email"]), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(picked),
        "{ id: number; email: string }"
    );

    let omitted = evaluator
        .apply(&catalog::omit(&interner, &["id", "email"]), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(omitted),
        "{ name: string }"
    );
}

#[test]
fn record_of_builds_uniform_records() {
    let interner = ShapeInterner::new();
    let shape = catalog::record_of(&interner, &["x", "y"], ShapeId::NUMBER).unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(shape),
        "{ x: number; y: number }"
    );
}

#[test]
fn exclude_drops_matching_members() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let c = interner.literal_string("c");
    let abc = interner.union3(a, b, c);
    let banned = interner.union2(a, c);

    let exclude = catalog::exclude(&interner, banned).unwrap();
    assert_eq!(evaluator.apply(&exclude, abc).unwrap(), b);
}

#[test]
fn exclude_by_primitive_drops_its_literals() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    // "on" | 1 with string excluded: the string literal goes too.
    let subject = interner.union2(interner.literal_string("on"), interner.literal_number(1.0));
    let exclude = catalog::exclude(&interner, ShapeId::STRING).unwrap();
    assert_eq!(
        evaluator.apply(&exclude, subject).unwrap(),
        interner.literal_number(1.0)
    );
}

#[test]
fn non_nullable_strips_null_and_undefined_exactly() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    let subject = interner.union3(ShapeId::STRING, ShapeId::NULL, ShapeId::UNDEFINED);
    let result = evaluator
        .apply(&catalog::non_nullable(&interner), subject)
        .unwrap();
    // Exactly the primitive, not a one-member union wrapper.
    assert_eq!(result, ShapeId::STRING);
}

#[test]
fn deep_read_only_reaches_nested_levels() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    let inner = interner
        .record(vec![FieldInfo::new(
            interner.intern_string("b"),
            ShapeId::STRING,
        )])
        .unwrap();
    let outer = interner
        .record(vec![
            FieldInfo::new(interner.intern_string("a"), inner),
            FieldInfo::new(interner.intern_string("list"), interner.array(inner)),
        ])
        .unwrap();

    let result = evaluator
        .apply(&catalog::deep_read_only(&interner), outer)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ readonly a: { readonly b: string }; readonly list: { readonly b: string }[] }"
    );
}

#[test]
fn deep_partial_reaches_tuples() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);

    let point = interner
        .record(vec![
            FieldInfo::new(interner.intern_string("x"), ShapeId::NUMBER),
            FieldInfo::new(interner.intern_string("y"), ShapeId::NUMBER),
        ])
        .unwrap();
    let pair = interner.tuple(vec![point, point]);
    let wrapper = interner
        .record(vec![FieldInfo::new(interner.intern_string("pair"), pair)])
        .unwrap();

    let result = evaluator
        .apply(&catalog::deep_partial(&interner), wrapper)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ pair?: [{ x?: number; y?: number }, { x?: number; y?: number }] }"
    );
}

#[test]
fn select_by_shape_keeps_matching_fields() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = user_record(&interner);

    let strings = evaluator
        .apply(
            &catalog::select_by_shape(&interner, FieldFilter::ShapeEquals(ShapeId::STRING)),
            record,
        )
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(strings),
        "{ name: string; email: string }"
    );
}

#[test]
fn key_remap_rules_rewrite_names() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = user_record(&interner);
    let formatter = ShapeFormatter::new(&interner);

    let prefixed = evaluator
        .apply(&catalog::prefix_keys(&interner, "raw_"), record)
        .unwrap();
    assert_eq!(
        formatter.format(prefixed),
        "{ raw_id: number; raw_name: string; raw_email: string }"
    );

    let stripped = evaluator
        .apply(&catalog::strip_prefix_keys(&interner, "raw_"), prefixed)
        .unwrap();
    assert_eq!(stripped, record);

    let capitalized = evaluator
        .apply(&catalog::capitalize_keys(&interner), record)
        .unwrap();
    assert_eq!(
        formatter.format(capitalized),
        "{ Id: number; Name: string; Email: string }"
    );
    let back = evaluator
        .apply(&catalog::uncapitalize_keys(&interner), capitalized)
        .unwrap();
    assert_eq!(back, record);

    let upper = evaluator
        .apply(&catalog::uppercase_keys(&interner), record)
        .unwrap();
    assert_eq!(
        formatter.format(upper),
        "{ ID: number; NAME: string; EMAIL: string }"
    );
}

#[test]
fn capitalize_handles_empty_and_non_ascii_keys() {
    let interner = ShapeInterner::new();
    let registry = ShapeRegistry::new();
    let mut evaluator = TransformEvaluator::new(&interner, &registry);
    let record = interner
        .record(vec![
            FieldInfo::new(interner.intern_string(""), ShapeId::NULL),
            FieldInfo::new(interner.intern_string("über"), ShapeId::STRING),
        ])
        .unwrap();

    let result = evaluator
        .apply(&catalog::capitalize_keys(&interner), record)
        .unwrap();
    assert_eq!(
        ShapeFormatter::new(&interner).format(result),
        "{ : null; Über: string }"
    );
}

#[test]
fn keys_of_returns_literal_key_union() {
    let interner = ShapeInterner::new();
    let record = user_record(&interner);

    let keys = catalog::keys_of(&interner, record).unwrap();
    let expected = interner.union3(
        interner.literal_string("id"),
        interner.literal_string("name"),
        interner.literal_string("email"),
    );
    assert!(structurally_equal(&interner, keys, expected));

    let empty = interner.record(vec![]).unwrap();
    assert_eq!(catalog::keys_of(&interner, empty).unwrap(), ShapeId::NEVER);

    let err = catalog::keys_of(&interner, ShapeId::STRING).unwrap_err();
    assert!(matches!(err, EvalError::ExpectedRecord { .. }));
}
