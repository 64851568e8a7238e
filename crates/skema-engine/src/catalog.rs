//! Catalog of named utility transforms.
//!
//! Every entry is a closed-form [`Transform`] built from evaluator
//! primitives; nothing here is special-cased inside the evaluator. The
//! catalog is the library-level vocabulary: make-optional, pick/omit,
//! exclusion over unions, deep variants, key remapping.

use crate::diagnostics::{ConstructionError, EvalError};
use crate::evaluate::{FieldFilter, KeyRename, NamedTransform, Toggle, Transform};
use crate::format::ShapeFormatter;
use crate::intern::ShapeInterner;
use crate::types::{FieldInfo, ShapeData, ShapeId};

fn toggle_fields(optional: Option<Toggle>, readonly: Option<Toggle>) -> Transform {
    Transform::MapFields {
        source: Box::new(Transform::Identity),
        per_field: Box::new(Transform::Identity),
        key_filter: None,
        key_rename: None,
        optional,
        readonly,
    }
}

/// Mark every field optional.
pub fn make_optional(interner: &ShapeInterner) -> NamedTransform {
    NamedTransform::new(
        interner,
        "MakeOptional",
        toggle_fields(Some(Toggle::Add), None),
    )
}

/// Strip the optional modifier from every field.
pub fn make_required(interner: &ShapeInterner) -> NamedTransform {
    NamedTransform::new(
        interner,
        "MakeRequired",
        toggle_fields(Some(Toggle::Remove), None),
    )
}

/// Mark every field read-only.
pub fn make_read_only(interner: &ShapeInterner) -> NamedTransform {
    NamedTransform::new(
        interner,
        "MakeReadOnly",
        toggle_fields(None, Some(Toggle::Add)),
    )
}

/// Strip the read-only modifier from every field.
pub fn make_mutable(interner: &ShapeInterner) -> NamedTransform {
    NamedTransform::new(
        interner,
        "MakeMutable",
        toggle_fields(None, Some(Toggle::Remove)),
    )
}

/// Keep only the named fields. Names absent from the source are ignored.
pub fn pick(interner: &ShapeInterner, keys: &[&str]) -> NamedTransform {
    NamedTransform::new(
        interner,
        "Pick",
        Transform::PickKeys {
            source: Box::new(Transform::Identity),
            keys: keys.iter().map(|k| interner.intern_string(k)).collect(),
        },
    )
}

/// Drop the named fields. Names absent from the source are ignored.
pub fn omit(interner: &ShapeInterner, keys: &[&str]) -> NamedTransform {
    NamedTransform::new(
        interner,
        "Omit",
        Transform::OmitKeys {
            source: Box::new(Transform::Identity),
            keys: keys.iter().map(|k| interner.intern_string(k)).collect(),
        },
    )
}

/// Build a record with one field per key, all sharing `value`.
pub fn record_of(
    interner: &ShapeInterner,
    keys: &[&str],
    value: ShapeId,
) -> Result<ShapeId, ConstructionError> {
    let fields = keys
        .iter()
        .map(|key| FieldInfo::new(interner.intern_string(key), value))
        .collect();
    interner.record(fields)
}

/// Drop union members matching `excluded`: each member the pattern matches
/// maps to `Never`, and re-unioning drops it.
///
/// The pattern may itself be a union; membership is then "matches any
/// member". Fails if `excluded` is not a valid pattern.
pub fn exclude(
    interner: &ShapeInterner,
    excluded: ShapeId,
) -> Result<NamedTransform, ConstructionError> {
    Ok(NamedTransform::new(
        interner,
        "Exclude",
        Transform::conditional(
            interner,
            Transform::Identity,
            excluded,
            Transform::Shape(ShapeId::NEVER),
            Transform::Identity,
        )?,
    ))
}

/// [`exclude`] specialized against `null | undefined`.
pub fn non_nullable(interner: &ShapeInterner) -> NamedTransform {
    let nullish = interner.union2(ShapeId::NULL, ShapeId::UNDEFINED);
    NamedTransform::new(
        interner,
        "NonNullable",
        Transform::Conditional {
            scrutinee: Box::new(Transform::Identity),
            pattern: nullish,
            then_branch: Box::new(Transform::Shape(ShapeId::NEVER)),
            else_branch: Box::new(Transform::Identity),
        },
    )
}

/// An open record pattern with no fields: matches any record.
fn any_record(interner: &ShapeInterner) -> ShapeId {
    interner.record_from_parts(Vec::new(), false)
}

fn deep_variant(interner: &ShapeInterner, name: &str, body: Transform) -> NamedTransform {
    // Apply the field toggles wherever the current shape is a record, then
    // recurse into structural children with the whole named transform.
    NamedTransform::new(
        interner,
        name,
        Transform::RecurseSelf(Box::new(Transform::Conditional {
            scrutinee: Box::new(Transform::Identity),
            pattern: any_record(interner),
            then_branch: Box::new(body),
            else_branch: Box::new(Transform::Identity),
        })),
    )
}

/// [`make_read_only`] applied through every record, tuple, and array level.
pub fn deep_read_only(interner: &ShapeInterner) -> NamedTransform {
    deep_variant(
        interner,
        "DeepReadOnly",
        toggle_fields(None, Some(Toggle::Add)),
    )
}

/// [`make_optional`] applied through every record, tuple, and array level.
pub fn deep_partial(interner: &ShapeInterner) -> NamedTransform {
    deep_variant(
        interner,
        "DeepPartial",
        toggle_fields(Some(Toggle::Add), None),
    )
}

/// Keep only fields whose shape satisfies the filter.
pub fn select_by_shape(interner: &ShapeInterner, filter: FieldFilter) -> NamedTransform {
    NamedTransform::new(
        interner,
        "SelectByShape",
        Transform::MapFields {
            source: Box::new(Transform::Identity),
            per_field: Box::new(Transform::Identity),
            key_filter: Some(filter),
            key_rename: None,
            optional: None,
            readonly: None,
        },
    )
}

/// Rewrite every field name by the given rule, keeping shapes untouched.
pub fn key_remap(interner: &ShapeInterner, rule: KeyRename) -> NamedTransform {
    NamedTransform::new(
        interner,
        "KeyRemap",
        Transform::MapFields {
            source: Box::new(Transform::Identity),
            per_field: Box::new(Transform::Identity),
            key_filter: None,
            key_rename: Some(rule),
            optional: None,
            readonly: None,
        },
    )
}

pub fn prefix_keys(interner: &ShapeInterner, prefix: &str) -> NamedTransform {
    key_remap(interner, KeyRename::Prefix(prefix.to_string()))
}

pub fn strip_prefix_keys(interner: &ShapeInterner, prefix: &str) -> NamedTransform {
    key_remap(interner, KeyRename::StripPrefix(prefix.to_string()))
}

pub fn capitalize_keys(interner: &ShapeInterner) -> NamedTransform {
    key_remap(interner, KeyRename::Capitalize)
}

pub fn uncapitalize_keys(interner: &ShapeInterner) -> NamedTransform {
    key_remap(interner, KeyRename::Uncapitalize)
}

pub fn uppercase_keys(interner: &ShapeInterner) -> NamedTransform {
    key_remap(interner, KeyRename::Uppercase)
}

pub fn lowercase_keys(interner: &ShapeInterner) -> NamedTransform {
    key_remap(interner, KeyRename::Lowercase)
}

/// The union of a record's keys as string-literal shapes; `Never` for a
/// record with no fields.
pub fn keys_of(interner: &ShapeInterner, shape: ShapeId) -> Result<ShapeId, EvalError> {
    match interner.lookup(shape) {
        Some(ShapeData::Record(record)) => {
            let record = interner.record_shape(record);
            let keys: Vec<ShapeId> = record
                .fields
                .iter()
                .map(|field| interner.literal_string_atom(field.name))
                .collect();
            Ok(interner.union(keys))
        }
        _ => Err(EvalError::ExpectedRecord {
            operation: "keys_of",
            actual: ShapeFormatter::new(interner).format(shape),
        }),
    }
}
