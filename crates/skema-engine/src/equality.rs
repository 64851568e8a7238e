//! Deep structural equality and containment queries.
//!
//! Interned ids give a fast positive check (`a == b`), but the converse is
//! not decisive: records preserve field order for output while equality
//! ignores it, and unions compare as sets. This module is the one notion of
//! shape identity used anywhere in the engine; nothing compares ids
//! directly for semantics.
//!
//! `Ref` compares by name and is never resolved here, so comparison always
//! terminates on recursive shapes.

use crate::intern::ShapeInterner;
use crate::types::{RecordShape, ShapeData, ShapeId};

/// Deep structural equality.
///
/// Tags and all sub-components must agree. Union equality is set equality;
/// record equality compares the field-name set and, per field, shape and
/// modifier equality. Key order never affects equality, only output order.
pub fn structurally_equal(interner: &ShapeInterner, a: ShapeId, b: ShapeId) -> bool {
    if a == b {
        return true;
    }
    let (Some(da), Some(db)) = (interner.lookup(a), interner.lookup(b)) else {
        return false;
    };
    match (da, db) {
        (ShapeData::Primitive(ka), ShapeData::Primitive(kb)) => ka == kb,
        (ShapeData::Literal(va), ShapeData::Literal(vb)) => va == vb,
        (ShapeData::Array(ea), ShapeData::Array(eb)) => structurally_equal(interner, ea, eb),
        (ShapeData::Tuple(la, ra), ShapeData::Tuple(lb, rb)) => {
            let ea = interner.shape_list(la);
            let eb = interner.shape_list(lb);
            if ea.len() != eb.len() {
                return false;
            }
            let rest_equal = match (ra, rb) {
                (None, None) => true,
                (Some(ta), Some(tb)) => structurally_equal(interner, ta, tb),
                _ => false,
            };
            rest_equal
                && ea
                    .iter()
                    .zip(eb.iter())
                    .all(|(&x, &y)| structurally_equal(interner, x, y))
        }
        (ShapeData::Record(ra), ShapeData::Record(rb)) => {
            records_equal(interner, &interner.record_shape(ra), &interner.record_shape(rb))
        }
        (ShapeData::Union(la), ShapeData::Union(lb)) => {
            let ma = interner.shape_list(la);
            let mb = interner.shape_list(lb);
            // Members are pairwise distinct by construction, so equal length
            // plus one-sided containment is set equality.
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|&member| contains(interner, &mb, member))
        }
        (ShapeData::Function(pa, ra), ShapeData::Function(pb, rb)) => {
            let xa = interner.shape_list(pa);
            let xb = interner.shape_list(pb);
            xa.len() == xb.len()
                && structurally_equal(interner, ra, rb)
                && xa
                    .iter()
                    .zip(xb.iter())
                    .all(|(&x, &y)| structurally_equal(interner, x, y))
        }
        (ShapeData::Ref(na), ShapeData::Ref(nb)) => na == nb,
        (ShapeData::Capture(na), ShapeData::Capture(nb)) => na == nb,
        (ShapeData::Never, ShapeData::Never) | (ShapeData::Unknown, ShapeData::Unknown) => true,
        _ => false,
    }
}

fn records_equal(interner: &ShapeInterner, a: &RecordShape, b: &RecordShape) -> bool {
    if a.closed != b.closed || a.fields.len() != b.fields.len() {
        return false;
    }
    a.fields.iter().all(|fa| match b.field(fa.name) {
        Some(fb) => fa.flags == fb.flags && structurally_equal(interner, fa.shape, fb.shape),
        None => false,
    })
}

/// True iff some element of `haystack` is structurally equal to `needle`.
pub fn contains(interner: &ShapeInterner, haystack: &[ShapeId], needle: ShapeId) -> bool {
    haystack
        .iter()
        .any(|&candidate| structurally_equal(interner, candidate, needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldFlags, FieldInfo};

    #[test]
    fn record_equality_ignores_key_order() {
        let interner = ShapeInterner::new();
        let a = interner.intern_string("a");
        let b = interner.intern_string("b");
        let ab = interner
            .record(vec![
                FieldInfo::new(a, ShapeId::STRING),
                FieldInfo::new(b, ShapeId::NUMBER),
            ])
            .unwrap();
        let ba = interner
            .record(vec![
                FieldInfo::new(b, ShapeId::NUMBER),
                FieldInfo::new(a, ShapeId::STRING),
            ])
            .unwrap();
        assert!(structurally_equal(&interner, ab, ba));
    }

    #[test]
    fn record_equality_respects_flags() {
        let interner = ShapeInterner::new();
        let a = interner.intern_string("a");
        let plain = interner
            .record(vec![FieldInfo::new(a, ShapeId::STRING)])
            .unwrap();
        let optional = interner
            .record(vec![FieldInfo::with_flags(
                a,
                ShapeId::STRING,
                FieldFlags::OPTIONAL,
            )])
            .unwrap();
        assert!(!structurally_equal(&interner, plain, optional));
    }

    #[test]
    fn union_equality_is_order_independent() {
        let interner = ShapeInterner::new();
        let u1 = interner.union2(ShapeId::STRING, ShapeId::NUMBER);
        let u2 = interner.union2(ShapeId::NUMBER, ShapeId::STRING);
        assert!(structurally_equal(&interner, u1, u2));
    }

    #[test]
    fn literal_is_distinct_from_base_primitive() {
        let interner = ShapeInterner::new();
        let lit = interner.literal_string("on");
        assert!(!structurally_equal(&interner, lit, ShapeId::STRING));
    }

    #[test]
    fn contains_uses_structural_equality() {
        let interner = ShapeInterner::new();
        let a = interner.intern_string("a");
        let b = interner.intern_string("b");
        let ab = interner
            .record(vec![
                FieldInfo::new(a, ShapeId::STRING),
                FieldInfo::new(b, ShapeId::NUMBER),
            ])
            .unwrap();
        let ba = interner
            .record(vec![
                FieldInfo::new(b, ShapeId::NUMBER),
                FieldInfo::new(a, ShapeId::STRING),
            ])
            .unwrap();
        assert!(contains(&interner, &[ShapeId::NULL, ba], ab));
        assert!(!contains(&interner, &[ShapeId::NULL], ab));
    }
}
