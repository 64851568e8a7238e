//! Structural pattern matching with capture slots.
//!
//! A pattern is an ordinary shape tree in which some leaf positions are
//! `Capture(name)` nodes. Matching walks pattern and value together and
//! binds each capture to the sub-shape it lines up with.
//!
//! Matching is shape-shaped, not value-shaped: a tuple pattern
//! `[first, ...rest]` binds `first` to the head element's shape and `rest`
//! to a fresh tuple of the remaining elements. Failure is silent; callers
//! decide whether `None` is a legitimate branch outcome or an error.

use rustc_hash::{FxHashMap, FxHashSet};
use skema_common::interner::Atom;

use crate::diagnostics::ConstructionError;
use crate::intern::ShapeInterner;
use crate::types::{ShapeData, ShapeId};

/// Immutable capture environment produced by matching and threaded through
/// evaluation. Extension clones; an environment handed to a callee is never
/// mutated underneath it.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    entries: FxHashMap<Atom, ShapeId>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Atom) -> Option<ShapeId> {
        self.entries.get(&name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A new environment with `name` bound, shadowing any previous binding.
    pub fn extended(&self, name: Atom, shape: ShapeId) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name, shape);
        Self { entries }
    }

    /// A new environment with every entry of `other` added.
    pub fn merged(&self, other: &Bindings) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (*k, *v)));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Atom, ShapeId)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    fn insert(&mut self, name: Atom, shape: ShapeId) {
        self.entries.insert(name, shape);
    }
}

/// A validated pattern: a shape id whose capture names are known unique.
#[derive(Copy, Clone, Debug)]
pub struct Pattern {
    shape: ShapeId,
}

impl Pattern {
    pub fn shape(self) -> ShapeId {
        self.shape
    }
}

/// Validate a shape for use as a pattern.
///
/// Rejects a capture name appearing twice in the same pattern; everything
/// else is legal (a pattern with no captures is just a shape test).
pub fn compile_pattern(
    interner: &ShapeInterner,
    shape: ShapeId,
) -> Result<Pattern, ConstructionError> {
    let mut seen = FxHashSet::default();
    check_captures(interner, shape, &mut seen)?;
    Ok(Pattern { shape })
}

fn check_captures(
    interner: &ShapeInterner,
    shape: ShapeId,
    seen: &mut FxHashSet<Atom>,
) -> Result<(), ConstructionError> {
    let Some(data) = interner.lookup(shape) else {
        return Ok(());
    };
    match data {
        ShapeData::Capture(name) => {
            if !seen.insert(name) {
                return Err(ConstructionError::DuplicateCapture {
                    name: interner.resolve_atom(name).to_string(),
                });
            }
            Ok(())
        }
        ShapeData::Array(element) => check_captures(interner, element, seen),
        ShapeData::Tuple(list, rest) => {
            for &element in interner.shape_list(list).iter() {
                check_captures(interner, element, seen)?;
            }
            match rest {
                Some(rest) => check_captures(interner, rest, seen),
                None => Ok(()),
            }
        }
        ShapeData::Record(record) => {
            for field in &interner.record_shape(record).fields {
                check_captures(interner, field.shape, seen)?;
            }
            Ok(())
        }
        ShapeData::Union(list) => {
            for &member in interner.shape_list(list).iter() {
                check_captures(interner, member, seen)?;
            }
            Ok(())
        }
        ShapeData::Function(params, result) => {
            for &param in interner.shape_list(params).iter() {
                check_captures(interner, param, seen)?;
            }
            check_captures(interner, result, seen)
        }
        ShapeData::Primitive(_)
        | ShapeData::Literal(_)
        | ShapeData::Ref(_)
        | ShapeData::Never
        | ShapeData::Unknown => Ok(()),
    }
}

/// Collect every capture name in a pattern, in no particular order.
pub(crate) fn collect_captures(interner: &ShapeInterner, shape: ShapeId, out: &mut Vec<Atom>) {
    let Some(data) = interner.lookup(shape) else {
        return;
    };
    match data {
        ShapeData::Capture(name) => out.push(name),
        ShapeData::Array(element) => collect_captures(interner, element, out),
        ShapeData::Tuple(list, rest) => {
            for &element in interner.shape_list(list).iter() {
                collect_captures(interner, element, out);
            }
            if let Some(rest) = rest {
                collect_captures(interner, rest, out);
            }
        }
        ShapeData::Record(record) => {
            for field in &interner.record_shape(record).fields {
                collect_captures(interner, field.shape, out);
            }
        }
        ShapeData::Union(list) => {
            for &member in interner.shape_list(list).iter() {
                collect_captures(interner, member, out);
            }
        }
        ShapeData::Function(params, result) => {
            for &param in interner.shape_list(params).iter() {
                collect_captures(interner, param, out);
            }
            collect_captures(interner, result, out);
        }
        _ => {}
    }
}

/// Match `value` against `pattern`, returning the captured bindings.
///
/// `None` means no match; it is an expected outcome, not an error.
pub fn match_shape(
    interner: &ShapeInterner,
    pattern: ShapeId,
    value: ShapeId,
) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if match_inner(interner, pattern, value, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

fn match_inner(
    interner: &ShapeInterner,
    pattern: ShapeId,
    value: ShapeId,
    bindings: &mut Bindings,
) -> bool {
    if pattern == value {
        return true;
    }

    // The bottom shape matches any pattern; captures are bound to Never so
    // downstream substitution still sees every name.
    if value == ShapeId::NEVER {
        let mut names = Vec::new();
        collect_captures(interner, pattern, &mut names);
        for name in names {
            bindings.insert(name, ShapeId::NEVER);
        }
        return true;
    }

    // A union value matches only if every member matches; captures are
    // joined by unioning the per-member bindings for the same name.
    if let Some(ShapeData::Union(members)) = interner.lookup(value) {
        let members = interner.shape_list(members);
        let base = bindings.clone();
        let mut merged = base.clone();
        for &member in members.iter() {
            let mut local = base.clone();
            if !match_inner(interner, pattern, member, &mut local) {
                return false;
            }
            for (name, shape) in local.iter() {
                if base.get(name).is_some() {
                    continue;
                }
                match merged.get(name) {
                    Some(existing) if existing != shape => {
                        merged.insert(name, interner.union2(existing, shape));
                    }
                    Some(_) => {}
                    None => merged.insert(name, shape),
                }
            }
        }
        *bindings = merged;
        return true;
    }

    let Some(pattern_data) = interner.lookup(pattern) else {
        return false;
    };

    match pattern_data {
        ShapeData::Capture(name) => {
            bindings.insert(name, value);
            true
        }
        ShapeData::Unknown => true,
        ShapeData::Never => false, // value == NEVER was handled above
        ShapeData::Primitive(kind) => match interner.lookup(value) {
            Some(ShapeData::Primitive(value_kind)) => kind == value_kind,
            // A literal is compatible with its base primitive.
            Some(ShapeData::Literal(lit)) => lit.primitive_kind() == kind,
            _ => false,
        },
        ShapeData::Literal(expected) => {
            matches!(interner.lookup(value), Some(ShapeData::Literal(actual)) if actual == expected)
        }
        ShapeData::Array(pattern_elem) => match interner.lookup(value) {
            Some(ShapeData::Array(value_elem)) => {
                match_inner(interner, pattern_elem, value_elem, bindings)
            }
            _ => false,
        },
        ShapeData::Tuple(pattern_list, pattern_rest) => match interner.lookup(value) {
            Some(ShapeData::Tuple(value_list, value_rest)) => {
                let pattern_elems = interner.shape_list(pattern_list);
                let value_elems = interner.shape_list(value_list);
                match_tuple(
                    interner,
                    &pattern_elems,
                    pattern_rest,
                    &value_elems,
                    value_rest,
                    bindings,
                )
            }
            _ => false,
        },
        ShapeData::Record(pattern_record) => match interner.lookup(value) {
            Some(ShapeData::Record(value_record)) => {
                let pattern_shape = interner.record_shape(pattern_record);
                let value_shape = interner.record_shape(value_record);
                // Every pattern field must be present with a matching shape.
                for pattern_field in &pattern_shape.fields {
                    let Some(value_field) = value_shape.field(pattern_field.name) else {
                        return false;
                    };
                    if !match_inner(interner, pattern_field.shape, value_field.shape, bindings) {
                        return false;
                    }
                }
                // A closed pattern rejects extra value fields.
                if pattern_shape.closed
                    && value_shape
                        .fields
                        .iter()
                        .any(|f| pattern_shape.field(f.name).is_none())
                {
                    return false;
                }
                true
            }
            _ => false,
        },
        // A union pattern is disjunctive: the first matching member wins.
        ShapeData::Union(pattern_members) => {
            let members = interner.shape_list(pattern_members);
            for &member in members.iter() {
                let mut local = bindings.clone();
                if match_inner(interner, member, value, &mut local) {
                    *bindings = local;
                    return true;
                }
            }
            false
        }
        ShapeData::Function(pattern_params, pattern_result) => match interner.lookup(value) {
            Some(ShapeData::Function(value_params, value_result)) => {
                let pp = interner.shape_list(pattern_params);
                let vp = interner.shape_list(value_params);
                if pp.len() != vp.len() {
                    return false;
                }
                for (&p, &v) in pp.iter().zip(vp.iter()) {
                    if !match_inner(interner, p, v, bindings) {
                        return false;
                    }
                }
                match_inner(interner, pattern_result, value_result, bindings)
            }
            _ => false,
        },
        ShapeData::Ref(name) => {
            matches!(interner.lookup(value), Some(ShapeData::Ref(value_name)) if value_name == name)
        }
    }
}

fn match_tuple(
    interner: &ShapeInterner,
    pattern_elems: &[ShapeId],
    pattern_rest: Option<ShapeId>,
    value_elems: &[ShapeId],
    value_rest: Option<ShapeId>,
    bindings: &mut Bindings,
) -> bool {
    match pattern_rest {
        Some(rest_pattern) => {
            // Head/tail decomposition: fixed prefix element-wise, then the
            // rest pattern against a fresh tuple of what remains.
            if value_elems.len() < pattern_elems.len() {
                return false;
            }
            for (&p, &v) in pattern_elems.iter().zip(value_elems.iter()) {
                if !match_inner(interner, p, v, bindings) {
                    return false;
                }
            }
            let remaining = value_elems[pattern_elems.len()..].to_vec();
            let tail = match value_rest {
                Some(rest) => interner.tuple_with_rest(remaining, rest),
                None => interner.tuple(remaining),
            };
            match_inner(interner, rest_pattern, tail, bindings)
        }
        None => {
            // Fixed arity: lengths and rests must line up exactly.
            if pattern_elems.len() != value_elems.len() || value_rest.is_some() {
                return false;
            }
            pattern_elems
                .iter()
                .zip(value_elems.iter())
                .all(|(&p, &v)| match_inner(interner, p, v, bindings))
        }
    }
}

/// Non-capturing compatibility test used by field filters: does `value`
/// match `pattern` at all, ignoring whatever it binds.
pub(crate) fn pattern_matches(interner: &ShapeInterner, pattern: ShapeId, value: ShapeId) -> bool {
    match_shape(interner, pattern, value).is_some()
}
