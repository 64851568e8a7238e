//! Capture substitution.
//!
//! Replaces `Capture(name)` leaves in a shape with their bound shapes,
//! rebuilding only the spine that actually changes. Used when a transform
//! produces a shape constant that mentions captures bound by an enclosing
//! conditional.

use crate::diagnostics::EvalError;
use crate::intern::ShapeInterner;
use crate::pattern::Bindings;
use crate::types::{FieldInfo, ShapeData, ShapeId};

/// Substitute every capture in `shape` from `bindings`.
///
/// An unbound capture is an error: captures only live inside patterns, and
/// letting one leak into an output shape would poison every later
/// comparison against it.
pub fn substitute(
    interner: &ShapeInterner,
    shape: ShapeId,
    bindings: &Bindings,
) -> Result<ShapeId, EvalError> {
    if !contains_capture(interner, shape) {
        return Ok(shape);
    }
    substitute_inner(interner, shape, bindings)
}

fn substitute_inner(
    interner: &ShapeInterner,
    shape: ShapeId,
    bindings: &Bindings,
) -> Result<ShapeId, EvalError> {
    let Some(data) = interner.lookup(shape) else {
        return Ok(shape);
    };
    match data {
        ShapeData::Capture(name) => bindings.get(name).ok_or_else(|| EvalError::UnboundCapture {
            name: interner.resolve_atom(name).to_string(),
        }),
        ShapeData::Array(element) => {
            let new_element = substitute_inner(interner, element, bindings)?;
            Ok(if new_element == element {
                shape
            } else {
                interner.array(new_element)
            })
        }
        ShapeData::Tuple(list, rest) => {
            let elements = interner.shape_list(list);
            let mut new_elements = Vec::with_capacity(elements.len());
            let mut changed = false;
            for &element in elements.iter() {
                let new_element = substitute_inner(interner, element, bindings)?;
                changed |= new_element != element;
                new_elements.push(new_element);
            }
            let new_rest = match rest {
                Some(rest) => {
                    let substituted = substitute_inner(interner, rest, bindings)?;
                    changed |= substituted != rest;
                    Some(substituted)
                }
                None => None,
            };
            if !changed {
                return Ok(shape);
            }
            Ok(match new_rest {
                Some(rest) => interner.tuple_with_rest(new_elements, rest),
                None => interner.tuple(new_elements),
            })
        }
        ShapeData::Record(record) => {
            let record_shape = interner.record_shape(record);
            let mut new_fields = Vec::with_capacity(record_shape.fields.len());
            let mut changed = false;
            for field in &record_shape.fields {
                let new_shape = substitute_inner(interner, field.shape, bindings)?;
                changed |= new_shape != field.shape;
                new_fields.push(FieldInfo::with_flags(field.name, new_shape, field.flags));
            }
            if !changed {
                return Ok(shape);
            }
            // Field names are untouched, so uniqueness is preserved.
            Ok(interner.record_from_parts(new_fields, record_shape.closed))
        }
        ShapeData::Union(list) => {
            let members = interner.shape_list(list);
            let mut new_members = Vec::with_capacity(members.len());
            let mut changed = false;
            for &member in members.iter() {
                let new_member = substitute_inner(interner, member, bindings)?;
                changed |= new_member != member;
                new_members.push(new_member);
            }
            if !changed {
                return Ok(shape);
            }
            // Re-union: substitution may have collapsed members together.
            Ok(interner.union(new_members))
        }
        ShapeData::Function(params, result) => {
            let param_list = interner.shape_list(params);
            let mut new_params = Vec::with_capacity(param_list.len());
            let mut changed = false;
            for &param in param_list.iter() {
                let new_param = substitute_inner(interner, param, bindings)?;
                changed |= new_param != param;
                new_params.push(new_param);
            }
            let new_result = substitute_inner(interner, result, bindings)?;
            changed |= new_result != result;
            if !changed {
                return Ok(shape);
            }
            Ok(interner.function(new_params, new_result))
        }
        ShapeData::Primitive(_)
        | ShapeData::Literal(_)
        | ShapeData::Ref(_)
        | ShapeData::Never
        | ShapeData::Unknown => Ok(shape),
    }
}

/// Does the shape mention any capture?
pub(crate) fn contains_capture(interner: &ShapeInterner, shape: ShapeId) -> bool {
    let Some(data) = interner.lookup(shape) else {
        return false;
    };
    match data {
        ShapeData::Capture(_) => true,
        ShapeData::Array(element) => contains_capture(interner, element),
        ShapeData::Tuple(list, rest) => {
            interner
                .shape_list(list)
                .iter()
                .any(|&e| contains_capture(interner, e))
                || rest.is_some_and(|r| contains_capture(interner, r))
        }
        ShapeData::Record(record) => interner
            .record_shape(record)
            .fields
            .iter()
            .any(|f| contains_capture(interner, f.shape)),
        ShapeData::Union(list) => interner
            .shape_list(list)
            .iter()
            .any(|&m| contains_capture(interner, m)),
        ShapeData::Function(params, result) => {
            interner
                .shape_list(params)
                .iter()
                .any(|&p| contains_capture(interner, p))
                || contains_capture(interner, result)
        }
        _ => false,
    }
}
