//! Declarative shape construction.
//!
//! [`ShapeSpec`] is a serde-friendly description of a shape, the form an
//! external caller (a config loader, a request validator) hands over as
//! JSON. [`build_shape`] compiles a spec into validated interned shapes;
//! every model invariant is enforced here, so a spec either produces a
//! well-formed shape or a structured [`ConstructionError`].
//!
//! Record fields deserialize through an insertion-ordered map, so the spec's
//! key order is the record's key order.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::diagnostics::ConstructionError;
use crate::intern::ShapeInterner;
use crate::types::{FieldFlags, FieldInfo, ShapeId};

/// One literal value in a spec. Untagged: `true`, `42`, and `"on"` all read
/// naturally from JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LiteralSpec {
    Boolean(bool),
    Number(f64),
    String(String),
}

/// One record field in a spec.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub shape: ShapeSpec,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub read_only: bool,
}

/// Serde-deserializable shape description.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeSpec {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Never,
    Unknown,
    Literal {
        value: LiteralSpec,
    },
    Array {
        element: Box<ShapeSpec>,
    },
    Tuple {
        elements: Vec<ShapeSpec>,
        #[serde(default)]
        rest: Option<Box<ShapeSpec>>,
    },
    Record {
        fields: IndexMap<String, FieldSpec>,
        #[serde(default)]
        closed: bool,
    },
    Union {
        members: Vec<ShapeSpec>,
    },
    Function {
        params: Vec<ShapeSpec>,
        result: Box<ShapeSpec>,
    },
    Ref {
        name: String,
    },
    Capture {
        name: String,
    },
}

/// Compile a spec into an interned shape.
pub fn build_shape(
    interner: &ShapeInterner,
    spec: &ShapeSpec,
) -> Result<ShapeId, ConstructionError> {
    match spec {
        ShapeSpec::String => Ok(ShapeId::STRING),
        ShapeSpec::Number => Ok(ShapeId::NUMBER),
        ShapeSpec::Boolean => Ok(ShapeId::BOOLEAN),
        ShapeSpec::Null => Ok(ShapeId::NULL),
        ShapeSpec::Undefined => Ok(ShapeId::UNDEFINED),
        ShapeSpec::Never => Ok(ShapeId::NEVER),
        ShapeSpec::Unknown => Ok(ShapeId::UNKNOWN),
        ShapeSpec::Literal { value } => Ok(match value {
            LiteralSpec::Boolean(b) => interner.literal_boolean(*b),
            LiteralSpec::Number(n) => interner.literal_number(*n),
            LiteralSpec::String(s) => interner.literal_string(s),
        }),
        ShapeSpec::Array { element } => {
            let element = build_shape(interner, element)?;
            Ok(interner.array(element))
        }
        ShapeSpec::Tuple { elements, rest } => {
            let elements = elements
                .iter()
                .map(|e| build_shape(interner, e))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match rest {
                Some(rest) => {
                    let rest = build_shape(interner, rest)?;
                    interner.tuple_with_rest(elements, rest)
                }
                None => interner.tuple(elements),
            })
        }
        ShapeSpec::Record { fields, closed } => {
            let mut built = Vec::with_capacity(fields.len());
            for (name, field) in fields {
                let mut flags = FieldFlags::empty();
                if field.optional {
                    flags.insert(FieldFlags::OPTIONAL);
                }
                if field.read_only {
                    flags.insert(FieldFlags::READONLY);
                }
                let shape = build_shape(interner, &field.shape)?;
                built.push(FieldInfo::with_flags(
                    interner.intern_string(name),
                    shape,
                    flags,
                ));
            }
            if *closed {
                interner.record_closed(built)
            } else {
                interner.record(built)
            }
        }
        ShapeSpec::Union { members } => {
            let members = members
                .iter()
                .map(|m| build_shape(interner, m))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(interner.union(members))
        }
        ShapeSpec::Function { params, result } => {
            let params = params
                .iter()
                .map(|p| build_shape(interner, p))
                .collect::<Result<Vec<_>, _>>()?;
            let result = build_shape(interner, result)?;
            Ok(interner.function(params, result))
        }
        ShapeSpec::Ref { name } => Ok(interner.reference(name)),
        ShapeSpec::Capture { name } => Ok(interner.capture(name)),
    }
}

/// Parse a JSON spec and compile it.
pub fn shape_from_json(interner: &ShapeInterner, json: &str) -> Result<ShapeId, ConstructionError> {
    let spec: ShapeSpec =
        serde_json::from_str(json).map_err(|err| ConstructionError::InvalidSpec {
            reason: err.to_string(),
        })?;
    build_shape(interner, &spec)
}
