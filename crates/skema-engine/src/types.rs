//! Core shape representation.
//!
//! Shapes are immutable trees interned to copyable ids. A [`ShapeId`] is the
//! unit everything else in the engine traffics in: matching, equality, and
//! evaluation all take and return ids, and the [`crate::intern::ShapeInterner`]
//! maps ids back to [`ShapeData`] on demand.
//!
//! Sub-aggregates (member lists, record field lists) are interned separately
//! so `ShapeData` itself stays `Copy`.

use bitflags::bitflags;
use ordered_float::OrderedFloat;
use skema_common::interner::Atom;

/// Interned shape id.
///
/// Ids are only meaningful together with the interner that produced them.
/// Identical ids imply structural equality; the converse does not hold for
/// records with reordered keys, which is why deep comparison lives in
/// [`crate::equality`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl ShapeId {
    pub const STRING: Self = Self(0);
    pub const NUMBER: Self = Self(1);
    pub const BOOLEAN: Self = Self(2);
    pub const NULL: Self = Self(3);
    pub const UNDEFINED: Self = Self(4);
    /// Bottom sentinel: the shape with no inhabitants.
    pub const NEVER: Self = Self(5);
    /// Top sentinel: matches anything as a pattern.
    pub const UNKNOWN: Self = Self(6);

    pub(crate) const SENTINEL_COUNT: u32 = 7;
}

/// Interned list of shape ids (union members, tuple elements, params).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeListId(pub u32);

/// Interned record field list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordShapeId(pub u32);

/// The five primitive kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

/// A single literal value. Distinct from its base primitive: the literal
/// `"on"` and the primitive `string` are different shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(Atom),
    Number(OrderedFloat<f64>),
    Boolean(bool),
}

impl LiteralValue {
    /// The primitive kind this literal belongs to.
    pub fn primitive_kind(self) -> PrimitiveKind {
        match self {
            Self::String(_) => PrimitiveKind::String,
            Self::Number(_) => PrimitiveKind::Number,
            Self::Boolean(_) => PrimitiveKind::Boolean,
        }
    }
}

bitflags! {
    /// Per-field modifiers on a record field.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        const OPTIONAL = 1 << 0;
        const READONLY = 1 << 1;
    }
}

/// One record field: name, shape, and modifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: Atom,
    pub shape: ShapeId,
    pub flags: FieldFlags,
}

impl FieldInfo {
    pub fn new(name: Atom, shape: ShapeId) -> Self {
        Self {
            name,
            shape,
            flags: FieldFlags::empty(),
        }
    }

    pub fn with_flags(name: Atom, shape: ShapeId, flags: FieldFlags) -> Self {
        Self { name, shape, flags }
    }

    pub fn is_optional(&self) -> bool {
        self.flags.contains(FieldFlags::OPTIONAL)
    }

    pub fn is_readonly(&self) -> bool {
        self.flags.contains(FieldFlags::READONLY)
    }
}

/// A record's field list plus its openness.
///
/// `closed` only matters when the record is used as a pattern: a closed
/// pattern rejects values carrying fields the pattern does not name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordShape {
    pub fields: Vec<FieldInfo>,
    pub closed: bool,
}

impl RecordShape {
    /// Look up a field by name. Linear scan; field lists are small.
    pub fn field(&self, name: Atom) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The shape variants.
///
/// `Capture` is pattern-only: it never appears in a shape the evaluator
/// returns (substitution replaces captures, and an unbound capture is an
/// evaluation error).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeData {
    Primitive(PrimitiveKind),
    Literal(LiteralValue),
    /// Fixed-arity elements plus an optional variadic tail.
    Tuple(ShapeListId, Option<ShapeId>),
    Array(ShapeId),
    Record(RecordShapeId),
    /// ≥ 2 members, flattened and de-duplicated at construction.
    Union(ShapeListId),
    /// Ordered params and a result shape.
    Function(ShapeListId, ShapeId),
    /// Named placeholder resolved against a [`crate::registry::ShapeRegistry`].
    Ref(Atom),
    /// Pattern capture slot.
    Capture(Atom),
    Never,
    Unknown,
}
