//! Shape interning.
//!
//! [`ShapeInterner`] hash-conses [`ShapeData`] into [`ShapeId`]s. Identical
//! construction yields identical ids, so sub-shapes are structurally shared
//! across outputs for free and the recursion guard can key on ids.
//!
//! Constructors enforce the model invariants eagerly:
//! - `union` flattens nested unions, drops `Never` members, de-duplicates by
//!   structural equality, and collapses below two members
//! - `record` rejects duplicate field names at construction time
//!
//! All methods take `&self`; the tables are concurrent so an interner can be
//! shared across threads.

use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::RwLock;

use skema_common::interner::{Atom, StringInterner};
use skema_common::limits::SHAPE_LIST_INLINE;

use crate::diagnostics::ConstructionError;
use crate::equality::structurally_equal;
use crate::types::{
    FieldInfo, LiteralValue, PrimitiveKind, RecordShape, RecordShapeId, ShapeData, ShapeId,
    ShapeListId,
};

/// Hash-consing store for shapes, shape lists, and record field lists.
pub struct ShapeInterner {
    strings: StringInterner,
    shapes: RwLock<Vec<ShapeData>>,
    shape_dedup: DashMap<ShapeData, ShapeId>,
    lists: RwLock<Vec<Arc<[ShapeId]>>>,
    list_dedup: DashMap<Box<[ShapeId]>, ShapeListId>,
    records: RwLock<Vec<Arc<RecordShape>>>,
    record_dedup: DashMap<RecordShape, RecordShapeId>,
}

impl ShapeInterner {
    pub fn new() -> Self {
        let interner = Self {
            strings: StringInterner::new(),
            shapes: RwLock::new(Vec::new()),
            shape_dedup: DashMap::new(),
            lists: RwLock::new(Vec::new()),
            list_dedup: DashMap::new(),
            records: RwLock::new(Vec::new()),
            record_dedup: DashMap::new(),
        };
        // Sentinels first, in ShapeId constant order.
        interner.intern(ShapeData::Primitive(PrimitiveKind::String));
        interner.intern(ShapeData::Primitive(PrimitiveKind::Number));
        interner.intern(ShapeData::Primitive(PrimitiveKind::Boolean));
        interner.intern(ShapeData::Primitive(PrimitiveKind::Null));
        interner.intern(ShapeData::Primitive(PrimitiveKind::Undefined));
        interner.intern(ShapeData::Never);
        interner.intern(ShapeData::Unknown);
        debug_assert_eq!(
            interner.shapes.read().expect("interner lock").len() as u32,
            ShapeId::SENTINEL_COUNT
        );
        interner
    }

    /// Intern raw shape data. Callers go through the typed constructors
    /// below; this is the single point where ids are allocated.
    pub fn intern(&self, data: ShapeData) -> ShapeId {
        if let Some(id) = self.shape_dedup.get(&data) {
            return *id;
        }
        let mut shapes = self.shapes.write().expect("interner lock");
        if let Some(id) = self.shape_dedup.get(&data) {
            return *id;
        }
        let id = ShapeId(shapes.len() as u32);
        shapes.push(data);
        self.shape_dedup.insert(data, id);
        id
    }

    /// Look up the data behind an id. `None` only for ids from a different
    /// interner.
    pub fn lookup(&self, id: ShapeId) -> Option<ShapeData> {
        self.shapes
            .read()
            .expect("interner lock")
            .get(id.0 as usize)
            .copied()
    }

    pub fn shape_list(&self, id: ShapeListId) -> Arc<[ShapeId]> {
        Arc::clone(&self.lists.read().expect("interner lock")[id.0 as usize])
    }

    pub fn record_shape(&self, id: RecordShapeId) -> Arc<RecordShape> {
        Arc::clone(&self.records.read().expect("interner lock")[id.0 as usize])
    }

    // -----------------------------------------------------------------------
    // Strings
    // -----------------------------------------------------------------------

    pub fn intern_string(&self, text: &str) -> Atom {
        self.strings.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.strings.resolve(atom)
    }

    // -----------------------------------------------------------------------
    // Typed constructors
    // -----------------------------------------------------------------------

    pub fn primitive(&self, kind: PrimitiveKind) -> ShapeId {
        match kind {
            PrimitiveKind::String => ShapeId::STRING,
            PrimitiveKind::Number => ShapeId::NUMBER,
            PrimitiveKind::Boolean => ShapeId::BOOLEAN,
            PrimitiveKind::Null => ShapeId::NULL,
            PrimitiveKind::Undefined => ShapeId::UNDEFINED,
        }
    }

    pub fn literal_string(&self, text: &str) -> ShapeId {
        let atom = self.strings.intern(text);
        self.literal_string_atom(atom)
    }

    pub fn literal_string_atom(&self, atom: Atom) -> ShapeId {
        self.intern(ShapeData::Literal(LiteralValue::String(atom)))
    }

    pub fn literal_number(&self, value: f64) -> ShapeId {
        self.intern(ShapeData::Literal(LiteralValue::Number(value.into())))
    }

    pub fn literal_boolean(&self, value: bool) -> ShapeId {
        self.intern(ShapeData::Literal(LiteralValue::Boolean(value)))
    }

    pub fn array(&self, element: ShapeId) -> ShapeId {
        self.intern(ShapeData::Array(element))
    }

    pub fn tuple(&self, elements: Vec<ShapeId>) -> ShapeId {
        let list = self.intern_list(elements);
        self.intern(ShapeData::Tuple(list, None))
    }

    pub fn tuple_with_rest(&self, elements: Vec<ShapeId>, rest: ShapeId) -> ShapeId {
        let list = self.intern_list(elements);
        self.intern(ShapeData::Tuple(list, Some(rest)))
    }

    pub fn function(&self, params: Vec<ShapeId>, result: ShapeId) -> ShapeId {
        let list = self.intern_list(params);
        self.intern(ShapeData::Function(list, result))
    }

    /// Build an open record, rejecting duplicate field names.
    pub fn record(&self, fields: Vec<FieldInfo>) -> Result<ShapeId, ConstructionError> {
        self.record_with(fields, false)
    }

    /// Build a closed record ("no extra fields" when used as a pattern).
    pub fn record_closed(&self, fields: Vec<FieldInfo>) -> Result<ShapeId, ConstructionError> {
        self.record_with(fields, true)
    }

    fn record_with(
        &self,
        fields: Vec<FieldInfo>,
        closed: bool,
    ) -> Result<ShapeId, ConstructionError> {
        let mut seen = rustc_hash::FxHashSet::default();
        for field in &fields {
            if !seen.insert(field.name) {
                return Err(ConstructionError::DuplicateKey {
                    key: self.resolve_atom(field.name).to_string(),
                });
            }
        }
        Ok(self.record_from_parts(fields, closed))
    }

    /// Record construction for internal rebuilds whose field names are known
    /// unique (substitution, mapped-field output after collision checking).
    pub(crate) fn record_from_parts(&self, fields: Vec<FieldInfo>, closed: bool) -> ShapeId {
        let record = RecordShape { fields, closed };
        let id = self.intern_record(record);
        self.intern(ShapeData::Record(id))
    }

    /// Build a union. Flattens nested unions, drops `Never` members,
    /// de-duplicates by structural equality, and collapses: zero members is
    /// `Never`, one member is the member itself.
    pub fn union(&self, members: impl IntoIterator<Item = ShapeId>) -> ShapeId {
        let mut flat: SmallVec<[ShapeId; SHAPE_LIST_INLINE]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(ShapeData::Union(list)) => {
                    // Members of an interned union are already flat.
                    flat.extend(self.shape_list(list).iter().copied());
                }
                Some(ShapeData::Never) => {}
                _ => flat.push(member),
            }
        }

        let mut distinct: SmallVec<[ShapeId; SHAPE_LIST_INLINE]> = SmallVec::new();
        for candidate in flat {
            if !distinct
                .iter()
                .any(|&kept| structurally_equal(self, kept, candidate))
            {
                distinct.push(candidate);
            }
        }

        match distinct.len() {
            0 => ShapeId::NEVER,
            1 => distinct[0],
            _ => {
                let list = self.intern_list(distinct.to_vec());
                self.intern(ShapeData::Union(list))
            }
        }
    }

    pub fn union2(&self, a: ShapeId, b: ShapeId) -> ShapeId {
        self.union([a, b])
    }

    pub fn union3(&self, a: ShapeId, b: ShapeId, c: ShapeId) -> ShapeId {
        self.union([a, b, c])
    }

    /// Named placeholder for a registry-resolved shape.
    pub fn reference(&self, name: &str) -> ShapeId {
        let atom = self.strings.intern(name);
        self.intern(ShapeData::Ref(atom))
    }

    /// Pattern capture slot.
    pub fn capture(&self, name: &str) -> ShapeId {
        let atom = self.strings.intern(name);
        self.intern(ShapeData::Capture(atom))
    }

    // -----------------------------------------------------------------------
    // List and record tables
    // -----------------------------------------------------------------------

    fn intern_list(&self, items: Vec<ShapeId>) -> ShapeListId {
        let key: Box<[ShapeId]> = items.into();
        if let Some(id) = self.list_dedup.get(&key) {
            return *id;
        }
        let mut lists = self.lists.write().expect("interner lock");
        if let Some(id) = self.list_dedup.get(&key) {
            return *id;
        }
        let id = ShapeListId(lists.len() as u32);
        lists.push(Arc::from(&*key));
        self.list_dedup.insert(key, id);
        id
    }

    fn intern_record(&self, record: RecordShape) -> RecordShapeId {
        if let Some(id) = self.record_dedup.get(&record) {
            return *id;
        }
        let mut records = self.records.write().expect("interner lock");
        if let Some(id) = self.record_dedup.get(&record) {
            return *id;
        }
        let id = RecordShapeId(records.len() as u32);
        records.push(Arc::new(record.clone()));
        self.record_dedup.insert(record, id);
        id
    }
}

impl Default for ShapeInterner {
    fn default() -> Self {
        Self::new()
    }
}
