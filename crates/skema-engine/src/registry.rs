//! Named shape definitions for `Ref` resolution.
//!
//! A `Ref("T")` leaf resolves against a [`ShapeRegistry`]. Definitions are
//! write-once: a name may be built up incrementally (record fields added
//! across several calls, the way interfaces merge declarations) but freezes
//! at first use and is never mutated after it can be observed.
//!
//! Defining a name validates productivity: a `Ref` chain reachable from the
//! definition must pass through at least one structural constructor
//! (tuple, record, array, function) before reaching the name being defined,
//! otherwise the definition is rejected with `MalformedRecursion` and the
//! registry is left unchanged.

use dashmap::DashMap;
use rustc_hash::FxHashSet;
use skema_common::interner::Atom;
use tracing::trace;

use crate::diagnostics::ConstructionError;
use crate::intern::ShapeInterner;
use crate::types::{FieldInfo, ShapeData, ShapeId};

#[derive(Default)]
struct PendingRecord {
    fields: Vec<FieldInfo>,
}

/// Concurrent name → shape table.
pub struct ShapeRegistry {
    defs: DashMap<Atom, ShapeId>,
    pending: DashMap<Atom, PendingRecord>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self {
            defs: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    /// Define `name` as `shape`, validating productivity.
    pub fn define(
        &self,
        interner: &ShapeInterner,
        name: &str,
        shape: ShapeId,
    ) -> Result<(), ConstructionError> {
        let atom = interner.intern_string(name);
        if self.defs.contains_key(&atom) {
            return Err(ConstructionError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
        self.check_productive(interner, atom, shape)?;
        trace!(name, shape = shape.0, "define shape");
        self.defs.insert(atom, shape);
        Ok(())
    }

    /// Add fields to a named record that has not yet been frozen.
    ///
    /// Repeated calls merge, mirroring incremental declaration: the frozen
    /// record carries every field in overall insertion order.
    pub fn extend_record(
        &self,
        interner: &ShapeInterner,
        name: &str,
        fields: Vec<FieldInfo>,
    ) -> Result<(), ConstructionError> {
        let atom = interner.intern_string(name);
        if self.defs.contains_key(&atom) {
            return Err(ConstructionError::FrozenDefinition {
                name: name.to_string(),
            });
        }
        let mut pending = self.pending.entry(atom).or_default();
        for field in fields {
            if pending.fields.iter().any(|f| f.name == field.name) {
                return Err(ConstructionError::DuplicateKey {
                    key: interner.resolve_atom(field.name).to_string(),
                });
            }
            pending.fields.push(field);
        }
        Ok(())
    }

    /// Freeze an incrementally-declared record and register it under its
    /// name. Returns the record's shape id.
    pub fn freeze_record(
        &self,
        interner: &ShapeInterner,
        name: &str,
    ) -> Result<ShapeId, ConstructionError> {
        let atom = interner.intern_string(name);
        let Some((_, pending)) = self.pending.remove(&atom) else {
            return Err(ConstructionError::InvalidSpec {
                reason: format!("no pending record declaration for '{name}'"),
            });
        };
        let shape = interner.record(pending.fields)?;
        self.define(interner, name, shape)?;
        Ok(shape)
    }

    /// Resolve a defined name.
    pub fn resolve(&self, name: Atom) -> Option<ShapeId> {
        self.defs.get(&name).map(|entry| *entry)
    }

    /// If `shape` is a `Ref`, resolve it one step; otherwise return it.
    pub fn resolve_ref(&self, interner: &ShapeInterner, shape: ShapeId) -> Option<ShapeId> {
        match interner.lookup(shape) {
            Some(ShapeData::Ref(name)) => self.resolve(name),
            _ => Some(shape),
        }
    }

    /// Walk the non-structural spine of `shape` (union members and resolved
    /// refs); reaching `target` there means the recursion is unproductive.
    fn check_productive(
        &self,
        interner: &ShapeInterner,
        target: Atom,
        shape: ShapeId,
    ) -> Result<(), ConstructionError> {
        let mut visited = FxHashSet::default();
        self.check_productive_inner(interner, target, shape, &mut visited)
    }

    fn check_productive_inner(
        &self,
        interner: &ShapeInterner,
        target: Atom,
        shape: ShapeId,
        visited: &mut FxHashSet<Atom>,
    ) -> Result<(), ConstructionError> {
        match interner.lookup(shape) {
            Some(ShapeData::Ref(name)) => {
                if name == target {
                    return Err(ConstructionError::MalformedRecursion {
                        name: interner.resolve_atom(target).to_string(),
                    });
                }
                if !visited.insert(name) {
                    return Ok(());
                }
                match self.resolve(name) {
                    Some(resolved) => {
                        self.check_productive_inner(interner, target, resolved, visited)
                    }
                    // Forward reference: checked again when that name is
                    // defined and this one is resolvable from it.
                    None => Ok(()),
                }
            }
            Some(ShapeData::Union(members)) => {
                for &member in interner.shape_list(members).iter() {
                    self.check_productive_inner(interner, target, member, visited)?;
                }
                Ok(())
            }
            // Tuple, record, array, and function are structural
            // constructors: recursion below them is productive.
            _ => Ok(()),
        }
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
