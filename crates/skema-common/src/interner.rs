//! String interning.
//!
//! Field names, capture names, and named-shape references occur over and over
//! in shape trees. Interning them to a copyable [`Atom`] keeps the tree nodes
//! `Copy` and makes name comparison an integer comparison.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// An interned string id.
///
/// Atoms are only meaningful together with the [`StringInterner`] that
/// produced them; two atoms from the same interner are equal iff their
/// strings are equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

#[derive(Default)]
struct Inner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// Thread-safe string interner.
///
/// Interning and resolution both take `&self`; the table is shared behind a
/// lock so the interner can be embedded in structures that hand out shapes
/// from multiple threads.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(atom) = self.inner.read().expect("interner lock").map.get(text) {
            return *atom;
        }
        let mut inner = self.inner.write().expect("interner lock");
        if let Some(atom) = inner.map.get(text) {
            return *atom;
        }
        let atom = Atom(inner.strings.len() as u32);
        let shared: Arc<str> = Arc::from(text);
        inner.strings.push(Arc::clone(&shared));
        inner.map.insert(shared, atom);
        atom
    }

    /// Resolve an atom back to its string.
    ///
    /// Returns a cheap `Arc` clone; the interner never frees strings.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let inner = self.inner.read().expect("interner lock");
        Arc::clone(&inner.strings[atom.0 as usize])
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.inner.read().expect("interner lock").strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("name");
        let b = interner.intern("name");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let interner = StringInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_ne!(a, b);
        assert_eq!(&*interner.resolve(a), "a");
        assert_eq!(&*interner.resolve(b), "b");
    }
}
