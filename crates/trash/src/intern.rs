//! Symbol interning.
//!
//! Every distinct symbol name is stored exactly once and addressed by a
//! [`SymbolId`]. Symbol equality is therefore id equality, which is what
//! makes `eq?` on symbols pointer-identity cheap. The interner is populated
//! by the reader and by builtin registration; lookups in the other direction
//! are only needed for printing and error messages.

use ahash::AHashMap;

/// Index into the interner's name storage.
///
/// Uses `u32` to keep `Value` small; four billion distinct symbols is more
/// than any program will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage for interned symbol names.
///
/// Names are appended to a vector and never removed; the reverse map hands
/// out the existing id for a name seen before. Interned names are constants
/// in the collector's sense: they live for the whole session and are never
/// swept.
#[derive(Debug, Default)]
pub struct Interner {
    names: Vec<Box<str>>,
    ids: AHashMap<Box<str>, SymbolId>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, interning it on first sight.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = SymbolId(u32::try_from(self.names.len()).expect("interner overflow"));
        self.names.push(name.into());
        self.ids.insert(name.into(), id);
        id
    }

    /// Returns the name behind an id.
    ///
    /// # Panics
    /// Panics if `id` did not come from this interner.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }

    /// Number of distinct names interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let mut interner = Interner::new();
        let a = interner.intern("car");
        let b = interner.intern("cdr");
        let c = interner.intern("car");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.name(a), "car");
        assert_eq!(interner.len(), 2);
    }
}
