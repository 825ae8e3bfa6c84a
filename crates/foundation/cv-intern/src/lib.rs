//! String interning for identifiers and type names

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Shared string interner
///
/// Cloning is cheap: all clones refer to the same table, so symbols produced by
/// one clone resolve through any other.
#[derive(Clone, Default)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its symbol
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Look up the symbol of an already interned string
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Resolve a symbol to its text
    pub fn resolve(&self, sym: &Symbol) -> String {
        self.inner.resolve(sym).to_string()
    }

    /// Resolve a symbol that may belong to another interner
    pub fn try_resolve(&self, sym: &Symbol) -> Option<String> {
        self.inner.try_resolve(sym).map(ToString::to_string)
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Interner")
            .field("len", &self.inner.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let interner = Interner::new();
        let first = interner.intern("count");
        let second = interner.intern("count");
        assert_eq!(first, second);
        assert_eq!(interner.resolve(&first), "count");
    }

    #[test]
    fn test_clones_share_table() {
        let interner = Interner::new();
        let clone = interner.clone();
        let sym = clone.intern("shared");
        assert_eq!(interner.get("shared"), Some(sym));
        assert_eq!(interner.get("missing"), None);
    }
}
