// Slick Symbol Interner
//
// Canonicalizes (package, identifier) pairs into shared handles with O(1)
// comparison. The interner is process-wide shared state: it may be called
// from parallel translations and from macro functions running on worker
// threads, so insert-or-lookup is atomic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

/// The package of keyword symbols, printed with a leading colon.
pub const KEYWORD_PACKAGE: &str = "_keyword";

/// Unique handle for an interned symbol (index into the intern table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// The components of an interned symbol.
///
/// The package is one of: the empty string (a local identifier), the keyword
/// package, or a package name or fully qualified import path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub package: Arc<str>,
    pub identifier: Arc<str>,
}

impl Symbol {
    pub fn is_local(&self) -> bool {
        self.package.is_empty()
    }

    pub fn is_keyword(&self) -> bool {
        &*self.package == KEYWORD_PACKAGE
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "{}", self.identifier)
        } else if self.is_keyword() {
            write!(f, ":{}", self.identifier)
        } else {
            write!(f, "{}:{}", self.package, self.identifier)
        }
    }
}

/// The symbol intern table.
///
/// Two symbols with byte-equal components always share one handle, so
/// equality and hashing of symbols reduce to handle identity.
pub struct Interner {
    ids: DashMap<Symbol, SymbolId>,
    symbols: RwLock<Vec<Symbol>>,
    gensyms: AtomicU64,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            symbols: RwLock::new(Vec::new()),
            gensyms: AtomicU64::new(0),
        }
    }

    /// Return the canonical handle for (package, identifier).
    pub fn intern(&self, package: &str, identifier: &str) -> SymbolId {
        let key = Symbol {
            package: package.into(),
            identifier: identifier.into(),
        };
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        // The entry locks its shard, so the push and the insert are atomic
        // with respect to other interning threads.
        *self.ids.entry(key.clone()).or_insert_with(|| {
            let mut table = self.symbols.write().unwrap();
            let id = SymbolId(table.len() as u32);
            table.push(key);
            id
        })
    }

    /// Return the components of an interned symbol.
    ///
    /// Panics if the handle was not produced by this interner.
    pub fn symbol(&self, id: SymbolId) -> Symbol {
        self.symbols.read().unwrap()[id.0 as usize].clone()
    }

    /// Return a fresh local symbol that cannot collide with any user
    /// identifier or with any previously returned gensym.
    ///
    /// Identifiers starting with an underscore (other than the single-rune
    /// placeholder) are rejected by the reader, so the leading underscore
    /// guarantees freshness against user source.
    pub fn gensym(&self, prefix: &str) -> SymbolId {
        let n = self.gensyms.fetch_add(1, Ordering::Relaxed) + 1;
        let identifier = if prefix.is_empty() {
            format!("_g{}", n)
        } else if prefix.starts_with('_') {
            format!("{}{}", prefix, n)
        } else {
            format!("_{}{}", prefix, n)
        };
        self.intern("", &identifier)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.read().unwrap().len()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_identity() {
        let interner = Interner::new();
        let a = interner.intern("", "foo");
        let b = interner.intern("", "foo");
        assert_eq!(a, b);

        let c = interner.intern("", "bar");
        assert_ne!(a, c);

        let d = interner.intern("fmt", "foo");
        assert_ne!(a, d);
    }

    #[test]
    fn test_display() {
        let interner = Interner::new();
        let local = interner.intern("", "x");
        assert_eq!(interner.symbol(local).to_string(), "x");

        let kw = interner.intern(KEYWORD_PACKAGE, "type");
        assert_eq!(interner.symbol(kw).to_string(), ":type");

        let qualified = interner.intern("fmt", "Println");
        assert_eq!(interner.symbol(qualified).to_string(), "fmt:Println");
    }

    #[test]
    fn test_gensym_distinct() {
        let interner = Interner::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let id = interner.gensym("tmp");
            let sym = interner.symbol(id);
            assert!(sym.identifier.starts_with('_'));
            assert!(sym.package.is_empty());
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn test_gensym_prefixes() {
        let interner = Interner::new();
        let plain = interner.symbol(interner.gensym(""));
        assert!(plain.identifier.starts_with("_g"));
        let underscored = interner.symbol(interner.gensym("_loop"));
        assert!(underscored.identifier.starts_with("_loop"));
        let named = interner.symbol(interner.gensym("loop"));
        assert!(named.identifier.starts_with("_loop"));
    }

    #[test]
    fn test_concurrent_intern() {
        let interner = std::sync::Arc::new(Interner::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let interner = interner.clone();
            handles.push(std::thread::spawn(move || {
                let mut ids = Vec::new();
                for i in 0..100 {
                    ids.push(interner.intern("pkg", &format!("sym{}", i)));
                }
                ids
            }));
        }
        let all: Vec<Vec<SymbolId>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for ids in &all[1..] {
            assert_eq!(ids, &all[0]);
        }
    }
}
