// Slick Package Resolver
//
// A two-way map between the short package names visible in source and
// fully qualified import paths. Resolution turns a short-name-qualified
// symbol into a path-qualified one; enclosure is the inverse, coining a
// fresh short name when a path has none yet.

use std::collections::HashMap;

use thiserror::Error;

use crate::symbol::{Interner, SymbolId, KEYWORD_PACKAGE};

#[derive(Debug, Error)]
#[error("the package of symbol {package}:{identifier} cannot be resolved")]
pub struct UnknownPackage {
    pub package: String,
    pub identifier: String,
}

#[derive(Default)]
pub struct PackageResolver {
    pub package_to_path: HashMap<String, String>,
    pub path_to_package: HashMap<String, String>,
}

/// The basename of an import path.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

impl PackageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a short name for a path, in both directions.
    pub fn bind(&mut self, name: &str, path: &str) {
        self.package_to_path.insert(name.to_string(), path.to_string());
        self.path_to_package.insert(path.to_string(), name.to_string());
    }

    /// Turn a short-name-qualified symbol into a path-qualified one.
    /// Local and keyword symbols pass through unchanged.
    pub fn resolve_symbol(
        &self,
        interner: &Interner,
        package: &str,
        identifier: &str,
    ) -> Result<SymbolId, UnknownPackage> {
        if package.is_empty() || package == KEYWORD_PACKAGE {
            return Ok(interner.intern(package, identifier));
        }
        match self.package_to_path.get(package) {
            Some(path) => Ok(interner.intern(path, identifier)),
            None => Err(UnknownPackage {
                package: package.to_string(),
                identifier: identifier.to_string(),
            }),
        }
    }

    /// Turn a path-qualified symbol back into a short-name-qualified one.
    /// If the path has no short name yet, one is coined from the path's
    /// basename (with a numeric suffix on collision) and recorded in both
    /// maps; the second result is true exactly in that case, which is the
    /// signal to emit an import line.
    pub fn enclose_symbol(&mut self, interner: &Interner, id: SymbolId) -> (SymbolId, bool) {
        let sym = interner.symbol(id);
        if sym.is_local() || sym.is_keyword() {
            return (id, false);
        }
        if let Some(name) = self.path_to_package.get(&*sym.package) {
            return (interner.intern(name, &sym.identifier), false);
        }
        let mut name = basename(&sym.package).to_string();
        if self.package_to_path.contains_key(&name) {
            for counter in 1.. {
                let candidate = format!("{}{}", name, counter);
                if !self.package_to_path.contains_key(&candidate) {
                    name = candidate;
                    break;
                }
            }
        }
        self.bind(&name, &sym.package);
        (interner.intern(&name, &sym.identifier), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_and_keyword() {
        let interner = Interner::new();
        let resolver = PackageResolver::new();
        let local = resolver.resolve_symbol(&interner, "", "x").unwrap();
        assert_eq!(local, interner.intern("", "x"));
        let kw = resolver
            .resolve_symbol(&interner, KEYWORD_PACKAGE, "type")
            .unwrap();
        assert_eq!(kw, interner.intern(KEYWORD_PACKAGE, "type"));
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let interner = Interner::new();
        let mut resolver = PackageResolver::new();
        resolver.bind("m", "lib/math");
        let resolved = resolver.resolve_symbol(&interner, "m", "Sin").unwrap();
        assert_eq!(resolved, interner.intern("lib/math", "Sin"));
        assert!(resolver.resolve_symbol(&interner, "math", "Sin").is_err());
    }

    #[test]
    fn test_enclose_coins_fresh_names() {
        let interner = Interner::new();
        let mut resolver = PackageResolver::new();

        let sin = interner.intern("lib/math", "Sin");
        let (enclosed, first) = resolver.enclose_symbol(&interner, sin);
        assert!(first);
        assert_eq!(enclosed, interner.intern("math", "Sin"));

        // Second enclosure of the same path reuses the short name.
        let cos = interner.intern("lib/math", "Cos");
        let (enclosed, first) = resolver.enclose_symbol(&interner, cos);
        assert!(!first);
        assert_eq!(enclosed, interner.intern("math", "Cos"));

        // A different path with the same basename gets a suffixed name.
        let other = interner.intern("other/math", "Abs");
        let (enclosed, first) = resolver.enclose_symbol(&interner, other);
        assert!(first);
        assert_eq!(enclosed, interner.intern("math1", "Abs"));
    }

    #[test]
    fn test_enclose_passes_locals_through() {
        let interner = Interner::new();
        let mut resolver = PackageResolver::new();
        let local = interner.intern("", "x");
        assert_eq!(resolver.enclose_symbol(&interner, local), (local, false));
    }
}
