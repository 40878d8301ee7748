// Slick Plugin Registry
//
// Plugins supply macro functions, looked up by (package path, name). How
// plugin code gets into the process is the host's business; the
// translator only performs lookups. The registry is process-wide shared
// state with read-after-load semantics: registrations happen-before any
// lookup that observes them.

use std::collections::HashMap;
use std::path::PathBuf;

use dashmap::DashMap;
use thiserror::Error;

use crate::heap::Heap;
use crate::quasiquote;
use crate::symbol::Interner;
use crate::types::{PairId, Value};

/// Opaque translator state handed to macro functions. Currently empty;
/// reserved for lexical-environment lookup.
#[derive(Debug, Default)]
pub struct Environment {}

impl Environment {
    pub fn new() -> Self {
        Self {}
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct MacroError {
    pub message: String,
}

impl MacroError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A macro function rewrites a whole call form, including the macro-name
/// head, into a replacement form. Macro functions must be re-entrant.
pub type MacroFn =
    fn(&mut Heap, &Interner, PairId, &Environment) -> Result<Value, MacroError>;

pub struct PluginRegistry {
    /// The built-in plugin behind the quotation special forms.
    core: HashMap<&'static str, MacroFn>,
    plugins: DashMap<String, HashMap<String, MacroFn>>,
}

impl PluginRegistry {
    /// An empty registry with the core quotation plugin pre-registered.
    pub fn new() -> Self {
        let mut core: HashMap<&'static str, MacroFn> = HashMap::new();
        core.insert("Quote", quasiquote::quote as MacroFn);
        core.insert("Quasiquote", quasiquote::quasiquote as MacroFn);
        core.insert("Unquote", quasiquote::unquote as MacroFn);
        core.insert("UnquoteSplicing", quasiquote::unquote_splicing as MacroFn);
        Self {
            core,
            plugins: DashMap::new(),
        }
    }

    /// Register a macro function under a plugin package path.
    pub fn register(&self, path: &str, name: &str, f: MacroFn) {
        let path = path.strip_prefix('#').unwrap_or(path);
        self.plugins
            .entry(path.to_string())
            .or_default()
            .insert(name.to_string(), f);
    }

    /// Look up a macro function. The path may still carry the use
    /// declaration's `#` sentinel; it is stripped here.
    pub fn lookup(&self, path: &str, name: &str) -> Option<MacroFn> {
        let path = path.strip_prefix('#').unwrap_or(path);
        self.plugins.get(path)?.get(name).copied()
    }

    /// Look up one of the pre-registered core macro functions.
    pub fn lookup_core(&self, name: &str) -> Option<MacroFn> {
        self.core.get(name).copied()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn home_joined(var: &str) -> PathBuf {
    match std::env::var_os(var) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = std::env::var_os("HOME").unwrap_or_default();
            PathBuf::from(home).join("slick")
        }
    }
}

/// The root under which user plugins live, from SLICKPATH.
pub fn slick_path() -> PathBuf {
    home_joined("SLICKPATH")
}

/// The root of the built-in plugin installation, from SLICKROOT.
pub fn slick_root() -> PathBuf {
    home_joined("SLICKROOT")
}

/// Where the host is expected to find a user plugin's shared object.
pub fn plugin_shared_object(path: &str) -> PathBuf {
    let path = path.strip_prefix('#').unwrap_or(path);
    slick_path().join("plugins").join(path).join("slick/plugin.so")
}

/// Where the host is expected to find the core plugin's shared object.
pub fn core_plugin_shared_object() -> PathBuf {
    slick_root().join("plugins/plugin.so")
}
