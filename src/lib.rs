// Slick: a Lisp-syntax surface language for Go.
//
// The reader turns UTF-8 source text into a tree of symbols, numbers,
// strings, runes, and pairs; the translator walks that tree once and
// emits a Go source file, expanding plugin macros and quotation along
// the way.

pub mod compiler;
pub mod fold;
pub mod heap;
pub mod list;
pub mod packages;
pub mod plugins;
pub mod position;
pub mod printer;
pub mod quasiquote;
pub mod reader;
pub mod readtable;
pub mod search;
pub mod sets;
pub mod symbol;
pub mod types;

pub use compiler::translate;
pub use heap::Heap;
pub use plugins::{Environment, MacroError, MacroFn, PluginRegistry};
pub use position::{Diagnostic, ErrorList, Position};
pub use reader::Reader;
pub use symbol::{Interner, Symbol, SymbolId};
pub use types::{PairId, Span, Value};
