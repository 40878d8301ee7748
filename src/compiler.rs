// Slick-to-Go Translator
//
// A single-pass recursive transformation from the reader's form tree into
// Go source text. Dispatch is by interned head symbol; any head that is
// not a special form and carries a plugin package marker is expanded
// through the plugin registry, and the resulting form is re-dispatched
// until a non-macro head is reached.
//
// Emission accumulates two buffers: the header (package clause plus the
// import lines discovered while enclosing qualified symbols) and the body
// (declarations in source order). Errors are recorded with the source
// range of the offending form and translation continues; a catastrophic
// error count trips the bail flag and unwinds the walk without emitting
// further diagnostics.

use smallvec::{smallvec, SmallVec};

use crate::heap::Heap;
use crate::plugins::{Environment, PluginRegistry};
use crate::printer::{print_to_string, quote_rune, quote_string};
use crate::quasiquote::LIST_PATH;
use crate::reader::Reader;
use crate::symbol::{Interner, Symbol, SymbolId, KEYWORD_PACKAGE};
use crate::types::{PairId, Value};
use crate::position::ErrorList;

const MAX_ERRORS: usize = 10;

type Names = SmallVec<[SymbolId; 4]>;

/// A spec emitter for group declarations: produces an optional doc
/// comment and the declaration text for one spec.
type SpecFn = fn(&mut Translator<'_, '_>, PairId, &Value, usize) -> (Option<String>, String);

/// Translate everything the reader has left to read. On any error the
/// output is discarded and the accumulated error list is returned.
pub fn translate(rd: &mut Reader<'_>, registry: &PluginRegistry) -> Result<String, ErrorList> {
    let interner = rd.interner();
    let forms = Forms::new(interner);
    let mut translator = Translator {
        rd,
        registry,
        interner,
        forms,
        header: String::new(),
        bailed: false,
    };
    let output = translator.file();
    if !translator.rd.errors.is_empty() {
        return Err(translator.rd.errors.clone());
    }
    Ok(output)
}

/// The interned head symbols the translator dispatches on.
struct Forms {
    s_array: SymbolId,
    s_assert: SymbolId,
    s_at: SymbolId,
    s_begin: SymbolId,
    s_break: SymbolId,
    s_chan: SymbolId,
    s_chan_recv: SymbolId,
    s_chan_send: SymbolId,
    s_const: SymbolId,
    s_continue: SymbolId,
    s_convert: SymbolId,
    s_declare: SymbolId,
    s_default: SymbolId,
    s_defer: SymbolId,
    s_ellipsis: SymbolId,
    s_fallthrough: SymbolId,
    s_for: SymbolId,
    s_func: SymbolId,
    s_go: SymbolId,
    s_goto: SymbolId,
    s_if: SymbolId,
    s_if_star: SymbolId,
    s_import: SymbolId,
    s_interface: SymbolId,
    s_loop: SymbolId,
    s_make: SymbolId,
    s_make_array: SymbolId,
    s_make_map: SymbolId,
    s_make_slice: SymbolId,
    s_make_struct: SymbolId,
    s_map: SymbolId,
    s_package: SymbolId,
    s_quasiquote: SymbolId,
    s_quote: SymbolId,
    s_range: SymbolId,
    s_return: SymbolId,
    s_select: SymbolId,
    s_slice: SymbolId,
    s_slot: SymbolId,
    s_splice: SymbolId,
    s_struct: SymbolId,
    s_switch: SymbolId,
    s_switch_star: SymbolId,
    s_type: SymbolId,
    s_type_alias: SymbolId,
    s_type_switch: SymbolId,
    s_type_switch_star: SymbolId,
    s_unquote: SymbolId,
    s_unquote_splicing: SymbolId,
    s_use: SymbolId,
    s_values: SymbolId,
    s_var: SymbolId,
    s_while: SymbolId,

    s_send: SymbolId,
    s_inc: SymbolId,
    s_dec: SymbolId,
    s_assign: SymbolId,
    s_add_assign: SymbolId,
    s_sub_assign: SymbolId,
    s_or_assign: SymbolId,
    s_xor_assign: SymbolId,
    s_mul_assign: SymbolId,
    s_div_assign: SymbolId,
    s_rem_assign: SymbolId,
    s_shl_assign: SymbolId,
    s_shr_assign: SymbolId,
    s_and_assign: SymbolId,
    s_and_not_assign: SymbolId,

    s_add: SymbolId,
    s_sub: SymbolId,
    s_star: SymbolId,
    s_div: SymbolId,
    s_rem: SymbolId,
    s_amp: SymbolId,
    s_and_not: SymbolId,
    s_or: SymbolId,
    s_xor: SymbolId,
    s_shl: SymbolId,
    s_shr: SymbolId,
    s_land: SymbolId,
    s_lor: SymbolId,
    s_not: SymbolId,
    s_recv: SymbolId,
    s_eq: SymbolId,
    s_ne: SymbolId,
    s_lt: SymbolId,
    s_le: SymbolId,
    s_gt: SymbolId,
    s_ge: SymbolId,

    k_documentation: SymbolId,
    k_equal: SymbolId,
    k_tag: SymbolId,
    k_type: SymbolId,
}

impl Forms {
    fn new(interner: &Interner) -> Self {
        let local = |ident: &str| interner.intern("", ident);
        let keyword = |ident: &str| interner.intern(KEYWORD_PACKAGE, ident);
        Self {
            s_array: local("array"),
            s_assert: local("assert"),
            s_at: local("at"),
            s_begin: local("begin"),
            s_break: local("break"),
            s_chan: local("chan"),
            s_chan_recv: local("<-chan"),
            s_chan_send: local("chan<-"),
            s_const: local("const"),
            s_continue: local("continue"),
            s_convert: local("convert"),
            s_declare: local("declare"),
            s_default: local("default"),
            s_defer: local("defer"),
            s_ellipsis: local("..."),
            s_fallthrough: local("fallthrough"),
            s_for: local("for"),
            s_func: local("func"),
            s_go: local("go"),
            s_goto: local("goto"),
            s_if: local("if"),
            s_if_star: local("if*"),
            s_import: local("import"),
            s_interface: local("interface"),
            s_loop: local("loop"),
            s_make: local("make"),
            s_make_array: local("make-array"),
            s_make_map: local("make-map"),
            s_make_slice: local("make-slice"),
            s_make_struct: local("make-struct"),
            s_map: local("map"),
            s_package: local("package"),
            s_quasiquote: local("quasiquote"),
            s_quote: local("quote"),
            s_range: local("range"),
            s_return: local("return"),
            s_select: local("select"),
            s_slice: local("slice"),
            s_slot: local("slot"),
            s_splice: local("splice"),
            s_struct: local("struct"),
            s_switch: local("switch"),
            s_switch_star: local("switch*"),
            s_type: local("type"),
            s_type_alias: local("type-alias"),
            s_type_switch: local("type-switch"),
            s_type_switch_star: local("type-switch*"),
            s_unquote: local("unquote"),
            s_unquote_splicing: local("unquote-splicing"),
            s_use: local("use"),
            s_values: local("values"),
            s_var: local("var"),
            s_while: local("while"),

            s_send: local("->"),
            s_inc: local("++"),
            s_dec: local("--"),
            s_assign: local("="),
            s_add_assign: local("+="),
            s_sub_assign: local("-="),
            s_or_assign: local("|="),
            s_xor_assign: local("^="),
            s_mul_assign: local("*="),
            s_div_assign: local("/="),
            s_rem_assign: local("%="),
            s_shl_assign: local("<<="),
            s_shr_assign: local(">>="),
            s_and_assign: local("&="),
            s_and_not_assign: local("&^="),

            s_add: local("+"),
            s_sub: local("-"),
            s_star: local("*"),
            s_div: local("/"),
            s_rem: local("%"),
            s_amp: local("&"),
            s_and_not: local("&^"),
            s_or: local("|"),
            s_xor: local("^"),
            s_shl: local("<<"),
            s_shr: local(">>"),
            s_land: local("&&"),
            s_lor: local("||"),
            s_not: local("!"),
            s_recv: local("<-"),
            s_eq: local("=="),
            s_ne: local("!="),
            s_lt: local("<"),
            s_le: local("<="),
            s_gt: local(">"),
            s_ge: local(">="),

            k_documentation: keyword("documentation"),
            k_equal: keyword("="),
            k_tag: keyword("tag"),
            k_type: keyword("type"),
        }
    }

    fn is_assign_op(&self, s: SymbolId) -> bool {
        s == self.s_assign
            || s == self.s_add_assign
            || s == self.s_sub_assign
            || s == self.s_or_assign
            || s == self.s_xor_assign
            || s == self.s_mul_assign
            || s == self.s_div_assign
            || s == self.s_rem_assign
            || s == self.s_shl_assign
            || s == self.s_shr_assign
            || s == self.s_and_assign
            || s == self.s_and_not_assign
    }

    fn is_simple_statement_head(&self, s: SymbolId) -> bool {
        s == self.s_send
            || s == self.s_inc
            || s == self.s_dec
            || s == self.k_equal
            || self.is_assign_op(s)
    }

    fn is_unary_op(&self, s: SymbolId) -> bool {
        s == self.s_add
            || s == self.s_sub
            || s == self.s_not
            || s == self.s_xor
            || s == self.s_star
            || s == self.s_amp
            || s == self.s_recv
    }

    fn is_nary_op(&self, s: SymbolId) -> bool {
        s == self.s_add
            || s == self.s_sub
            || s == self.s_star
            || s == self.s_div
            || s == self.s_rem
            || s == self.s_amp
            || s == self.s_and_not
            || s == self.s_or
            || s == self.s_xor
            || s == self.s_shl
            || s == self.s_shr
            || s == self.s_land
            || s == self.s_lor
    }

    fn is_relational_op(&self, s: SymbolId) -> bool {
        s == self.s_eq
            || s == self.s_ne
            || s == self.s_lt
            || s == self.s_le
            || s == self.s_gt
            || s == self.s_ge
    }

    fn is_operator_head(&self, s: SymbolId) -> bool {
        self.is_unary_op(s) || self.is_nary_op(s) || self.is_relational_op(s)
    }

    fn is_quotation_head(&self, s: SymbolId) -> bool {
        s == self.s_quote
            || s == self.s_quasiquote
            || s == self.s_unquote
            || s == self.s_unquote_splicing
    }
}

fn is_valid_go_identifier(lit: &str) -> bool {
    if lit.is_empty() {
        return false;
    }
    for (i, r) in lit.chars().enumerate() {
        if !(r.is_alphabetic() || r == '_' || (i > 0 && r.is_numeric())) {
            return false;
        }
    }
    true
}

fn is_valid_simple_identifier(sym: &Symbol) -> bool {
    sym.package.is_empty() && is_valid_go_identifier(&sym.identifier)
}

fn is_valid_qualified_identifier(sym: &Symbol) -> bool {
    is_valid_go_identifier(&sym.package)
        && &*sym.package != "_"
        && is_valid_go_identifier(&sym.identifier)
        && &*sym.identifier != "_"
}

fn is_valid_identifier(sym: &Symbol) -> bool {
    if sym.package.is_empty() {
        is_valid_go_identifier(&sym.identifier)
    } else {
        is_valid_qualified_identifier(sym)
    }
}

fn is_valid_import(lit: &str) -> bool {
    const ILLEGAL: &str = "!\"#$%&'()*,:;<=>?[\\]^{|}`\u{fffd}";
    !lit.is_empty()
        && lit
            .chars()
            .all(|r| !r.is_whitespace() && !r.is_control() && !ILLEGAL.contains(r))
}

fn format_comment(out: &mut String, comment: &str) {
    for line in comment.split('\n') {
        out.push_str("// ");
        out.push_str(line.trim());
        out.push('\n');
    }
}

fn format_identifier(out: &mut String, ident: &Symbol) {
    if !ident.package.is_empty() {
        out.push_str(&ident.package);
        out.push('.');
    }
    out.push_str(&ident.identifier);
}

/// A struct tag, back-quoted when possible.
fn format_tag(out: &mut String, tag: &str) {
    if tag.contains('`') || tag.chars().any(|c| c.is_control()) {
        out.push_str(&quote_string(tag));
    } else {
        out.push('`');
        out.push_str(tag);
        out.push('`');
    }
}

/// Replace a trailing statement newline with nothing, for contexts where
/// Go's automatic semicolon insertion would split the enclosing header.
fn trim_newline(out: &mut String) {
    if out.ends_with('\n') {
        out.pop();
    }
}

struct Translator<'t, 'i> {
    rd: &'t mut Reader<'i>,
    registry: &'t PluginRegistry,
    interner: &'i Interner,
    forms: Forms,
    header: String,
    bailed: bool,
}

impl<'t, 'i> Translator<'t, 'i> {
    fn heap(&self) -> &Heap {
        &self.rd.heap
    }

    fn display(&self, v: &Value) -> String {
        print_to_string(&self.rd.heap, self.interner, v)
    }

    fn error_offset(&mut self, offset: usize, msg: &str) {
        let pos = self.rd.file().position(offset);
        if let Some(last) = self.rd.errors.last() {
            if last.pos.line == pos.line {
                return;
            }
        }
        if self.rd.errors.len() > MAX_ERRORS {
            self.bailed = true;
            return;
        }
        self.rd.errors.add(pos, msg);
    }

    fn error_form(&mut self, form: PairId, msg: &str) {
        let span = self.rd.form_span(form).unwrap_or_default();
        self.error_offset(span.start, msg);
    }

    /// Rewrite a path-qualified symbol to its short form, emitting an
    /// import line into the header on the path's first use.
    fn enclose(&mut self, id: SymbolId) -> Symbol {
        let (enclosed, first_use) = self.rd.resolver.enclose_symbol(self.interner, id);
        let sym = self.interner.symbol(enclosed);
        if first_use {
            let original = self.interner.symbol(id);
            self.header.push_str("import ");
            self.header.push_str(&sym.package);
            self.header.push(' ');
            self.header.push_str(&quote_string(&original.package));
            self.header.push('\n');
        }
        sym
    }

    /// Property-list lookup: the value following the key.
    fn getf(&self, plist: &Value, key: SymbolId) -> Option<Value> {
        let mut current = plist.clone();
        while let Value::Pair(id) = current {
            let next = self.heap().cdr(id);
            if self.heap().car_ref(id).as_symbol() == Some(key) {
                return self.heap().car_of(&next);
            }
            current = self.heap().cdr_of(&next)?;
        }
        None
    }

    fn check_keys(&mut self, outer: PairId, plist: &Value, keys: &[SymbolId]) {
        let mut current = plist.clone();
        while let Value::Pair(id) = current {
            match self.heap().car_ref(id).as_symbol() {
                Some(k) if keys.contains(&k) => {}
                _ => {
                    let shown = self.heap().car(id);
                    let msg = format!("invalid key {}", self.display(&shown));
                    self.error_form(outer, &msg);
                }
            }
            let next = self.heap().cdr(id);
            match self.heap().cdr_of(&next) {
                Some(rest) => current = rest,
                None => {
                    self.error_form(outer, "invalid key list");
                    return;
                }
            }
        }
    }

    /// A single identifier or a parenthesized list of identifiers.
    fn collect_names(&self, v: &Value) -> Option<Names> {
        match v {
            Value::Symbol(id) => Some(smallvec![*id]),
            Value::Pair(_) => {
                let (elements, tail) = self.heap().spine(v);
                if !tail.is_nil() {
                    return None;
                }
                let mut names = Names::new();
                for element in elements {
                    names.push(element.as_symbol()?);
                }
                Some(names)
            }
            _ => None,
        }
    }

    fn write_names(&mut self, out: &mut String, outer: PairId, names: &Names) {
        for (i, &name) in names.iter().enumerate() {
            let sym = self.interner.symbol(name);
            if !is_valid_simple_identifier(&sym) {
                let msg = format!("invalid identifier {}", sym.identifier);
                self.error_form(outer, &msg);
            }
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&sym.identifier);
        }
    }

    fn expand_macro(&mut self, sym: &Symbol, form: PairId) -> Option<Value> {
        let f = match self.registry.lookup(&sym.package, &sym.identifier) {
            Some(f) => f,
            None => {
                self.error_form(form, "invalid macro invocation");
                return None;
            }
        };
        let interner = self.interner;
        match f(&mut self.rd.heap, interner, form, &Environment::new()) {
            Ok(new_form) => Some(new_form),
            Err(err) => {
                let msg = format!("error during macroexpansion: {}", err);
                self.error_form(form, &msg);
                None
            }
        }
    }

    // Top-level drive

    fn file(&mut self) -> String {
        self.header = self.package_clause();
        if !self.rd.errors.is_empty() {
            return String::new();
        }

        let mut element = self.rd.read();
        while let Some(Value::Pair(id)) = element {
            if self.heap().car_ref(id).as_symbol() != Some(self.forms.s_import) {
                break;
            }
            self.import_decl(id);
            element = self.rd.read();
        }
        while let Some(Value::Pair(id)) = element {
            if self.heap().car_ref(id).as_symbol() != Some(self.forms.s_use) {
                break;
            }
            self.use_decl(id);
            element = self.rd.read();
        }

        let mut body = String::new();
        loop {
            match element {
                None => break,
                Some(Value::Pair(id)) => {
                    self.decl(&mut body, id);
                    if self.bailed {
                        break;
                    }
                    element = self.rd.read();
                }
                Some(_) => {
                    let offset = self.rd.offset();
                    self.error_offset(offset, "invalid top-level form");
                    break;
                }
            }
        }

        if !self.rd.errors.is_empty() {
            return String::new();
        }
        let mut result = std::mem::take(&mut self.header);
        result.push('\n');
        result.push_str(&body);
        result
    }

    fn package_clause(&mut self) -> String {
        let mut out = String::new();
        let form = match self.rd.read() {
            Some(Value::Pair(id)) => id,
            _ => {
                self.error_offset(0, "package clause is not a list");
                return out;
            }
        };
        let clause = self.heap().list_to_vec(&Value::Pair(form));
        if clause.len() < 2 || clause.len() > 3 {
            self.error_form(form, "package clause has invalid length");
            return out;
        }
        if clause[0].as_symbol() != Some(self.forms.s_package) {
            self.error_form(form, "package clause starts with invalid keyword");
            return out;
        }
        let sym = match clause[1].as_symbol() {
            Some(id) => self.interner.symbol(id),
            None => {
                self.error_form(form, "package name is not an identifier");
                return out;
            }
        };
        if !is_valid_simple_identifier(&sym) || &*sym.identifier == "_" {
            self.error_form(form, "invalid package name");
        }
        if clause.len() == 3 {
            match clause[2].as_str() {
                Some(comment) => format_comment(&mut out, comment),
                None => self.error_form(form, "package comment is not a string"),
            }
        }
        out.push_str("package ");
        out.push_str(&sym.identifier);
        out.push_str("\n\n");
        out
    }

    // Group declarations

    fn gen_decl(
        &mut self,
        out: &mut String,
        keyword: &str,
        allow_lead_comment: bool,
        form: PairId,
        f: SpecFn,
    ) {
        let rest = self.heap().cdr(form);
        let (mut elements, _tail) = self.heap().spine(&rest);
        if elements.len() == 1 {
            self.one_decl(out, keyword, false, form, &elements[0], 0, f);
            return;
        }
        if allow_lead_comment && !elements.is_empty() {
            if let Value::Str(s) = &elements[0] {
                let s = s.clone();
                format_comment(out, &s);
                elements.remove(0);
                if elements.len() == 1 {
                    self.one_decl(out, keyword, true, form, &elements[0], 0, f);
                    return;
                }
            }
        }
        out.push_str(keyword);
        out.push_str(" (\n");
        for (i, element) in elements.iter().enumerate() {
            let (comment, decl) = f(self, form, element, i);
            if decl.is_empty() {
                continue;
            }
            if let Some(c) = comment {
                format_comment(out, &c);
            }
            out.push_str(&decl);
        }
        out.push_str(")\n\n");
    }

    #[allow(clippy::too_many_arguments)]
    fn one_decl(
        &mut self,
        out: &mut String,
        keyword: &str,
        lead_comment: bool,
        form: PairId,
        element: &Value,
        index: usize,
        f: SpecFn,
    ) {
        let (comment, decl) = f(self, form, element, index);
        if decl.is_empty() {
            return;
        }
        if let Some(c) = comment {
            if lead_comment {
                out.push_str("//\n");
            }
            format_comment(out, &c);
        }
        out.push_str(keyword);
        out.push(' ');
        out.push_str(&decl);
        out.push('\n');
    }

    // Imports and uses

    fn import_decl(&mut self, form: PairId) {
        let mut header = std::mem::take(&mut self.header);
        self.gen_decl(&mut header, "import", false, form, Self::import_spec);
        self.header = header;
    }

    fn import_spec(
        t: &mut Translator<'_, '_>,
        form: PairId,
        element: &Value,
        _index: usize,
    ) -> (Option<String>, String) {
        if let Value::Str(path) = element {
            let pkg = crate::packages::basename(path).to_string();
            if t.rd.resolver.package_to_path.contains_key(&pkg) {
                t.error_form(form, "ambiguous import");
            }
            t.rd.resolver.bind(&pkg, path);
            let mut decl = quote_string(path);
            decl.push('\n');
            return (None, decl);
        }
        let mut inner = match element.as_pair() {
            Some(id) => id,
            None => {
                t.error_form(form, "invalid import clause");
                return (None, String::new());
            }
        };
        let mut spec = t.heap().list_to_vec(element);
        if spec.len() < 2 || spec.len() > 3 {
            t.error_form(inner, "import clause has invalid length");
            return (None, String::new());
        }
        let mut quoted = false;
        if spec[0].as_symbol() == Some(t.forms.s_quote) {
            quoted = true;
            if spec.len() != 2 {
                t.error_form(inner, "invalid quoted import");
                return (None, String::new());
            }
            inner = match spec[1].as_pair() {
                Some(id) => id,
                None => {
                    t.error_form(form, "invalid quoted import");
                    return (None, String::new());
                }
            };
            spec = t.heap().list_to_vec(&Value::Pair(inner));
            if spec.len() < 2 || spec.len() > 3 {
                t.error_form(inner, "quoted import clause has invalid length");
                return (None, String::new());
            }
        }
        let ident = match spec[0].as_symbol() {
            Some(id) => t.interner.symbol(id),
            None => {
                t.error_form(inner, "import name is not an identifier");
                return (None, String::new());
            }
        };
        if !is_valid_simple_identifier(&ident) {
            t.error_form(inner, "invalid import identifier");
            return (None, String::new());
        }
        let import_name = ident.identifier.to_string();
        let path = match spec[1].as_str() {
            Some(path) => path.to_string(),
            None => {
                t.error_form(inner, "import path is not a string");
                return (None, String::new());
            }
        };
        if !is_valid_import(&path) {
            let msg = format!("invalid import path: {}", path);
            t.error_form(inner, &msg);
        }
        let mut comment = None;
        if spec.len() == 3 {
            match spec[2].as_str() {
                Some(s) => comment = Some(s.to_string()),
                None => t.error_form(inner, "import comment is not a string"),
            }
        }
        if import_name != "_" {
            if t.rd.resolver.package_to_path.contains_key(&import_name) {
                t.error_form(form, "ambiguous import");
            }
            t.rd
                .resolver
                .package_to_path
                .insert(import_name.clone(), path.clone());
            if !quoted {
                t.rd
                    .resolver
                    .path_to_package
                    .insert(path.clone(), import_name.clone());
            }
        }
        if quoted {
            return (comment, String::new());
        }
        let mut decl = import_name;
        decl.push(' ');
        decl.push_str(&quote_string(&path));
        decl.push('\n');
        (comment, decl)
    }

    /// A use declaration binds plugin paths (with the `#` sentinel) into
    /// the short-name namespace. It never contributes Go text.
    fn use_decl(&mut self, form: PairId) {
        let rest = self.heap().cdr(form);
        let (elements, _tail) = self.heap().spine(&rest);
        for element in &elements {
            self.use_spec(form, element);
        }
    }

    fn use_spec(&mut self, form: PairId, element: &Value) {
        if let Value::Str(path) = element {
            let pkg = crate::packages::basename(path).to_string();
            if self.rd.resolver.package_to_path.contains_key(&pkg) {
                self.error_form(form, "ambiguous use declaration");
            }
            let marked = format!("#{}", path);
            self.rd.resolver.package_to_path.insert(pkg, marked);
            return;
        }
        let mut inner = match element.as_pair() {
            Some(id) => id,
            None => {
                self.error_form(form, "invalid use clause");
                return;
            }
        };
        let mut spec = self.heap().list_to_vec(element);
        if spec.len() < 2 || spec.len() > 3 {
            self.error_form(inner, "use clause has invalid length");
            return;
        }
        if spec[0].as_symbol() == Some(self.forms.s_quote) {
            if spec.len() != 2 {
                self.error_form(inner, "invalid quoted use declaration");
                return;
            }
            inner = match spec[1].as_pair() {
                Some(id) => id,
                None => {
                    self.error_form(form, "invalid quoted use declaration");
                    return;
                }
            };
            spec = self.heap().list_to_vec(&Value::Pair(inner));
            if spec.len() < 2 || spec.len() > 3 {
                self.error_form(inner, "quoted use clause has invalid length");
                return;
            }
        }
        let ident = match spec[0].as_symbol() {
            Some(id) => self.interner.symbol(id),
            None => {
                self.error_form(inner, "plugin name is not an identifier");
                return;
            }
        };
        if !is_valid_simple_identifier(&ident) {
            self.error_form(inner, "invalid plugin identifier");
            return;
        }
        let path = match spec[1].as_str() {
            Some(path) => path.to_string(),
            None => {
                self.error_form(inner, "plugin path is not a string");
                return;
            }
        };
        if !is_valid_import(&path) {
            let msg = format!("invalid plugin path: {}", path);
            self.error_form(inner, &msg);
        }
        if spec.len() == 3 && spec[2].as_str().is_none() {
            self.error_form(inner, "plugin comment is not a string");
        }
        let plugin_name = ident.identifier.to_string();
        if plugin_name != "_" {
            if self.rd.resolver.package_to_path.contains_key(&plugin_name) {
                self.error_form(form, "ambiguous use declaration");
            }
            let marked = format!("#{}", path);
            self.rd.resolver.package_to_path.insert(plugin_name, marked);
        }
    }

    // Value and type specs

    fn value_spec(
        t: &mut Translator<'_, '_>,
        outer: PairId,
        element: &Value,
        iota: usize,
    ) -> (Option<String>, String) {
        let is_var = t.heap().car_ref(outer).as_symbol() == Some(t.forms.s_var);
        let mut decl = String::new();
        let mut comment = None;
        match element {
            Value::Pair(id) => {
                let id = *id;
                let head = t.heap().car(id);
                let names = match t.collect_names(&head) {
                    Some(names) if !names.is_empty() => names,
                    _ => {
                        t.error_form(id, "invalid identifier(s)");
                        return (None, String::new());
                    }
                };

                let rest = t.heap().cdr(id);
                t.check_keys(
                    id,
                    &rest,
                    &[t.forms.k_type, t.forms.k_equal, t.forms.k_documentation],
                );
                let typ = t.getf(&rest, t.forms.k_type);
                let val = t.getf(&rest, t.forms.k_equal);
                let doc = t.getf(&rest, t.forms.k_documentation);

                if is_var {
                    if typ.is_none() && val.is_none() {
                        t.error_form(id, "missing variable type or initialization");
                    }
                } else if val.is_none() && (iota == 0 || typ.is_some()) {
                    t.error_form(id, "missing constant value");
                }

                t.write_names(&mut decl, id, &names);
                if let Some(type_form) = typ {
                    decl.push(' ');
                    t.type_form(&mut decl, id, &type_form);
                }
                if let Some(value_form) = val {
                    decl.push_str(" = ");
                    t.expression(&mut decl, id, &value_form);
                }
                if let Some(doc_form) = doc {
                    match doc_form.as_str() {
                        Some(s) => comment = Some(s.to_string()),
                        None => t.error_form(id, "comment is not a string"),
                    }
                }
            }
            Value::Symbol(id) => {
                let sym = t.interner.symbol(*id);
                if !is_valid_simple_identifier(&sym) {
                    let msg = format!("invalid identifier {}", sym.identifier);
                    t.error_form(outer, &msg);
                }
                if is_var {
                    t.error_form(outer, "missing variable type or initialization");
                } else if iota == 0 {
                    t.error_form(outer, "missing constant value");
                }
                decl.push_str(&sym.identifier);
            }
            _ => {
                let msg = format!("invalid declaration {}", t.display(element));
                t.error_form(outer, &msg);
                return (None, String::new());
            }
        }
        decl.push('\n');
        (comment, decl)
    }

    fn type_spec_def(
        t: &mut Translator<'_, '_>,
        outer: PairId,
        element: &Value,
        _index: usize,
    ) -> (Option<String>, String) {
        t.type_spec(outer, element, false)
    }

    fn type_spec_alias(
        t: &mut Translator<'_, '_>,
        outer: PairId,
        element: &Value,
        _index: usize,
    ) -> (Option<String>, String) {
        t.type_spec(outer, element, true)
    }

    fn type_spec(
        &mut self,
        outer: PairId,
        element: &Value,
        alias: bool,
    ) -> (Option<String>, String) {
        let inner = match element.as_pair() {
            Some(id) => id,
            None => {
                self.error_form(outer, "invalid type spec");
                return (None, String::new());
            }
        };
        let spec = self.heap().list_to_vec(element);
        if spec.len() < 2 || spec.len() > 3 {
            self.error_form(inner, "type spec has invalid length");
            return (None, String::new());
        }
        let ident = match spec[0].as_symbol() {
            Some(id) => self.interner.symbol(id),
            None => {
                self.error_form(inner, "invalid identifier");
                return (None, String::new());
            }
        };
        if !is_valid_simple_identifier(&ident) {
            let msg = format!("invalid identifier {}", ident.identifier);
            self.error_form(inner, &msg);
        }
        let mut decl = ident.identifier.to_string();
        if alias {
            decl.push_str(" = ");
        } else {
            decl.push(' ');
        }
        let mut comment = None;
        if let Some(doc) = spec[1].as_str() {
            comment = Some(doc.to_string());
            if spec.len() < 3 {
                self.error_form(inner, "type spec has invalid length");
                return (None, String::new());
            }
            self.type_form(&mut decl, inner, &spec[2]);
        } else {
            if spec.len() > 2 {
                self.error_form(inner, "type spec has invalid length");
            }
            self.type_form(&mut decl, inner, &spec[1]);
        }
        decl.push('\n');
        (comment, decl)
    }

    // Parameter lists

    fn parameters(&mut self, out: &mut String, outer: PairId, form: &Value, ellipsis_ok: bool) {
        let entries = match form {
            Value::Nil => {
                out.push_str("()");
                return;
            }
            Value::Pair(_) => self.heap().list_to_vec(form),
            _ => {
                self.error_form(outer, "invalid parameter list");
                out.push_str("()");
                return;
            }
        };
        out.push('(');
        let last = entries.len() - 1;
        for (i, entry_value) in entries.iter().enumerate() {
            let entry_form = match entry_value.as_pair() {
                Some(id) => id,
                None => {
                    self.error_form(outer, "invalid parameter list entry");
                    continue;
                }
            };
            let entry = self.heap().list_to_vec(entry_value);
            let max = if ellipsis_ok { 3 } else { 2 };
            if entry.len() < 2 || entry.len() > max {
                self.error_form(entry_form, "invalid parameter declaration length");
            }
            let names = match self.collect_names(&entry[0]) {
                Some(names) if !names.is_empty() => names,
                _ => {
                    let msg = format!("invalid parameter names {}", self.display(&entry[0]));
                    self.error_form(entry_form, &msg);
                    continue;
                }
            };
            self.write_names(out, entry_form, &names);
            out.push(' ');
            let mut type_form = entry.get(1).cloned();
            if ellipsis_ok && entry[1].as_symbol() == Some(self.forms.s_ellipsis) {
                if entry.len() != 3 {
                    self.error_form(entry_form, "invalid parameter type");
                    continue;
                }
                if i != last {
                    self.error_form(
                        entry_form,
                        "variadic parameter is not the final entry in parameter list",
                    );
                }
                out.push_str("...");
                type_form = entry.get(2).cloned();
            }
            if let Some(tf) = type_form {
                self.type_form(out, entry_form, &tf);
            }
            if i != last {
                out.push_str(", ");
            }
        }
        out.push(')');
    }

    // Declarations

    fn decl(&mut self, out: &mut String, form: PairId) {
        let mut form = form;
        loop {
            if self.bailed {
                return;
            }
            let head = self.heap().car_ref(form).as_symbol();
            match head {
                Some(h) if h == self.forms.s_splice => {
                    let rest = self.heap().cdr(form);
                    let (elements, _) = self.heap().spine(&rest);
                    for element in &elements {
                        match element.as_pair() {
                            Some(id) => self.decl(out, id),
                            None => self.error_form(form, "invalid declaration"),
                        }
                    }
                    return;
                }
                Some(h) if h == self.forms.s_const => {
                    self.gen_decl(out, "const", true, form, Self::value_spec);
                    return;
                }
                Some(h) if h == self.forms.s_var => {
                    self.gen_decl(out, "var", true, form, Self::value_spec);
                    return;
                }
                Some(h) if h == self.forms.s_type => {
                    self.gen_decl(out, "type", true, form, Self::type_spec_def);
                    return;
                }
                Some(h) if h == self.forms.s_type_alias => {
                    self.gen_decl(out, "type", true, form, Self::type_spec_alias);
                    return;
                }
                Some(h) if h == self.forms.s_func => {
                    self.func_decl(out, form);
                    return;
                }
                Some(h) if h == self.forms.s_declare => {
                    self.pragma_decl(out, form);
                    return;
                }
                Some(h) => {
                    let sym = self.interner.symbol(h);
                    if sym.package.starts_with('#') {
                        match self.expand_macro(&sym, form) {
                            Some(Value::Pair(id)) => {
                                form = id;
                                continue;
                            }
                            Some(_) => {
                                self.error_form(form, "invalid declaration");
                                return;
                            }
                            None => return,
                        }
                    }
                    self.error_form(form, "invalid declaration");
                    return;
                }
                None => {
                    self.error_form(form, "invalid declaration");
                    return;
                }
            }
        }
    }

    fn func_decl(&mut self, out: &mut String, form: PairId) {
        let mut head = String::from("func ");
        let mut rest = self.heap().cdr(form);

        // An optional receiver precedes the name.
        if let Some(receiver @ Value::Pair(_)) = self.heap().car_of(&rest) {
            self.parameters(&mut head, form, &receiver, false);
            head.push(' ');
            rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        }

        let ident = match self.heap().car_of(&rest).and_then(|v| v.as_symbol()) {
            Some(id) => self.interner.symbol(id),
            None => {
                self.error_form(form, "function name is not an identifier");
                return;
            }
        };
        if !is_valid_simple_identifier(&ident) || &*ident.identifier == "_" {
            self.error_form(form, "invalid function name");
        }
        head.push_str(&ident.identifier);
        head.push(' ');
        rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);

        if rest.is_nil() {
            out.push_str(&head);
            out.push_str("()\n\n");
            return;
        }

        match self.heap().car_of(&rest) {
            Some(params @ (Value::Pair(_) | Value::Nil)) => {
                self.parameters(&mut head, form, &params, true);
                head.push(' ');
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            _ => self.error_form(form, "missing parameter list in function declaration"),
        }

        if rest.is_nil() {
            out.push_str(&head);
            out.push_str("\n\n");
            return;
        }

        match self.heap().car_of(&rest) {
            Some(results @ Value::Pair(_)) => {
                self.parameters(&mut head, form, &results, false);
                head.push(' ');
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            Some(Value::Nil) => {
                // An empty result list is skipped; it compiles to nothing.
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            _ => self.error_form(form, "missing result list in function declaration"),
        }

        if rest.is_nil() {
            out.push_str(&head);
            out.push_str("\n\n");
            return;
        }

        if let Some(Value::Str(comment)) = self.heap().car_of(&rest) {
            format_comment(out, &comment);
            rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        }

        out.push_str(&head);

        if rest.is_nil() {
            out.push_str("\n\n");
            return;
        }

        self.block(out, form, &rest);
        out.push('\n');
    }

    /// A declare form becomes a Go compiler pragma comment.
    fn pragma_decl(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 2 {
            self.error_form(form, "declare form has invalid length");
        }
        let text = match decl.get(1).and_then(|v| v.as_str()) {
            Some(s) => s.trim().to_string(),
            None => {
                self.error_form(form, "declaration in declare form is not a string");
                return;
            }
        };
        if text.is_empty() {
            self.error_form(form, "declaration in declare form is empty");
            return;
        }
        out.push_str("\n//");
        out.push_str(&text);
        out.push_str("\n\n");
    }

    // Type forms

    fn type_form(&mut self, out: &mut String, outer: PairId, form: &Value) {
        match form {
            Value::Symbol(id) => {
                let sym = self.enclose(*id);
                if !is_valid_identifier(&sym) {
                    let msg = format!("invalid identifier {}", sym);
                    self.error_form(outer, &msg);
                    return;
                }
                format_identifier(out, &sym);
            }
            Value::Pair(id) => {
                let id = *id;
                let head = self.heap().car_ref(id).as_symbol();
                match head {
                    Some(h) if h == self.forms.s_array => self.array_type(out, id),
                    Some(h) if h == self.forms.s_struct => self.struct_type(out, id),
                    Some(h) if h == self.forms.s_star => self.pointer_type(out, id),
                    Some(h) if h == self.forms.s_func => self.func_type(out, id),
                    Some(h) if h == self.forms.s_interface => self.interface_type(out, id),
                    Some(h) if h == self.forms.s_slice => self.slice_type(out, id),
                    Some(h) if h == self.forms.s_map => self.map_type(out, id),
                    Some(h) if h == self.forms.s_chan || h == self.forms.s_chan_send || h == self.forms.s_chan_recv => {
                        self.channel_type(out, id)
                    }
                    _ => self.error_form(id, "unknown type keyword"),
                }
            }
            _ => self.error_form(outer, "invalid type declaration"),
        }
    }

    fn array_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 3 {
            self.error_form(form, "invalid array type declaration");
            return;
        }
        out.push('[');
        if decl[1].as_symbol() == Some(self.forms.s_ellipsis) {
            out.push_str("...");
        } else {
            self.expression(out, form, &decl[1]);
        }
        out.push(']');
        self.type_form(out, form, &decl[2]);
    }

    fn struct_type(&mut self, out: &mut String, form: PairId) {
        let rest = self.heap().cdr(form);
        if rest.is_nil() {
            out.push_str("struct{}");
            return;
        }
        out.push_str("struct{\n");
        let (elements, _) = self.heap().spine(&rest);
        for element in &elements {
            let entry = match element.as_pair() {
                Some(id) => id,
                None => {
                    let msg = format!("invalid struct type entry {}", self.display(element));
                    self.error_form(form, &msg);
                    continue;
                }
            };
            let plist = self.heap().cdr(entry);
            self.check_keys(
                entry,
                &plist,
                &[self.forms.k_type, self.forms.k_tag, self.forms.k_documentation],
            );
            let doc = self.getf(&plist, self.forms.k_documentation);
            let typ = self.getf(&plist, self.forms.k_type);
            let tag = self.getf(&plist, self.forms.k_tag);
            if let Some(doc_form) = doc {
                match doc_form.as_str() {
                    Some(s) => format_comment(out, s),
                    None => self.error_form(entry, "struct field comment is not a string"),
                }
            }
            let head = self.heap().car(entry);
            if let Some(type_form) = typ {
                let names = match self.collect_names(&head) {
                    Some(names) if !names.is_empty() => names,
                    _ => {
                        let msg = format!("invalid identifiers {}", self.display(&head));
                        self.error_form(entry, &msg);
                        continue;
                    }
                };
                self.write_names(out, entry, &names);
                out.push(' ');
                self.type_form(out, entry, &type_form);
            } else {
                // An embedded type has no :type option.
                self.type_form(out, entry, &head);
            }
            if let Some(tag_form) = tag {
                match tag_form.as_str() {
                    Some(s) => {
                        out.push(' ');
                        format_tag(out, s);
                    }
                    None => {
                        let msg =
                            format!("tag for struct field is not a string {}", self.display(&tag_form));
                        self.error_form(entry, &msg);
                    }
                }
            }
            out.push('\n');
        }
        out.push('}');
    }

    fn pointer_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 2 {
            self.error_form(form, "invalid pointer type declaration");
            return;
        }
        out.push('*');
        self.type_form(out, form, &decl[1]);
    }

    fn func_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.is_empty() || decl.len() > 4 {
            self.error_form(form, "invalid function type declaration");
            return;
        }
        if decl.len() == 4 && decl[3].as_str().is_none() {
            self.error_form(form, "invalid function type declaration");
        }
        out.push_str("func ");
        if decl.len() == 1 {
            out.push_str("()");
            return;
        }
        self.parameters(out, form, &decl[1], true);
        if decl.len() >= 3 && !decl[2].is_nil() {
            out.push(' ');
            self.parameters(out, form, &decl[2], false);
        }
    }

    fn interface_type(&mut self, out: &mut String, form: PairId) {
        let rest = self.heap().cdr(form);
        if rest.is_nil() {
            out.push_str("interface{}");
            return;
        }
        out.push_str("interface{\n");
        let (elements, _) = self.heap().spine(&rest);
        for element in &elements {
            match element {
                Value::Symbol(id) => {
                    let sym = self.enclose(*id);
                    if !is_valid_identifier(&sym) {
                        let msg = format!("invalid identifier {}", sym);
                        self.error_form(form, &msg);
                        continue;
                    }
                    format_identifier(out, &sym);
                    out.push('\n');
                }
                Value::Pair(entry) => {
                    let entry = *entry;
                    let spec = self.heap().list_to_vec(element);
                    if spec.is_empty() || spec.len() > 4 {
                        let msg = format!("invalid interface type entry {}", self.display(element));
                        self.error_form(entry, &msg);
                        continue;
                    }
                    if spec.len() >= 2 && spec[1].as_symbol() == Some(self.forms.k_documentation) {
                        // An embedded interface with documentation.
                        if spec.len() != 3 {
                            let msg =
                                format!("invalid interface type entry {}", self.display(element));
                            self.error_form(entry, &msg);
                            continue;
                        }
                        let ident = match spec[0].as_symbol() {
                            Some(id) => self.enclose(id),
                            None => {
                                self.error_form(entry, "invalid identifier");
                                continue;
                            }
                        };
                        if !is_valid_identifier(&ident) {
                            let msg = format!("invalid identifier {}", ident);
                            self.error_form(entry, &msg);
                            continue;
                        }
                        match spec[2].as_str() {
                            Some(s) => format_comment(out, s),
                            None => self.error_form(entry, "interface comment is not a string"),
                        }
                        format_identifier(out, &ident);
                        out.push('\n');
                        continue;
                    }
                    if spec.len() == 4 {
                        match spec[3].as_str() {
                            Some(s) => format_comment(out, s),
                            None => self.error_form(entry, "interface comment is not a string"),
                        }
                    }
                    match spec[0].as_symbol().map(|id| self.interner.symbol(id)) {
                        Some(name)
                            if is_valid_simple_identifier(&name) && &*name.identifier != "_" =>
                        {
                            out.push_str(&name.identifier);
                            out.push(' ');
                        }
                        other => {
                            let msg = format!(
                                "invalid interface type entry name {}",
                                other.map(|s| s.to_string()).unwrap_or_else(|| self
                                    .display(&spec[0]))
                            );
                            self.error_form(entry, &msg);
                        }
                    }
                    if spec.len() == 1 {
                        out.push_str("()\n");
                        continue;
                    }
                    self.parameters(out, entry, &spec[1], true);
                    if spec.len() >= 3 && !spec[2].is_nil() {
                        out.push(' ');
                        self.parameters(out, entry, &spec[2], false);
                    }
                    out.push('\n');
                }
                _ => {
                    let msg = format!("invalid interface type entry {}", self.display(element));
                    self.error_form(form, &msg);
                }
            }
        }
        out.push('}');
    }

    fn slice_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 2 {
            self.error_form(form, "invalid slice type declaration");
            return;
        }
        out.push_str("[]");
        self.type_form(out, form, &decl[1]);
    }

    fn map_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 3 {
            self.error_form(form, "invalid map type declaration");
            return;
        }
        out.push_str("map[");
        self.type_form(out, form, &decl[1]);
        out.push(']');
        self.type_form(out, form, &decl[2]);
    }

    fn channel_type(&mut self, out: &mut String, form: PairId) {
        let decl = self.heap().list_to_vec(&Value::Pair(form));
        if decl.len() != 2 {
            self.error_form(form, "invalid channel type declaration");
            return;
        }
        let head = decl[0].as_symbol().map(|id| self.interner.symbol(id));
        if let Some(sym) = head {
            out.push_str(&sym.identifier);
            out.push(' ');
        }
        self.type_form(out, form, &decl[1]);
    }

    // Statements

    fn block(&mut self, out: &mut String, outer: PairId, form: &Value) {
        if form.is_nil() {
            out.push_str("{} ");
            return;
        }
        out.push_str("{\n");
        let (elements, _) = self.heap().spine(form);
        for element in &elements {
            self.statement(out, outer, element, false);
        }
        out.push_str("}\n");
    }

    /// Inline the statements without braces of their own.
    fn implicit_block(&mut self, out: &mut String, outer: PairId, form: &Value) {
        if form.is_nil() {
            out.push('\n');
            return;
        }
        let (elements, _) = self.heap().spine(form);
        for element in &elements {
            self.statement(out, outer, element, false);
        }
    }

    fn simple_statement(&mut self, out: &mut String, form: &Value) {
        let id = match form {
            Value::Pair(id) => *id,
            Value::Nil => {
                out.push('\n');
                return;
            }
            _ => {
                // Not reachable from well-formed dispatch; treat as an
                // expression statement.
                let outer = PairId(0);
                self.expression(out, outer, form);
                out.push('\n');
                return;
            }
        };
        let slice = self.heap().list_to_vec(form);
        let head = slice[0].as_symbol();
        match head {
            Some(h) if h == self.forms.s_send => {
                if slice.len() != 3 {
                    self.error_form(id, "invalid channel send statement");
                    return;
                }
                self.expression(out, id, &slice[1]);
                out.push_str(" <- ");
                self.expression(out, id, &slice[2]);
            }
            Some(h) if h == self.forms.s_inc || h == self.forms.s_dec => {
                if slice.len() != 2 {
                    self.error_form(id, "invalid inc/dec statement");
                    return;
                }
                self.expression(out, id, &slice[1]);
                let op = self.interner.symbol(head.unwrap());
                out.push_str(&op.identifier);
            }
            Some(h) if self.forms.is_assign_op(h) => {
                if slice.len() != 3 {
                    self.error_form(id, "invalid assignment statement");
                    return;
                }
                self.expression(out, id, &slice[1]);
                out.push(' ');
                let op = self.interner.symbol(h);
                out.push_str(&op.identifier);
                out.push(' ');
                self.expression(out, id, &slice[2]);
            }
            Some(h) if h == self.forms.k_equal => {
                if slice.len() != 3 {
                    self.error_form(id, "invalid short variable definition");
                    return;
                }
                let names = match self.collect_names(&slice[1]) {
                    Some(names) if !names.is_empty() => names,
                    _ => {
                        let msg = format!("invalid identifiers {}", self.display(&slice[1]));
                        self.error_form(id, &msg);
                        return;
                    }
                };
                self.write_names(out, id, &names);
                out.push_str(" := ");
                self.expression(out, id, &slice[2]);
            }
            _ => {
                self.expression(out, id, form);
            }
        }
        out.push('\n');
    }

    fn statement(&mut self, out: &mut String, outer: PairId, stmt: &Value, at_block: bool) {
        let mut stmt = stmt.clone();
        loop {
            if self.bailed {
                return;
            }
            match &stmt {
                Value::Symbol(id) => {
                    let sym = self.interner.symbol(*id);
                    if sym.is_keyword() {
                        if !is_valid_go_identifier(&sym.identifier) || &*sym.identifier == "_" {
                            let msg = format!("invalid label name {}", sym);
                            self.error_form(outer, &msg);
                        }
                        out.push_str(&sym.identifier);
                        out.push_str(":\n");
                        return;
                    }
                    self.expression(out, outer, &stmt);
                    out.push('\n');
                    return;
                }
                Value::Nil => {
                    self.simple_statement(out, &Value::Nil);
                    return;
                }
                Value::Pair(id) => {
                    let id = *id;
                    let head = self.heap().car_ref(id).as_symbol();
                    match head {
                        Some(h)
                            if h == self.forms.s_const
                                || h == self.forms.s_type
                                || h == self.forms.s_type_alias
                                || h == self.forms.s_var =>
                        {
                            self.decl(out, id);
                            return;
                        }
                        Some(h) if self.forms.is_simple_statement_head(h) => {
                            self.simple_statement(out, &stmt);
                            return;
                        }
                        Some(h) if h == self.forms.s_go || h == self.forms.s_defer => {
                            self.delayed_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_break || h == self.forms.s_continue || h == self.forms.s_goto => {
                            self.jump_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_return => {
                            self.return_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_fallthrough => {
                            if !self.heap().cdr_ref(id).is_nil() {
                                self.error_form(id, "invalid fallthrough statement");
                            }
                            out.push_str("fallthrough\n");
                            return;
                        }
                        Some(h) if h == self.forms.s_splice => {
                            let rest = self.heap().cdr(id);
                            self.implicit_block(out, id, &rest);
                            return;
                        }
                        Some(h) if h == self.forms.s_begin => {
                            let rest = self.heap().cdr(id);
                            if at_block {
                                self.implicit_block(out, id, &rest);
                            } else {
                                self.block(out, id, &rest);
                            }
                            return;
                        }
                        Some(h) if h == self.forms.s_if => {
                            self.if_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_if_star => {
                            self.if_star_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_for => {
                            self.for_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_while => {
                            self.while_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_loop => {
                            let rest = self.heap().cdr(id);
                            out.push_str("for ");
                            self.block(out, id, &rest);
                            return;
                        }
                        Some(h) if h == self.forms.s_range => {
                            self.range_statement(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_switch => {
                            self.switch_statement(out, id, false);
                            return;
                        }
                        Some(h) if h == self.forms.s_switch_star => {
                            self.switch_statement(out, id, true);
                            return;
                        }
                        Some(h) if h == self.forms.s_type_switch => {
                            self.type_switch_statement(out, id, false);
                            return;
                        }
                        Some(h) if h == self.forms.s_type_switch_star => {
                            self.type_switch_statement(out, id, true);
                            return;
                        }
                        Some(h) if h == self.forms.s_select => {
                            self.select_statement(out, id);
                            return;
                        }
                        Some(h) => {
                            let sym = self.interner.symbol(h);
                            if sym.package.starts_with('#') {
                                match self.expand_macro(&sym, id) {
                                    Some(new_form) => {
                                        stmt = new_form;
                                        continue;
                                    }
                                    None => return,
                                }
                            }
                            let value = stmt.clone();
                            self.expression(out, id, &value);
                            out.push('\n');
                            return;
                        }
                        None => {
                            let value = stmt.clone();
                            self.expression(out, id, &value);
                            out.push('\n');
                            return;
                        }
                    }
                }
                _ => {
                    let msg = format!("invalid statement {}", self.display(&stmt));
                    self.error_form(outer, &msg);
                    return;
                }
            }
        }
    }

    fn if_statement(&mut self, out: &mut String, form: PairId) {
        let stmt = self.heap().list_to_vec(&Value::Pair(form));
        if stmt.len() < 3 || stmt.len() > 4 {
            self.error_form(form, "invalid if statement");
            if stmt.len() < 3 {
                return;
            }
        }
        out.push_str("if ");
        self.expression(out, form, &stmt[1]);
        out.push_str(" {\n");
        self.statement(out, form, &stmt[2], true);
        if stmt.len() == 4 {
            out.push_str("} else {\n");
            self.statement(out, form, &stmt[3], true);
        }
        out.push_str("}\n");
    }

    fn if_star_statement(&mut self, out: &mut String, form: PairId) {
        let stmt = self.heap().list_to_vec(&Value::Pair(form));
        if stmt.len() < 4 || stmt.len() > 5 {
            self.error_form(form, "invalid if* statement");
            if stmt.len() < 4 {
                return;
            }
        }
        out.push_str("if ");
        self.simple_statement(out, &stmt[1]);
        if !out.ends_with('\n') {
            out.push_str("; ");
        }
        self.expression(out, form, &stmt[2]);
        out.push_str(" {\n");
        self.statement(out, form, &stmt[3], true);
        if stmt.len() == 5 {
            out.push_str("} else {\n");
            self.statement(out, form, &stmt[4], true);
        }
        out.push_str("}\n");
    }

    fn for_statement(&mut self, out: &mut String, form: PairId) {
        let rest = self.heap().cdr(form);
        out.push_str("for ");
        let clause_value = self.heap().car_of(&rest).unwrap_or(Value::Nil);
        let body = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        let clause = match &clause_value {
            Value::Nil => Vec::new(),
            Value::Pair(_) => self.heap().list_to_vec(&clause_value),
            _ => {
                self.error_form(form, "invalid for statement");
                return;
            }
        };
        if clause.len() > 3 {
            self.error_form(form, "invalid for statement");
        }
        if clause.is_empty() {
            self.block(out, form, &body);
            return;
        }
        if !clause[0].is_nil() {
            self.simple_statement(out, &clause[0]);
        }
        if !out.ends_with('\n') {
            out.push_str("; ");
        }
        if clause.len() > 1 && !clause[1].is_nil() {
            self.expression(out, form, &clause[1]);
        }
        if !out.ends_with('\n') {
            out.push_str("; ");
        }
        if clause.len() > 2 && !clause[2].is_nil() {
            self.simple_statement(out, &clause[2]);
            // The post statement must stay on the header line.
            trim_newline(out);
        }
        out.push(' ');
        self.block(out, form, &body);
    }

    fn while_statement(&mut self, out: &mut String, form: PairId) {
        let rest = self.heap().cdr(form);
        out.push_str("for ");
        let cond = self.heap().car_of(&rest).unwrap_or(Value::Nil);
        self.expression(out, form, &cond);
        out.push(' ');
        let body = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        self.block(out, form, &body);
    }

    fn range_statement(&mut self, out: &mut String, form: PairId) {
        let rest = self.heap().cdr(form);
        out.push_str("for ");
        let clause_value = self.heap().car_of(&rest).unwrap_or(Value::Nil);
        let clause = match clause_value.as_pair() {
            Some(_) => self.heap().list_to_vec(&clause_value),
            None => {
                self.error_form(form, "invalid range statement");
                return;
            }
        };
        if clause.len() != 3 {
            self.error_form(form, "invalid range statement");
            return;
        }
        let head = clause[0].as_symbol();
        if head == Some(self.forms.k_equal) {
            let names = match self.collect_names(&clause[1]) {
                Some(names) if !names.is_empty() => names,
                _ => {
                    let msg = format!("invalid identifiers {}", self.display(&clause[1]));
                    self.error_form(form, &msg);
                    return;
                }
            };
            self.write_names(out, form, &names);
            out.push_str(" := range ");
        } else if head == Some(self.forms.s_assign) {
            self.expression(out, form, &clause[1]);
            out.push_str(" = range ");
        } else {
            self.error_form(form, "invalid range statement");
            return;
        }
        self.expression(out, form, &clause[2]);
        out.push(' ');
        let body = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        self.block(out, form, &body);
    }

    fn switch_statement(&mut self, out: &mut String, form: PairId, star: bool) {
        let mut rest = self.heap().cdr(form);
        out.push_str("switch ");
        if star {
            let init = self.heap().car_of(&rest).unwrap_or(Value::Nil);
            self.simple_statement(out, &init);
            if !out.ends_with('\n') {
                out.push_str("; ");
            }
            rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        }
        let scrutinee = self.heap().car_of(&rest).unwrap_or(Value::Nil);
        self.expression(out, form, &scrutinee);
        out.push_str(" {\n");
        let clauses = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        let (elements, _) = self.heap().spine(&clauses);
        let mut default_seen = false;
        for element in &elements {
            let clause = match element.as_pair() {
                Some(id) => id,
                None => {
                    self.error_form(form, "invalid switch case");
                    continue;
                }
            };
            let pattern = self.heap().car(clause);
            if pattern.as_symbol() == Some(self.forms.s_default) {
                if default_seen {
                    self.error_form(form, "multiple default cases");
                }
                default_seen = true;
                out.push_str("default:\n");
            } else {
                out.push_str("case ");
                match &pattern {
                    Value::Pair(_) => {
                        let values = self.heap().list_to_vec(&pattern);
                        for (i, value) in values.iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }
                            self.expression(out, form, value);
                        }
                    }
                    other => self.expression(out, form, other),
                }
                out.push_str(":\n");
            }
            let body = self.heap().cdr(clause);
            self.implicit_block(out, form, &body);
        }
        out.push_str("}\n");
    }

    fn type_switch_statement(&mut self, out: &mut String, form: PairId, star: bool) {
        let mut rest = self.heap().cdr(form);
        out.push_str("switch ");
        if star {
            let init = self.heap().car_of(&rest).unwrap_or(Value::Nil);
            self.simple_statement(out, &init);
            if !out.ends_with('\n') {
                out.push_str("; ");
            }
            rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        }
        let binding = match self.heap().car_of(&rest).and_then(|v| v.as_symbol()) {
            Some(id) => self.interner.symbol(id),
            None => {
                self.error_form(form, "invalid variable declaration");
                return;
            }
        };
        if !is_valid_simple_identifier(&binding) {
            self.error_form(form, "invalid variable declaration");
        }
        if &*binding.identifier != "_" {
            out.push_str(&binding.identifier);
            out.push_str(" := ");
        }
        rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        let scrutinee = self.heap().car_of(&rest).unwrap_or(Value::Nil);
        self.primary_expression(out, form, &scrutinee);
        out.push_str(".(type) {\n");
        let clauses = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        let (elements, _) = self.heap().spine(&clauses);
        let mut default_seen = false;
        for element in &elements {
            let clause = match element.as_pair() {
                Some(id) => id,
                None => {
                    self.error_form(form, "invalid type-switch case");
                    continue;
                }
            };
            let pattern = self.heap().car(clause);
            if pattern.as_symbol() == Some(self.forms.s_default) {
                if default_seen {
                    self.error_form(form, "multiple default cases");
                }
                default_seen = true;
                out.push_str("default:\n");
            } else {
                out.push_str("case ");
                match &pattern {
                    Value::Symbol(_) => self.type_form(out, form, &pattern),
                    Value::Pair(_) => {
                        let types = self.heap().list_to_vec(&pattern);
                        for (i, type_form) in types.iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }
                            self.type_form(out, form, type_form);
                        }
                    }
                    _ => self.error_form(form, "invalid type-switch case"),
                }
                out.push_str(":\n");
            }
            let body = self.heap().cdr(clause);
            self.implicit_block(out, form, &body);
        }
        out.push_str("}\n");
    }

    fn select_statement(&mut self, out: &mut String, form: PairId) {
        out.push_str("select {\n");
        let clauses = self.heap().cdr(form);
        let (elements, _) = self.heap().spine(&clauses);
        let mut default_seen = false;
        for element in &elements {
            let clause = match element.as_pair() {
                Some(id) => id,
                None => {
                    self.error_form(form, "invalid select statement");
                    continue;
                }
            };
            let head = self.heap().car(clause);
            if head.as_symbol() == Some(self.forms.s_default) {
                if default_seen {
                    self.error_form(form, "multiple default cases");
                }
                default_seen = true;
                out.push_str("default:\n");
            } else {
                match head.as_pair().and_then(|id| self.heap().car_ref(id).as_symbol()) {
                    Some(h)
                        if h == self.forms.s_send
                            || h == self.forms.s_recv
                            || h == self.forms.s_assign
                            || h == self.forms.k_equal => {}
                    _ => self.error_form(form, "invalid select statement"),
                }
                out.push_str("case ");
                self.simple_statement(out, &head);
                trim_newline(out);
                out.push_str(":\n");
            }
            let body = self.heap().cdr(clause);
            self.implicit_block(out, form, &body);
        }
        out.push_str("}\n");
    }

    fn return_statement(&mut self, out: &mut String, form: PairId) {
        let stmt = self.heap().list_to_vec(&Value::Pair(form));
        if stmt.len() > 2 {
            self.error_form(form, "invalid number of return values");
        }
        if stmt.len() < 2 {
            out.push_str("return\n");
            return;
        }
        out.push_str("return ");
        self.expression(out, form, &stmt[1]);
        out.push('\n');
    }

    fn delayed_statement(&mut self, out: &mut String, form: PairId) {
        let stmt = self.heap().list_to_vec(&Value::Pair(form));
        if stmt.len() != 2 {
            let msg = format!("invalid statement {}", self.display(&Value::Pair(form)));
            self.error_form(form, &msg);
            return;
        }
        if let Some(head) = stmt[0].as_symbol() {
            let sym = self.interner.symbol(head);
            out.push_str(&sym.identifier);
            out.push(' ');
        }
        self.expression(out, form, &stmt[1]);
        out.push('\n');
    }

    fn jump_statement(&mut self, out: &mut String, form: PairId) {
        let stmt = self.heap().list_to_vec(&Value::Pair(form));
        let head = self.heap().car_ref(form).as_symbol();
        if head == Some(self.forms.s_goto) {
            if stmt.len() != 2 {
                self.error_form(form, "invalid goto statement");
            }
        } else if stmt.len() > 2 {
            self.error_form(form, "invalid break/continue statement");
        }
        if let Some(h) = head {
            let sym = self.interner.symbol(h);
            out.push_str(&sym.identifier);
        }
        if stmt.len() == 2 {
            let label = stmt[1].as_symbol().map(|id| self.interner.symbol(id));
            match label {
                Some(label)
                    if is_valid_simple_identifier(&label) && &*label.identifier != "_" =>
                {
                    out.push(' ');
                    out.push_str(&label.identifier);
                }
                _ => {
                    let msg = format!("invalid jump target {}", self.display(&stmt[1]));
                    self.error_form(form, &msg);
                }
            }
        }
        out.push('\n');
    }

    // Expressions

    fn expression(&mut self, out: &mut String, outer: PairId, element: &Value) {
        self.expr(out, outer, element, true);
    }

    /// Expression in a context where a top-level operator form would be
    /// ambiguous (the scrutinee of a type switch).
    fn primary_expression(&mut self, out: &mut String, outer: PairId, element: &Value) {
        self.expr(out, outer, element, false);
    }

    fn expr(&mut self, out: &mut String, outer: PairId, element: &Value, operator_allowed: bool) {
        let mut element = element.clone();
        loop {
            if self.bailed {
                return;
            }
            match &element {
                Value::Symbol(id) => {
                    let sym = self.enclose(*id);
                    if !is_valid_identifier(&sym) {
                        let msg = format!("invalid identifier {}", sym);
                        self.error_form(outer, &msg);
                    }
                    format_identifier(out, &sym);
                    return;
                }
                Value::Int(n) => {
                    out.push_str(&n.to_string());
                    return;
                }
                Value::Float(f) => {
                    out.push_str(&format!("{:?}", f));
                    return;
                }
                Value::Complex(c) => {
                    out.push_str(&format!("({:?} + {:?}i)", c.re, c.im));
                    return;
                }
                Value::Rune(r) => {
                    out.push_str(&quote_rune(*r));
                    return;
                }
                Value::Str(s) => {
                    out.push_str(&quote_string(s));
                    return;
                }
                Value::Nil => {
                    // The empty list is the list library's Nil().
                    let nil_sym = self.interner.intern(LIST_PATH, "Nil");
                    let sym = self.enclose(nil_sym);
                    out.push_str(&sym.package);
                    out.push('.');
                    out.push_str(&sym.identifier);
                    out.push_str("()");
                    return;
                }
                Value::Bad(_) => {
                    self.error_form(outer, "invalid expression");
                    return;
                }
                Value::Pair(id) => {
                    let id = *id;
                    let head = self.heap().car_ref(id).as_symbol();
                    match head {
                        Some(h) if h == self.forms.s_make => {
                            self.make_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_make_struct => {
                            self.struct_literal(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_make_array => {
                            self.vector_literal(out, "array", id);
                            return;
                        }
                        Some(h) if h == self.forms.s_make_slice => {
                            self.vector_literal(out, "slice", id);
                            return;
                        }
                        Some(h) if h == self.forms.s_make_map => {
                            self.map_literal(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_func => {
                            self.func_literal(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_slot => {
                            self.slot_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_at => {
                            self.index_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_slice => {
                            self.slice_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_assert => {
                            self.assert_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_convert => {
                            self.convert_expression(out, id);
                            return;
                        }
                        Some(h) if h == self.forms.s_values => {
                            let rest = self.heap().cdr(id);
                            let (elements, _) = self.heap().spine(&rest);
                            for (i, value) in elements.iter().enumerate() {
                                if i > 0 {
                                    out.push_str(", ");
                                }
                                self.expr(out, outer, value, operator_allowed);
                            }
                            return;
                        }
                        Some(h) if self.forms.is_operator_head(h) => {
                            if !operator_allowed {
                                self.error_form(
                                    outer,
                                    "no operator expression allowed in this context",
                                );
                            }
                            self.operator_expression(out, id);
                            return;
                        }
                        Some(h) if self.forms.is_quotation_head(h) => {
                            let name = if h == self.forms.s_quote {
                                "Quote"
                            } else if h == self.forms.s_quasiquote {
                                "Quasiquote"
                            } else if h == self.forms.s_unquote {
                                "Unquote"
                            } else {
                                "UnquoteSplicing"
                            };
                            let macro_fn = match self.registry.lookup_core(name) {
                                Some(macro_fn) => macro_fn,
                                None => {
                                    self.error_form(outer, "invalid special form");
                                    return;
                                }
                            };
                            let interner = self.interner;
                            match macro_fn(&mut self.rd.heap, interner, id, &Environment::new()) {
                                Ok(new_form) => {
                                    element = new_form;
                                    continue;
                                }
                                Err(err) => {
                                    let msg =
                                        format!("error during special form processing: {}", err);
                                    self.error_form(outer, &msg);
                                    return;
                                }
                            }
                        }
                        Some(h) => {
                            let sym = self.interner.symbol(h);
                            if sym.package.starts_with('#') {
                                match self.expand_macro(&sym, id) {
                                    Some(new_form) => {
                                        element = new_form;
                                        continue;
                                    }
                                    None => return,
                                }
                            }
                            self.call_expression(out, id);
                            return;
                        }
                        None => {
                            self.call_expression(out, id);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn operator_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() < 2 {
            self.error_form(form, "invalid operator expression");
            return;
        }
        let op_id = match expr[0].as_symbol() {
            Some(id) => id,
            None => {
                self.error_form(form, "invalid operator expression");
                return;
            }
        };
        let op = self.interner.symbol(op_id);
        if expr.len() == 2 {
            if !self.forms.is_unary_op(op_id) {
                let msg = format!("invalid operator {} in unary expression", op);
                self.error_form(form, &msg);
                return;
            }
            out.push_str(&op.identifier);
            self.expression(out, form, &expr[1]);
            return;
        }
        if self.forms.is_nary_op(op_id) {
            out.push('(');
            self.expression(out, form, &expr[1]);
            for operand in &expr[2..] {
                out.push(' ');
                out.push_str(&op.identifier);
                out.push(' ');
                self.expression(out, form, operand);
            }
            out.push(')');
            return;
        }
        if self.forms.is_relational_op(op_id) {
            if expr.len() != 3 {
                self.error_form(form, "invalid operator expression");
                return;
            }
            out.push('(');
            self.expression(out, form, &expr[1]);
            out.push(' ');
            out.push_str(&op.identifier);
            out.push(' ');
            self.expression(out, form, &expr[2]);
            out.push(')');
            return;
        }
        self.error_form(form, "invalid operator expression");
    }

    fn call_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.is_empty() {
            self.error_form(form, "invalid call expression");
            return;
        }
        self.expression(out, form, &expr[0]);
        if expr.len() == 1 {
            out.push_str("()");
            return;
        }
        out.push('(');
        self.expression(out, form, &expr[1]);
        if expr.len() > 2 {
            let last = expr.len() - 1;
            for value in &expr[2..last] {
                out.push_str(", ");
                self.expression(out, form, value);
            }
            if expr[last].as_symbol() == Some(self.forms.s_ellipsis) {
                out.push_str("...");
            } else {
                out.push_str(", ");
                self.expression(out, form, &expr[last]);
            }
        }
        out.push(')');
    }

    fn make_expression(&mut self, out: &mut String, form: PairId) {
        out.push_str("make(");
        let rest = self.heap().cdr(form);
        match self.heap().car_of(&rest) {
            Some(type_form) => self.type_form(out, form, &type_form),
            None => self.error_form(form, "invalid make expression"),
        }
        let args = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
        let (elements, _) = self.heap().spine(&args);
        for value in &elements {
            out.push_str(", ");
            self.expression(out, form, value);
        }
        out.push(')');
    }

    fn struct_literal(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() < 2 || expr.len() % 2 == 1 {
            self.error_form(form, "invalid struct literal");
            if expr.len() < 2 {
                return;
            }
        }
        out.push('(');
        self.type_form(out, form, &expr[1]);
        out.push('{');
        let mut i = 2;
        while i + 1 < expr.len() {
            match expr[i].as_symbol().map(|id| self.interner.symbol(id)) {
                Some(key) if is_valid_simple_identifier(&key) => out.push_str(&key.identifier),
                _ => {
                    let msg = format!("invalid key {} in struct literal", self.display(&expr[i]));
                    self.error_form(form, &msg);
                }
            }
            out.push_str(": ");
            self.expression(out, form, &expr[i + 1]);
            out.push_str(", ");
            i += 2;
        }
        out.push_str("})");
    }

    fn vector_literal(&mut self, out: &mut String, kind: &str, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() < 2 {
            let msg = format!("invalid {} literal", kind);
            self.error_form(form, &msg);
            return;
        }
        out.push('(');
        self.type_form(out, form, &expr[1]);
        out.push('{');
        for value in &expr[2..] {
            self.expression(out, form, value);
            out.push_str(", ");
        }
        out.push_str("})");
    }

    fn map_literal(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() < 2 || expr.len() % 2 == 1 {
            self.error_form(form, "invalid map literal");
            if expr.len() < 2 {
                return;
            }
        }
        out.push('(');
        self.type_form(out, form, &expr[1]);
        out.push('{');
        let mut i = 2;
        while i + 1 < expr.len() {
            self.expression(out, form, &expr[i]);
            out.push_str(": ");
            self.expression(out, form, &expr[i + 1]);
            out.push_str(", ");
            i += 2;
        }
        out.push_str("})");
    }

    fn func_literal(&mut self, out: &mut String, form: PairId) {
        out.push_str("func ");
        let mut rest = self.heap().cdr(form);
        if rest.is_nil() {
            out.push_str("() {} ");
            return;
        }
        match self.heap().car_of(&rest) {
            Some(params @ (Value::Pair(_) | Value::Nil)) => {
                self.parameters(out, form, &params, true);
                out.push(' ');
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            _ => self.error_form(form, "missing parameter list in function literal"),
        }
        if rest.is_nil() {
            out.push_str("{} ");
            return;
        }
        match self.heap().car_of(&rest) {
            Some(results @ Value::Pair(_)) => {
                self.parameters(out, form, &results, false);
                out.push(' ');
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            Some(Value::Nil) => {
                rest = self.heap().cdr_of(&rest).unwrap_or(Value::Nil);
            }
            _ => self.error_form(form, "missing result list in function literal"),
        }
        self.block(out, form, &rest);
    }

    fn slot_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() != 3 {
            self.error_form(form, "invalid slot expression");
            return;
        }
        self.expression(out, form, &expr[1]);
        out.push('.');
        match expr[2].as_symbol().map(|id| self.interner.symbol(id)) {
            Some(selector) if is_valid_simple_identifier(&selector) => {
                out.push_str(&selector.identifier);
            }
            _ => {
                let msg = format!("invalid selector {} in slot expression", self.display(&expr[2]));
                self.error_form(form, &msg);
            }
        }
    }

    fn index_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() != 3 {
            self.error_form(form, "invalid index expression");
            return;
        }
        self.expression(out, form, &expr[1]);
        out.push('[');
        self.expression(out, form, &expr[2]);
        out.push(']');
    }

    fn slice_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() < 3 || expr.len() > 5 {
            self.error_form(form, "invalid slice expression");
            return;
        }
        self.expression(out, form, &expr[1]);
        out.push('[');
        self.expression(out, form, &expr[2]);
        out.push(':');
        if expr.len() > 3 {
            self.expression(out, form, &expr[3]);
        }
        if expr.len() == 5 {
            out.push(':');
            self.expression(out, form, &expr[4]);
        }
        out.push(']');
    }

    fn assert_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() != 3 {
            self.error_form(form, "invalid type assertion");
            return;
        }
        self.expression(out, form, &expr[1]);
        out.push_str(".(");
        self.type_form(out, form, &expr[2]);
        out.push(')');
    }

    fn convert_expression(&mut self, out: &mut String, form: PairId) {
        let expr = self.heap().list_to_vec(&Value::Pair(form));
        if expr.len() != 3 {
            self.error_form(form, "invalid type conversion");
            return;
        }
        out.push('(');
        self.type_form(out, form, &expr[2]);
        out.push_str(")(");
        self.expression(out, form, &expr[1]);
        out.push(')');
    }
}
