// Slick Reader
//
// A table-driven reader in the Common Lisp tradition: scanning is done
// rune by rune, and composite syntax is delegated to reader-macro
// functions looked up in the active read table. Differences from the
// Lisp ancestry:
//   - No read-time evaluation and no case conversion.
//   - Number and string syntax follow Go, except that floats cannot
//     start with a dot (every number starts with a digit).
//   - Backquote, comma, and comma-at are plain shorthand for the
//     quasiquote/unquote/unquote-splicing forms; substitution happens in
//     the translator, not here.
//   - Identifiers are a superset of Go identifiers; special runes are
//     fine for compile-time names such as macros. Identifiers starting
//     with an underscore (other than the bare placeholder) are reserved
//     for gensyms and rejected.
//
// The reader records a byte range for every pair it produces and never
// aborts on a single error: it records a diagnostic, substitutes a bad
// form, and keeps scanning.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use num_bigint::BigInt;
use num_complex::Complex64;
use once_cell::sync::Lazy;

use crate::heap::Heap;
use crate::packages::PackageResolver;
use crate::position::{ErrorList, FileMap};
use crate::readtable::Table;
use crate::symbol::{Interner, SymbolId, KEYWORD_PACKAGE};
use crate::types::{PairId, Span, Value};

const BOM: char = '\u{feff}';

/// The standard read table: lists, quotation shorthand, strings, line
/// comments, and the `#` dispatch family (raw strings, runes, form
/// comments, block comments).
pub static STANDARD_TABLE: Lazy<Table> = Lazy::new(standard_table);

pub fn standard_table() -> Table {
    let mut t = Table::new();
    t.set_macro_rune('(', list_macro, true);
    t.set_macro_rune(')', error_macro, true);
    t.set_macro_rune('\'', quote_macro, true);
    t.set_macro_rune('`', quasiquote_macro, true);
    t.set_macro_rune(',', unquote_macro, true);
    t.set_macro_rune(';', line_comment_macro, true);
    t.set_macro_rune('"', string_macro, true);
    t.make_dispatch_macro_rune('#', false);
    t.set_dispatch_macro_rune('#', '`', raw_string_macro);
    t.set_dispatch_macro_rune('#', '\\', rune_macro);
    t.set_dispatch_macro_rune('#', ';', form_comment_macro);
    t.set_dispatch_macro_rune('#', '|', block_comment_macro);
    t
}

enum Step {
    Form(Value),
    Skip,
    Eof,
}

pub struct Reader<'a> {
    interner: &'a Interner,
    table: &'a Table,
    pub resolver: PackageResolver,
    pub heap: Heap,
    pub errors: ErrorList,
    file: FileMap,
    src: Vec<u8>,
    ranges: HashMap<PairId, Span>,
    ch: Option<char>,
    offset: usize,
    rd_offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(
        interner: &'a Interner,
        filename: &str,
        src: Vec<u8>,
        table: Option<&'a Table>,
    ) -> Self {
        let size = src.len();
        let mut rd = Self {
            interner,
            table: table.unwrap_or(&STANDARD_TABLE),
            resolver: PackageResolver::new(),
            heap: Heap::new(),
            errors: ErrorList::new(),
            file: FileMap::new(filename, size),
            src,
            ranges: HashMap::new(),
            ch: Some(' '),
            offset: 0,
            rd_offset: 0,
        };
        rd.next_rune();
        // A byte order mark is only legal as the very first rune.
        if rd.ch == Some(BOM) {
            rd.next_rune();
        }
        rd
    }

    pub fn from_source(interner: &'a Interner, filename: &str, src: &str) -> Self {
        Self::new(interner, filename, src.as_bytes().to_vec(), None)
    }

    pub fn from_file(interner: &'a Interner, path: &Path) -> io::Result<Self> {
        let src = std::fs::read(path)?;
        Ok(Self::new(interner, &path.display().to_string(), src, None))
    }

    pub fn interner(&self) -> &'a Interner {
        self.interner
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn file(&self) -> &FileMap {
        &self.file
    }

    pub fn src(&self) -> &[u8] {
        &self.src
    }

    pub fn rune(&self) -> Option<char> {
        self.ch
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Record the byte range a composite form was read from.
    pub fn add_form(&mut self, form: PairId, from: usize, to: usize) {
        self.ranges.insert(form, Span::new(from, to));
    }

    pub fn form_span(&self, form: PairId) -> Option<Span> {
        self.ranges.get(&form).copied()
    }

    pub fn error(&mut self, offset: usize, msg: &str) {
        let pos = self.file.position(offset);
        self.errors.add(pos, msg);
    }

    pub fn bad_form(&self, from: usize, to: usize) -> Value {
        Value::Bad(Span::new(from, to))
    }

    /// Advance to the next rune, reporting NUL bytes, invalid UTF-8, and
    /// misplaced byte order marks as errors.
    pub fn next_rune(&mut self) -> Option<char> {
        if self.rd_offset < self.src.len() {
            self.offset = self.rd_offset;
            if self.ch == Some('\n') {
                self.file.add_line(self.offset);
            }
            let b = self.src[self.rd_offset];
            let (r, w) = if b < 0x80 {
                if b == 0 {
                    self.error(self.offset, "illegal rune NUL");
                }
                (b as char, 1)
            } else {
                match decode_rune(&self.src[self.rd_offset..]) {
                    Some((r, w)) => {
                        if r == BOM && self.offset > 0 {
                            self.error(self.offset, "illegal byte order mark");
                        }
                        (r, w)
                    }
                    None => {
                        self.error(self.offset, "illegal UTF-8 encoding");
                        (char::REPLACEMENT_CHARACTER, 1)
                    }
                }
            };
            self.rd_offset += w;
            self.ch = Some(r);
            Some(r)
        } else {
            self.offset = self.src.len();
            if self.ch == Some('\n') {
                self.file.add_line(self.offset);
            }
            self.ch = None;
            None
        }
    }

    pub fn skip_space(&mut self) {
        while let Some(r) = self.ch {
            if !r.is_whitespace() {
                break;
            }
            self.next_rune();
        }
    }

    /// Read one form. Absent at end of input.
    pub fn read(&mut self) -> Option<Value> {
        loop {
            match self.try_read_form() {
                Step::Form(v) => return Some(v),
                Step::Skip => continue,
                Step::Eof => return None,
            }
        }
    }

    /// Read every remaining form.
    pub fn read_all(&mut self) -> Vec<Value> {
        let mut forms = Vec::new();
        while let Some(form) = self.read() {
            forms.push(form);
        }
        forms
    }

    fn try_read_form(&mut self) -> Step {
        self.skip_space();
        let r = match self.ch {
            None => return Step::Eof,
            Some(r) => r,
        };
        if let (Some(f), _) = self.table.get_macro_rune(r) {
            return match f(self) {
                Some(v) => Step::Form(v),
                None => Step::Skip,
            };
        }
        if self.table.is_dispatch_rune(r) {
            let offset = self.offset;
            self.next_rune();
            let sub = match self.ch {
                None => return Step::Eof,
                Some(s) => s,
            };
            if let Some(f) = self.table.get_dispatch_macro_rune(r, sub) {
                return match f(self, r, offset) {
                    Some(v) => Step::Form(v),
                    None => Step::Skip,
                };
            }
            self.error(
                offset,
                &format!("subrune {:?} not defined for dispatch rune {:?}", sub, r),
            );
            self.next_rune();
            return Step::Skip;
        }
        if is_digit(r) {
            return Step::Form(self.read_number());
        }
        if valid_rune(r) {
            return Step::Form(self.read_symbol());
        }
        self.error(self.offset, "invalid rune");
        self.next_rune();
        Step::Skip
    }

    /// Read forms up to the delimiter and return them as a proper list.
    pub fn read_delimited_list(&mut self, delimiter: char) -> Value {
        let offset = self.offset;
        self.next_rune();
        let mut elements = Vec::new();
        loop {
            self.skip_space();
            if self.ch == Some(delimiter) {
                self.next_rune();
                let result = self.heap.list(&elements);
                if let Value::Pair(id) = result {
                    self.add_form(id, offset, self.offset);
                }
                return result;
            }
            match self.try_read_form() {
                Step::Form(v) => elements.push(v),
                Step::Skip => {}
                Step::Eof => {
                    self.error(offset, "incomplete list");
                    return self.bad_form(offset, self.offset);
                }
            }
        }
    }

    fn wrap_in(&mut self, head: &str, offset: usize, what: &str) -> Option<Value> {
        match self.read() {
            None => {
                self.error(offset, &format!("incomplete {}", what));
                Some(self.bad_form(offset, self.offset))
            }
            Some(element) => {
                let sym = Value::Symbol(self.interner.intern("", head));
                let result = self.heap.list(&[sym, element]);
                if let Value::Pair(id) = result {
                    self.add_form(id, offset, self.offset);
                }
                Some(result)
            }
        }
    }

    fn read_hex_digits(&mut self, n: usize) -> Option<u32> {
        let mut result = 0;
        for _ in 0..n {
            let d = match self.ch.and_then(|r| r.to_digit(16)) {
                Some(d) => d,
                None => {
                    self.error(self.offset, "invalid hex digit");
                    return None;
                }
            };
            result = result << 4 | d;
            self.next_rune();
        }
        Some(result)
    }

    fn read_octal_byte(&mut self) -> Option<u32> {
        let mut result = 0;
        for _ in 0..3 {
            let d = match self.ch.and_then(|r| r.to_digit(8)) {
                Some(d) => d,
                None => {
                    self.error(self.offset, "invalid octal digit");
                    return None;
                }
            };
            result = result << 3 | d;
            self.next_rune();
        }
        if result > 0xff {
            self.error(self.offset, "octal escape value > 255");
            return None;
        }
        Some(result)
    }

    fn checked_rune(&mut self, dispatch_offset: usize, value: u32) -> Value {
        match char::from_u32(value) {
            Some(c) => Value::Rune(c),
            None => {
                self.error(dispatch_offset, "invalid rune literal");
                self.bad_form(dispatch_offset, self.offset)
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut buf = String::new();
        while let Some(r) = self.ch {
            if !valid_rune(r) || r == ':' || self.table.is_terminating(r) {
                break;
            }
            buf.push(r);
            self.next_rune();
        }
        buf
    }

    fn read_symbol(&mut self) -> Value {
        let offset = self.offset;
        let mut ok = true;
        let pkg = self.read_identifier();
        if pkg != "_" && pkg.starts_with('_') {
            self.error(offset, "invalid package name or identifier");
            ok = false;
        }
        if self.ch != Some(':') {
            if pkg.is_empty() {
                self.error(offset, "empty identifier");
                ok = false;
            }
            if ok {
                return Value::Symbol(self.interner.intern("", &pkg));
            }
            return self.bad_form(offset, self.offset);
        }
        let pkg = if pkg.is_empty() {
            KEYWORD_PACKAGE.to_string()
        } else {
            pkg
        };
        self.next_rune();
        let ident = self.read_identifier();
        if self.ch == Some(':') {
            self.error(offset, "invalid package prefix");
            ok = false;
        } else if ident.is_empty() {
            self.error(offset, "empty identifier");
            ok = false;
        }
        if ident != "_" && ident.starts_with('_') {
            self.error(offset, "invalid identifier");
            ok = false;
        }
        if ok {
            match self.resolver.resolve_symbol(self.interner, &pkg, &ident) {
                Ok(sym) => return Value::Symbol(sym),
                Err(err) => self.error(offset, &err.to_string()),
            }
        }
        self.bad_form(offset, self.offset)
    }

    fn read_number(&mut self) -> Value {
        let offset = self.offset;
        let mut buf = String::new();
        let mut prev = '\0';
        while let Some(r) = self.ch {
            if !is_num_rune(r) {
                break;
            }
            // Signs only belong to exponents.
            if (r == '+' || r == '-') && !matches!(prev, 'e' | 'E' | 'p' | 'P') {
                break;
            }
            buf.push(r);
            prev = r;
            self.next_rune();
        }
        if self.ch == Some('i') {
            self.next_rune();
            return match parse_float(&buf) {
                Some(v) => Value::Complex(Complex64::new(0.0, v)),
                None => {
                    self.error(offset, "invalid number syntax");
                    self.bad_form(offset, self.offset)
                }
            };
        }
        let hex = buf.starts_with("0x") || buf.starts_with("0X");
        let is_float = buf.contains('.')
            || (!hex && (buf.contains('e') || buf.contains('E')))
            || (hex && (buf.contains('p') || buf.contains('P')));
        if is_float {
            return match parse_float(&buf) {
                Some(v) => Value::Float(v),
                None => {
                    self.error(offset, "invalid number syntax");
                    self.bad_form(offset, self.offset)
                }
            };
        }
        match parse_big_int(&buf) {
            Some(v) => Value::Int(v),
            None => {
                self.error(offset, "invalid number syntax");
                self.bad_form(offset, self.offset)
            }
        }
    }
}

// Standard reader macros. Every macro either returns the form it read (a
// bad form when scanning failed) or nothing after consuming a comment.

/// Handler for stray delimiters such as `)`.
pub fn error_macro(rd: &mut Reader) -> Option<Value> {
    let offset = rd.offset;
    if let Some(r) = rd.rune() {
        rd.error(offset, &format!("invalid macro rune {:?}", r));
    }
    rd.next_rune();
    Some(rd.bad_form(offset, rd.offset))
}

fn list_macro(rd: &mut Reader) -> Option<Value> {
    Some(rd.read_delimited_list(')'))
}

fn quote_macro(rd: &mut Reader) -> Option<Value> {
    let offset = rd.offset;
    rd.next_rune();
    rd.wrap_in("quote", offset, "quote")
}

fn quasiquote_macro(rd: &mut Reader) -> Option<Value> {
    let offset = rd.offset;
    rd.next_rune();
    rd.wrap_in("quasiquote", offset, "quasiquote")
}

fn unquote_macro(rd: &mut Reader) -> Option<Value> {
    let offset = rd.offset;
    let splicing = rd.next_rune() == Some('@');
    if splicing {
        rd.next_rune();
        rd.wrap_in("unquote-splicing", offset, "unquote")
    } else {
        rd.wrap_in("unquote", offset, "unquote")
    }
}

fn line_comment_macro(rd: &mut Reader) -> Option<Value> {
    loop {
        match rd.next_rune() {
            None => return None,
            Some('\n') => {
                rd.next_rune();
                return None;
            }
            Some(_) => {}
        }
    }
}

fn string_macro(rd: &mut Reader) -> Option<Value> {
    let offset = rd.offset;
    let delim = rd.rune()?;
    let mut result = String::new();
    rd.next_rune();
    loop {
        let r = match rd.rune() {
            None | Some('\n') => {
                rd.error(offset, "incomplete string literal");
                rd.next_rune();
                return Some(rd.bad_form(offset, rd.offset));
            }
            Some(r) => r,
        };
        if r == delim {
            rd.next_rune();
            return Some(Value::Str(result));
        }
        if r != '\\' {
            result.push(r);
            rd.next_rune();
            continue;
        }
        let escape_offset = rd.offset;
        match rd.next_rune() {
            None => {
                rd.error(escape_offset, "incomplete escape in string literal");
                return Some(rd.bad_form(offset, rd.offset));
            }
            Some('a') => {
                result.push('\x07');
                rd.next_rune();
            }
            Some('b') => {
                result.push('\x08');
                rd.next_rune();
            }
            Some('f') => {
                result.push('\x0c');
                rd.next_rune();
            }
            Some('n') => {
                result.push('\n');
                rd.next_rune();
            }
            Some('r') => {
                result.push('\r');
                rd.next_rune();
            }
            Some('t') => {
                result.push('\t');
                rd.next_rune();
            }
            Some('v') => {
                result.push('\x0b');
                rd.next_rune();
            }
            Some('\\') => {
                result.push('\\');
                rd.next_rune();
            }
            Some('"') => {
                result.push('"');
                rd.next_rune();
            }
            Some('x') => {
                rd.next_rune();
                if let Some(b) = rd.read_hex_digits(2) {
                    // A byte escape denotes the code point of the same value.
                    result.push(char::from_u32(b).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
            Some('0'..='7') => {
                if let Some(b) = rd.read_octal_byte() {
                    result.push(char::from_u32(b).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
            Some('u') => {
                rd.next_rune();
                if let Some(u) = rd.read_hex_digits(4) {
                    match char::from_u32(u) {
                        Some(c) => result.push(c),
                        None => rd.error(escape_offset, "invalid rune in string literal"),
                    }
                }
            }
            Some('U') => {
                rd.next_rune();
                if let Some(u) = rd.read_hex_digits(8) {
                    match char::from_u32(u) {
                        Some(c) => result.push(c),
                        None => rd.error(escape_offset, "invalid rune in string literal"),
                    }
                }
            }
            Some(_) => {
                rd.error(escape_offset, "invalid escape in string literal");
                rd.next_rune();
            }
        }
    }
}

fn raw_string_macro(rd: &mut Reader, _disp: char, dispatch_offset: usize) -> Option<Value> {
    let delim = rd.rune()?;
    let mut result = String::new();
    loop {
        match rd.next_rune() {
            None => {
                rd.error(dispatch_offset, "incomplete raw string literal");
                return Some(rd.bad_form(dispatch_offset, rd.offset));
            }
            Some(r) if r == delim => {
                rd.next_rune();
                return Some(Value::Str(result));
            }
            // Carriage returns are dropped from raw strings.
            Some('\r') => {}
            Some(r) => result.push(r),
        }
    }
}

fn rune_macro(rd: &mut Reader, _disp: char, dispatch_offset: usize) -> Option<Value> {
    let r = match rd.next_rune() {
        None => {
            rd.error(dispatch_offset, "incomplete rune literal");
            return Some(rd.bad_form(dispatch_offset, rd.offset));
        }
        Some(r) => r,
    };
    if r != '\\' {
        rd.next_rune();
        return Some(Value::Rune(r));
    }
    match rd.next_rune() {
        None => {
            rd.error(dispatch_offset, "incomplete rune literal");
        }
        Some('a') => {
            rd.next_rune();
            return Some(Value::Rune('\x07'));
        }
        Some('b') => {
            rd.next_rune();
            return Some(Value::Rune('\x08'));
        }
        Some('f') => {
            rd.next_rune();
            return Some(Value::Rune('\x0c'));
        }
        Some('n') => {
            rd.next_rune();
            return Some(Value::Rune('\n'));
        }
        Some('r') => {
            rd.next_rune();
            return Some(Value::Rune('\r'));
        }
        Some('s') => {
            rd.next_rune();
            return Some(Value::Rune(' '));
        }
        Some('t') => {
            rd.next_rune();
            return Some(Value::Rune('\t'));
        }
        Some('v') => {
            rd.next_rune();
            return Some(Value::Rune('\x0b'));
        }
        Some('\\') => {
            rd.next_rune();
            return Some(Value::Rune('\\'));
        }
        Some('\'') => {
            rd.next_rune();
            return Some(Value::Rune('\''));
        }
        Some('x') => {
            rd.next_rune();
            if let Some(b) = rd.read_hex_digits(2) {
                return Some(rd.checked_rune(dispatch_offset, b));
            }
        }
        Some('0'..='7') => {
            if let Some(b) = rd.read_octal_byte() {
                return Some(rd.checked_rune(dispatch_offset, b));
            }
        }
        Some('u') => {
            rd.next_rune();
            if let Some(u) = rd.read_hex_digits(4) {
                return Some(rd.checked_rune(dispatch_offset, u));
            }
        }
        Some('U') => {
            rd.next_rune();
            if let Some(u) = rd.read_hex_digits(8) {
                return Some(rd.checked_rune(dispatch_offset, u));
            }
        }
        Some(_) => {
            rd.error(dispatch_offset, "invalid escape in rune literal");
            rd.next_rune();
        }
    }
    Some(rd.bad_form(dispatch_offset, rd.offset))
}

fn form_comment_macro(rd: &mut Reader, _disp: char, dispatch_offset: usize) -> Option<Value> {
    rd.next_rune();
    match rd.read() {
        None => {
            rd.error(dispatch_offset, "incomplete form comment");
            Some(rd.bad_form(dispatch_offset, rd.offset))
        }
        Some(_) => None,
    }
}

fn block_comment_macro(rd: &mut Reader, disp: char, dispatch_offset: usize) -> Option<Value> {
    let c1 = disp;
    let c2 = match rd.rune() {
        None => return None,
        Some(c) => c,
    };
    rd.next_rune();
    let mut level = 1;
    loop {
        match rd.rune() {
            None => {
                rd.error(dispatch_offset, "incomplete block comment");
                return Some(rd.bad_form(dispatch_offset, rd.offset));
            }
            Some(r) if r == c1 => {
                if rd.next_rune() == Some(c2) {
                    rd.next_rune();
                    level += 1;
                }
            }
            Some(r) if r == c2 => {
                if rd.next_rune() == Some(c1) {
                    rd.next_rune();
                    level -= 1;
                    if level == 0 {
                        return None;
                    }
                }
            }
            Some(_) => {
                rd.next_rune();
            }
        }
    }
}

// Rune classification and number parsing.

fn is_digit(r: char) -> bool {
    r.is_ascii_digit() || (r as u32 >= 0x80 && r.is_numeric())
}

/// Identifier runes: printable ASCII plus any letter or digit.
fn valid_rune(r: char) -> bool {
    ('!'..='~').contains(&r) || r.is_alphabetic() || r.is_numeric()
}

fn is_num_rune(r: char) -> bool {
    r.is_ascii_digit()
        || r.is_ascii_hexdigit()
        || matches!(r, '_' | '.' | '+' | '-' | 'o' | 'O' | 'x' | 'X' | 'p' | 'P')
}

fn parse_big_int(text: &str) -> Option<BigInt> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let (radix, rest) = if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, rest)
    } else if let Some(rest) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        (8, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits.as_str())
    };
    if rest.is_empty() {
        return None;
    }
    BigInt::parse_bytes(rest.as_bytes(), radix)
}

fn parse_float(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return parse_hex_float(rest);
    }
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Hex floats (0x1.8p3) are not understood by the standard float parser.
fn parse_hex_float(s: &str) -> Option<f64> {
    let pi = s.find(['p', 'P'])?;
    let (mantissa, exponent) = (&s[..pi], &s[pi + 1..]);
    let exponent: i32 = exponent.parse().ok()?;
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += c.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exponent))
}

fn decode_rune(bytes: &[u8]) -> Option<(char, usize)> {
    let upto = bytes.len().min(4);
    match std::str::from_utf8(&bytes[..upto]) {
        Ok(s) => {
            let c = s.chars().next()?;
            Some((c, c.len_utf8()))
        }
        Err(e) if e.valid_up_to() > 0 => {
            let s = std::str::from_utf8(&bytes[..e.valid_up_to()]).ok()?;
            let c = s.chars().next()?;
            Some((c, c.len_utf8()))
        }
        Err(_) => None,
    }
}

/// The classified top level of one source file.
#[derive(Default)]
pub struct SourceFile {
    pub package_clause: Option<PairId>,
    pub import_declarations: Vec<PairId>,
    pub use_declarations: Vec<PairId>,
    pub top_level_declarations: Vec<PairId>,
}

impl<'a> Reader<'a> {
    fn head_symbol(&self, form: PairId) -> Option<SymbolId> {
        self.heap.car_ref(form).as_symbol()
    }

    /// Read a whole source file: exactly one package clause, then import
    /// declarations, then use declarations, then the remaining top-level
    /// forms.
    pub fn read_source_file(&mut self) -> SourceFile {
        let pkg = self.interner.intern("", "package");
        let imp = self.interner.intern("", "import");
        let uze = self.interner.intern("", "use");

        let mut result = SourceFile::default();
        self.skip_space();
        let offset = self.offset;
        match self.read() {
            Some(Value::Pair(id)) if self.head_symbol(id) == Some(pkg) => {
                result.package_clause = Some(id);
            }
            _ => self.error(offset, "missing package clause"),
        }

        let mut element = self.read();
        let take = |rd: &mut Self, element: &mut Option<Value>, want: Option<SymbolId>| {
            let mut forms = Vec::new();
            loop {
                match element {
                    Some(Value::Pair(id)) => {
                        let id = *id;
                        match want {
                            Some(sym) if rd.head_symbol(id) != Some(sym) => break,
                            _ => {}
                        }
                        forms.push(id);
                        *element = rd.read();
                    }
                    _ => break,
                }
            }
            forms
        };
        result.import_declarations = take(self, &mut element, Some(imp));
        result.use_declarations = take(self, &mut element, Some(uze));
        result.top_level_declarations = take(self, &mut element, None);
        if element.is_some() {
            let offset = self.offset;
            self.error(offset, "invalid top level form");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_to_string;

    fn read_one(interner: &Interner, src: &str) -> (Value, usize) {
        let mut rd = Reader::from_source(interner, "test.slick", src);
        let form = rd.read().expect("expected a form");
        (form, rd.errors.len())
    }

    #[test]
    fn test_read_integers() {
        let interner = Interner::new();
        for (src, expected) in [
            ("42", 42i64),
            ("0b101", 5),
            ("0o17", 15),
            ("017", 15),
            ("0xff", 255),
            ("1_000", 1000),
        ] {
            let (form, errors) = read_one(&interner, src);
            assert_eq!(errors, 0, "{}", src);
            assert_eq!(form, Value::Int(BigInt::from(expected)), "{}", src);
        }
    }

    #[test]
    fn test_read_hex_with_letter_digits() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "0xBad_Face");
        assert_eq!(errors, 0);
        assert_eq!(form, Value::Int(BigInt::from(0xBadFaceu32)));
    }

    #[test]
    fn test_read_floats() {
        let interner = Interner::new();
        let (form, _) = read_one(&interner, "1.5e2");
        assert_eq!(form, Value::Float(150.0));
        let (form, _) = read_one(&interner, "0x1p-2");
        assert_eq!(form, Value::Float(0.25));
        let (form, _) = read_one(&interner, "2.5");
        assert_eq!(form, Value::Float(2.5));
    }

    #[test]
    fn test_read_imaginary() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "3i");
        assert_eq!(errors, 0);
        assert_eq!(form, Value::Complex(Complex64::new(0.0, 3.0)));
    }

    #[test]
    fn test_read_invalid_number() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "0b2");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_read_strings() {
        let interner = Interner::new();
        let (form, _) = read_one(&interner, r#""\n""#);
        assert_eq!(form, Value::Str("\n".to_string()));
        let (form, _) = read_one(&interner, r#""a\x41b""#);
        assert_eq!(form, Value::Str("aAb".to_string()));
        let (form, _) = read_one(&interner, r#""é""#);
        assert_eq!(form, Value::Str("\u{e9}".to_string()));
        let (form, _) = read_one(&interner, r#""\101""#);
        assert_eq!(form, Value::Str("A".to_string()));
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        let interner = Interner::new();
        let (form, _) = read_one(&interner, "#`\\n`");
        assert_eq!(form, Value::Str("\\n".to_string()));
        let (form, _) = read_one(&interner, "#`a\r\nb`");
        assert_eq!(form, Value::Str("a\nb".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "\"abc\nd\"");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_read_runes() {
        let interner = Interner::new();
        let (form, _) = read_one(&interner, "#\\a");
        assert_eq!(form, Value::Rune('a'));
        let (form, _) = read_one(&interner, "#\\\\n");
        assert_eq!(form, Value::Rune('\n'));
        let (form, _) = read_one(&interner, "#\\\\s");
        assert_eq!(form, Value::Rune(' '));
        let (form, _) = read_one(&interner, "#\\\\x41");
        assert_eq!(form, Value::Rune('A'));
        let (form, _) = read_one(&interner, "#\\\\u00e9");
        assert_eq!(form, Value::Rune('\u{e9}'));
    }

    #[test]
    fn test_rune_does_not_swallow_next_form() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "(#\\a #\\b)");
        let form = rd.read().unwrap();
        let id = form.as_pair().unwrap();
        let elements = rd.heap.list_to_vec(&Value::Pair(id));
        assert_eq!(elements, vec![Value::Rune('a'), Value::Rune('b')]);
        assert!(rd.errors.is_empty());
    }

    #[test]
    fn test_read_symbols() {
        let interner = Interner::new();
        let (form, _) = read_one(&interner, "foo");
        assert_eq!(form, Value::Symbol(interner.intern("", "foo")));
        let (form, _) = read_one(&interner, ":type");
        assert_eq!(form, Value::Symbol(interner.intern(KEYWORD_PACKAGE, "type")));
        let (form, _) = read_one(&interner, "_");
        assert_eq!(form, Value::Symbol(interner.intern("", "_")));
    }

    #[test]
    fn test_reserved_underscore_identifiers() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "_gensym");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_unknown_package_is_resolution_error() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "math:Sin");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_known_package_resolves_to_path() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "m:Sin");
        rd.resolver.bind("m", "lib/math");
        let form = rd.read().unwrap();
        assert_eq!(form, Value::Symbol(interner.intern("lib/math", "Sin")));
    }

    #[test]
    fn test_read_list_and_ranges() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "(a (b c) 42)");
        let form = rd.read().unwrap();
        let outer = form.as_pair().unwrap();
        let outer_span = rd.form_span(outer).unwrap();
        assert_eq!(outer_span.start, 0);
        assert_eq!(outer_span.end, 12);

        let inner = rd.heap.second(&form).unwrap().as_pair().unwrap();
        let inner_span = rd.form_span(inner).unwrap();
        assert!(outer_span.contains(&inner_span));
        assert_eq!(&rd.src()[inner_span.start..inner_span.end], b"(b c)");
    }

    #[test]
    fn test_read_empty_list() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "()");
        assert_eq!(form, Value::Nil);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_incomplete_list() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, "(a b");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_stray_close_paren() {
        let interner = Interner::new();
        let (form, errors) = read_one(&interner, ")");
        assert!(matches!(form, Value::Bad(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_quote_family() {
        let interner = Interner::new();
        for (src, head) in [
            ("'x", "quote"),
            ("`x", "quasiquote"),
            (",x", "unquote"),
            (",@x", "unquote-splicing"),
        ] {
            let mut rd = Reader::from_source(&interner, "t", src);
            let form = rd.read().unwrap();
            let id = form.as_pair().unwrap();
            assert_eq!(
                rd.heap.car_ref(id).as_symbol(),
                Some(interner.intern("", head)),
                "{}",
                src
            );
            assert_eq!(rd.heap.length(&form), 2);
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(
            &interner,
            "t",
            "; line comment\n#| block #| nested |# comment |# #;(discarded form) 42",
        );
        assert_eq!(rd.read(), Some(Value::Int(BigInt::from(42))));
        assert!(rd.errors.is_empty());
    }

    #[test]
    fn test_comment_before_close_paren() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "(a ; trailing\n)");
        let form = rd.read().unwrap();
        assert_eq!(rd.heap.length(&form), 1);
        assert!(rd.errors.is_empty());
    }

    #[test]
    fn test_unbalanced_block_comments() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "#| one #| two ");
        assert!(matches!(rd.read(), Some(Value::Bad(_))));
        assert_eq!(rd.errors.len(), 1);
    }

    #[test]
    fn test_nul_is_error() {
        let interner = Interner::new();
        let mut rd = Reader::new(&interner, "t", b"a\x00b".to_vec(), None);
        rd.read_all();
        assert_eq!(rd.errors.len(), 1);
    }

    #[test]
    fn test_bom_only_at_start() {
        let interner = Interner::new();
        let mut src = vec![0xef, 0xbb, 0xbf];
        src.extend_from_slice(b"42");
        let mut rd = Reader::new(&interner, "t", src, None);
        assert_eq!(rd.read(), Some(Value::Int(BigInt::from(42))));
        assert!(rd.errors.is_empty());

        let mut src = b"4".to_vec();
        src.extend_from_slice(&[0xef, 0xbb, 0xbf]);
        let mut rd = Reader::new(&interner, "t", src, None);
        rd.read_all();
        assert_eq!(rd.errors.len(), 1);
    }

    #[test]
    fn test_positions_track_lines() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "a\nb\n  )");
        rd.read_all();
        assert_eq!(rd.errors.len(), 1);
        let pos = &rd.errors.last().unwrap().pos;
        assert_eq!((pos.line, pos.column), (3, 3));
    }

    #[test]
    fn test_reprint_round_trip() {
        let interner = Interner::new();
        let sources = [
            "(a b c)",
            "(a (b (c)) 1 2.5 \"s\\n\" #\\x :key)",
            "'(1 ,x ,@ys)",
            "()",
        ];
        for src in sources {
            let mut rd1 = Reader::from_source(&interner, "t", src);
            let form1 = rd1.read().unwrap();
            assert!(rd1.errors.is_empty(), "{}", src);
            let printed = print_to_string(&rd1.heap, &interner, &form1);

            let mut rd2 = Reader::from_source(&interner, "t", &printed);
            let form2 = rd2.read().unwrap();
            assert!(rd2.errors.is_empty(), "{} -> {}", src, printed);
            let reprinted = print_to_string(&rd2.heap, &interner, &form2);
            assert_eq!(printed, reprinted, "{}", src);
        }
    }

    #[test]
    fn test_read_source_file_sections() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(
            &interner,
            "t",
            "(package main)\n(import \"fmt\")\n(use \"mac\")\n(func main () ())\n",
        );
        let file = rd.read_source_file();
        assert!(file.package_clause.is_some());
        assert_eq!(file.import_declarations.len(), 1);
        assert_eq!(file.use_declarations.len(), 1);
        assert_eq!(file.top_level_declarations.len(), 1);
        assert!(rd.errors.is_empty());
    }

    #[test]
    fn test_missing_package_clause() {
        let interner = Interner::new();
        let mut rd = Reader::from_source(&interner, "t", "(import \"fmt\")\n");
        let file = rd.read_source_file();
        assert!(file.package_clause.is_none());
        assert_eq!(rd.errors.len(), 1);
    }
}
