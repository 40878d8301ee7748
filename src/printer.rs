// Slick Printer
//
// Renders form values back into read syntax: proper lists as (a b c),
// dotted lists as (a b . c), keywords with a leading colon. Any tree the
// reader accepted prints to text the reader accepts again, producing a
// structurally equal tree. Must not be called on circular structures.

use crate::heap::Heap;
use crate::symbol::Interner;
use crate::types::{PairId, Value};

pub struct Printer<'a> {
    heap: &'a Heap,
    interner: &'a Interner,
    out: String,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap, interner: &'a Interner) -> Self {
        Self {
            heap,
            interner,
            out: String::new(),
        }
    }

    pub fn print(&mut self, v: &Value) -> &str {
        self.print_value(v);
        &self.out
    }

    fn print_value(&mut self, v: &Value) {
        match v {
            Value::Nil => self.out.push_str("()"),
            Value::Symbol(id) => {
                let sym = self.interner.symbol(*id);
                self.out.push_str(&sym.to_string());
            }
            Value::Int(n) => self.out.push_str(&n.to_string()),
            // {:?} always renders a dot or an exponent, so the text scans
            // as a float again.
            Value::Float(f) => self.out.push_str(&format!("{:?}", f)),
            Value::Complex(c) => {
                if c.re == 0.0 {
                    self.out.push_str(&format!("{:?}i", c.im));
                } else {
                    self.out.push_str(&format!("#<complex {:?}+{:?}i>", c.re, c.im));
                }
            }
            Value::Rune(r) => self.out.push_str(&rune_literal(*r)),
            Value::Str(s) => self.out.push_str(&quote_string(s)),
            Value::Pair(id) => self.print_list(*id),
            Value::Bad(span) => {
                self.out
                    .push_str(&format!("#<bad-form {}..{}>", span.start, span.end));
            }
        }
    }

    fn print_list(&mut self, id: PairId) {
        self.out.push('(');
        let mut current = id;
        loop {
            let car = self.heap.car(current);
            self.print_value(&car);
            match self.heap.cdr(current) {
                Value::Pair(next) => {
                    self.out.push(' ');
                    current = next;
                }
                Value::Nil => break,
                tail => {
                    self.out.push_str(" . ");
                    self.print_value(&tail);
                    break;
                }
            }
        }
        self.out.push(')');
    }
}

/// Print a value to a string.
pub fn print_to_string(heap: &Heap, interner: &Interner, v: &Value) -> String {
    let mut printer = Printer::new(heap, interner);
    printer.print(v).to_string()
}

/// Quote a string with double quotes and the escape set the reader
/// understands. Also a syntactically valid Go string literal.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => push_escaped(&mut out, c),
        }
    }
    out.push('"');
    out
}

/// Quote a rune as a Go rune literal.
pub fn quote_rune(c: char) -> String {
    let mut out = String::new();
    out.push('\'');
    match c {
        '\'' => out.push_str("\\'"),
        '\\' => out.push_str("\\\\"),
        _ => push_escaped(&mut out, c),
    }
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '\x07' => out.push_str("\\a"),
        '\x08' => out.push_str("\\b"),
        '\x0c' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\x0b' => out.push_str("\\v"),
        c if !c.is_control() => out.push(c),
        c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
        c if (c as u32) <= 0xffff => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push_str(&format!("\\U{:08x}", c as u32)),
    }
}

/// The read syntax of a rune literal.
fn rune_literal(c: char) -> String {
    match c {
        '\x07' => "#\\\\a".to_string(),
        '\x08' => "#\\\\b".to_string(),
        '\x0c' => "#\\\\f".to_string(),
        '\n' => "#\\\\n".to_string(),
        '\r' => "#\\\\r".to_string(),
        '\t' => "#\\\\t".to_string(),
        '\x0b' => "#\\\\v".to_string(),
        ' ' => "#\\\\s".to_string(),
        '\'' => "#\\\\'".to_string(),
        '\\' => "#\\\\\\\\".to_string(),
        c if !c.is_control() => format!("#\\{}", c),
        c if (c as u32) <= 0xffff => format!("#\\\\u{:04x}", c as u32),
        c => format!("#\\\\U{:08x}", c as u32),
    }
}
