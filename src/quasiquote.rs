// Slick Core Plugin - Quotation
//
// The macro functions behind quote, quasiquote, unquote, and
// unquote-splicing. Quotation is compiled away: a quoted datum becomes an
// expression that rebuilds the datum at runtime against the companion
// list library, and quasiquotation lifts unquoted expressions into that
// reconstruction. Nesting is handled level by level: quasiquote raises
// the depth, unquote and unquote-splicing lower it, and substitution only
// happens at depth zero.

use crate::heap::Heap;
use crate::plugins::{Environment, MacroError};
use crate::symbol::Interner;
use crate::types::{PairId, Value};

/// Import path of the runtime library that owns symbol interning.
pub const LIB_PATH: &str = "github.com/exascience/slick/lib";

/// Import path of the runtime list library.
pub const LIST_PATH: &str = "github.com/exascience/slick/list";

pub fn quote(
    heap: &mut Heap,
    interner: &Interner,
    form: PairId,
    _env: &Environment,
) -> Result<Value, MacroError> {
    let operand = operand_of(heap, form)?;
    Ok(expand_quote(heap, interner, &operand))
}

pub fn quasiquote(
    heap: &mut Heap,
    interner: &Interner,
    form: PairId,
    _env: &Environment,
) -> Result<Value, MacroError> {
    let operand = operand_of(heap, form)?;
    expand_quasi(heap, interner, &operand, 0)
}

pub fn unquote(
    _heap: &mut Heap,
    _interner: &Interner,
    _form: PairId,
    _env: &Environment,
) -> Result<Value, MacroError> {
    Err(MacroError::new("unquote is only legal inside quasiquote"))
}

pub fn unquote_splicing(
    _heap: &mut Heap,
    _interner: &Interner,
    _form: PairId,
    _env: &Environment,
) -> Result<Value, MacroError> {
    Err(MacroError::new(
        "unquote-splicing is only legal inside quasiquote",
    ))
}

/// The single operand of a two-element form.
fn operand_of(heap: &Heap, form: PairId) -> Result<Value, MacroError> {
    let args = heap.list_to_vec(&Value::Pair(form));
    if args.len() != 2 {
        let name = match args.first() {
            Some(Value::Symbol(_)) => "quotation form",
            _ => "form",
        };
        return Err(MacroError::new(format!("{} takes exactly one operand", name)));
    }
    Ok(args[1].clone())
}

/// An expression calling into the runtime list library.
fn list_call(heap: &mut Heap, interner: &Interner, name: &str, args: Vec<Value>) -> Value {
    let mut call = vec![Value::Symbol(interner.intern(LIST_PATH, name))];
    call.extend(args);
    heap.list(&call)
}

/// An expression interning the given symbol at runtime.
fn intern_call(heap: &mut Heap, interner: &Interner, sym: &Value) -> Value {
    let id = sym.as_symbol().expect("interning a non-symbol");
    let data = interner.symbol(id);
    let f = Value::Symbol(interner.intern(LIB_PATH, "Intern"));
    heap.list(&[
        f,
        Value::Str(data.package.to_string()),
        Value::Str(data.identifier.to_string()),
    ])
}

/// The reconstruction expression for a constant datum. Self-evaluating
/// leaves stand for themselves; symbols become intern calls; pairs become
/// list-library constructor calls. The empty list stands for itself (the
/// translator already emits the list library's Nil for it).
fn expand_quote(heap: &mut Heap, interner: &Interner, datum: &Value) -> Value {
    match datum {
        Value::Symbol(_) => intern_call(heap, interner, datum),
        Value::Pair(_) => {
            let (elements, tail) = heap.spine(datum);
            let mut args = Vec::with_capacity(elements.len() + 1);
            for element in &elements {
                let expanded = expand_quote(heap, interner, element);
                args.push(expanded);
            }
            if tail.is_nil() {
                list_call(heap, interner, "List", args)
            } else {
                let expanded_tail = expand_quote(heap, interner, &tail);
                args.push(expanded_tail);
                list_call(heap, interner, "Cons", args)
            }
        }
        other => other.clone(),
    }
}

fn head_is(heap: &Heap, interner: &Interner, form: &Value, name: &str) -> bool {
    match form.as_pair() {
        Some(id) => heap.car_ref(id).as_symbol() == Some(interner.intern("", name)),
        None => false,
    }
}

/// Rebuild a quotation form as data, adjusting the depth for its operand.
fn reconstruct(
    heap: &mut Heap,
    interner: &Interner,
    name: &str,
    operand: &Value,
    depth: u32,
) -> Result<Value, MacroError> {
    let head_sym = Value::Symbol(interner.intern("", name));
    let head = intern_call(heap, interner, &head_sym);
    let inner = expand_quasi(heap, interner, operand, depth)?;
    Ok(list_call(heap, interner, "List", vec![head, inner]))
}

fn expand_quasi(
    heap: &mut Heap,
    interner: &Interner,
    datum: &Value,
    depth: u32,
) -> Result<Value, MacroError> {
    let id = match datum {
        Value::Pair(id) => *id,
        Value::Symbol(_) => return Ok(expand_quote(heap, interner, datum)),
        other => return Ok(other.clone()),
    };
    if head_is(heap, interner, datum, "unquote") {
        let operand = operand_of(heap, id)?;
        if depth == 0 {
            return Ok(operand);
        }
        return reconstruct(heap, interner, "unquote", &operand, depth - 1);
    }
    if head_is(heap, interner, datum, "unquote-splicing") {
        if depth == 0 {
            return Err(MacroError::new(
                "unquote-splicing is only legal inside a quasiquoted list",
            ));
        }
        let operand = operand_of(heap, id)?;
        return reconstruct(heap, interner, "unquote-splicing", &operand, depth - 1);
    }
    if head_is(heap, interner, datum, "quasiquote") {
        let operand = operand_of(heap, id)?;
        return reconstruct(heap, interner, "quasiquote", &operand, depth + 1);
    }
    expand_quasi_list(heap, interner, datum, depth)
}

enum Segment {
    Items(Vec<Value>),
    Splice(Value),
}

fn expand_quasi_list(
    heap: &mut Heap,
    interner: &Interner,
    datum: &Value,
    depth: u32,
) -> Result<Value, MacroError> {
    let (elements, tail) = heap.spine(datum);
    let mut segments: Vec<Segment> = Vec::new();
    let mut items: Vec<Value> = Vec::new();
    for element in &elements {
        if depth == 0 && head_is(heap, interner, element, "unquote-splicing") {
            let operand = operand_of(heap, element.as_pair().unwrap())?;
            if !items.is_empty() {
                segments.push(Segment::Items(std::mem::take(&mut items)));
            }
            segments.push(Segment::Splice(operand));
            continue;
        }
        let expanded = expand_quasi(heap, interner, element, depth)?;
        items.push(expanded);
    }
    let tail_expr = match &tail {
        Value::Nil => None,
        t => Some(expand_quasi(heap, interner, t, depth)?),
    };
    if segments.is_empty() {
        return Ok(match tail_expr {
            None => list_call(heap, interner, "List", items),
            Some(t) => {
                items.push(t);
                list_call(heap, interner, "Cons", items)
            }
        });
    }
    if tail_expr.is_some() {
        return Err(MacroError::new(
            "unquote-splicing cannot precede a dotted tail",
        ));
    }
    if !items.is_empty() {
        segments.push(Segment::Items(items));
    }
    let args = segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Items(vs) => list_call(heap, interner, "List", vs),
            Segment::Splice(e) => e,
        })
        .collect();
    Ok(list_call(heap, interner, "Append", args))
}
