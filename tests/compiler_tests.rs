// Translator integration tests: whole-file translation scenarios.

use slick::quasiquote::{LIB_PATH, LIST_PATH};
use slick::symbol::KEYWORD_PACKAGE;
use slick::{
    translate, Environment, Heap, Interner, MacroError, PairId, PluginRegistry, Reader, Value,
};

fn translate_source(src: &str) -> Result<String, String> {
    let interner = Interner::new();
    let registry = PluginRegistry::new();
    translate_with(&interner, &registry, src)
}

fn translate_with(
    interner: &Interner,
    registry: &PluginRegistry,
    src: &str,
) -> Result<String, String> {
    let mut rd = Reader::from_source(interner, "test.slick", src);
    translate(&mut rd, registry).map_err(|errors| errors.to_string())
}

#[test]
fn minimal_program() {
    let output = translate_source(
        "(package main)\n\
         (import \"fmt\")\n\
         (func main () ()\n\
           (fmt:Println \"Hello, World!\"))\n",
    )
    .unwrap();
    assert!(output.starts_with("package main\n"), "{}", output);
    assert!(output.contains("import \"fmt\""), "{}", output);
    assert!(output.contains("func main ()"), "{}", output);
    assert!(output.contains("fmt.Println(\"Hello, World!\")"), "{}", output);
}

#[test]
fn named_import_and_automatic_enclosure() {
    let output = translate_source(
        "(package main)\n\
         (import (m \"lib/math\"))\n\
         (var (x := (m:Sin 1.0)))\n",
    )
    .unwrap();
    assert!(output.contains("m \"lib/math\""), "{}", output);
    assert!(output.contains("m.Sin(1.0)"), "{}", output);
    // Exactly one import line for the path.
    assert_eq!(output.matches("lib/math").count(), 1, "{}", output);
}

#[test]
fn unknown_package_is_an_error() {
    let err = translate_source(
        "(package main)\n\
         (var (x := (math:Sin 1.0)))\n",
    )
    .unwrap_err();
    assert!(err.contains("math:Sin"), "{}", err);
}

#[test]
fn quoted_import_emits_no_line_until_used() {
    // The quoted import is known but unused: no import line at all.
    let output = translate_source(
        "(package main)\n\
         (import (quote (m \"lib/math\")))\n\
         (var (x :type int))\n",
    )
    .unwrap();
    assert!(!output.contains("lib/math"), "{}", output);

    // Once a symbol needs the path, the enclosure emits its own line
    // under a fresh alias.
    let output = translate_source(
        "(package main)\n\
         (import (quote (m \"lib/math\")))\n\
         (var (x := (m:Sin 1.0)))\n",
    )
    .unwrap();
    assert!(output.contains("import math \"lib/math\""), "{}", output);
    assert!(output.contains("math.Sin(1.0)"), "{}", output);
}

#[test]
fn ambiguous_import_is_an_error() {
    let err = translate_source(
        "(package main)\n\
         (import \"lib/math\" (math \"other/math\"))\n",
    )
    .unwrap_err();
    assert!(err.contains("ambiguous import"), "{}", err);
}

#[test]
fn splice_is_transparent_at_top_level() {
    let plain = translate_source(
        "(package main)\n\
         (var (x := 1))\n\
         (func f () () (return))\n",
    )
    .unwrap();
    let spliced = translate_source(
        "(package main)\n\
         (splice (var (x := 1))\n\
                 (func f () () (return)))\n",
    )
    .unwrap();
    assert_eq!(plain, spliced);
}

#[test]
fn const_group_with_iota_repetition() {
    let output = translate_source(
        "(package main)\n\
         (const \"flag bits\" (a := 1) b c)\n",
    )
    .unwrap();
    assert!(output.contains("// flag bits"), "{}", output);
    assert!(output.contains("const (\n"), "{}", output);
    assert!(output.contains("a = 1\nb\nc\n"), "{}", output);
}

#[test]
fn missing_const_value_is_an_error() {
    let err = translate_source(
        "(package main)\n\
         (const (a :type int))\n",
    )
    .unwrap_err();
    assert!(err.contains("missing constant value"), "{}", err);
}

#[test]
fn var_with_docs_and_types() {
    let output = translate_source(
        "(package main)\n\
         (var ((x y) :type float64 :documentation \"coordinates\"))\n",
    )
    .unwrap();
    assert!(output.contains("// coordinates"), "{}", output);
    assert!(output.contains("var x, y float64"), "{}", output);
}

#[test]
fn type_declarations() {
    let output = translate_source(
        "(package main)\n\
         (type (point (struct ((x y) :type float64)\n\
                              (label :type string :tag \"json:\\\"label\\\"\"))))\n\
         (type-alias (row (slice point)))\n\
         (type (table (map string (* point))))\n\
         (type (source (chan point)) (sink (chan<- point)) (drain (<-chan point)))\n\
         (type (handler (func ((p point)) ((_ error)))))\n\
         (type (shape (interface (area () ((_ float64))) point)))\n",
    )
    .unwrap();
    assert!(output.contains("type point struct{\nx, y float64\n"), "{}", output);
    assert!(output.contains("label string `json:\"label\"`"), "{}", output);
    assert!(output.contains("type row = []point"), "{}", output);
    assert!(output.contains("type table map[string]*point"), "{}", output);
    assert!(output.contains("source chan point"), "{}", output);
    assert!(output.contains("sink chan<- point"), "{}", output);
    assert!(output.contains("drain <-chan point"), "{}", output);
    assert!(output.contains("handler func (p point) (_ error)"), "{}", output);
    assert!(output.contains("interface{\narea () (_ float64)\npoint\n}"), "{}", output);
}

#[test]
fn array_types_and_literals() {
    let output = translate_source(
        "(package main)\n\
         (var (a :type (array 4 int))\n\
              (b := (make-array (array ... int) 1 2 3))\n\
              (s := (make-slice (slice int) 4 5))\n\
              (m := (make-map (map string int) \"k\" 1))\n\
              (p := (make-struct point x 1 y 2))\n\
              (c := (make (chan int) 8)))\n",
    )
    .unwrap();
    assert!(output.contains("a [4]int"), "{}", output);
    assert!(output.contains("b = ([...]int{1, 2, 3, })"), "{}", output);
    assert!(output.contains("s = ([]int{4, 5, })"), "{}", output);
    assert!(output.contains("m = (map[string]int{\"k\": 1, })"), "{}", output);
    assert!(output.contains("p = (point{x: 1, y: 2, })"), "{}", output);
    assert!(output.contains("c = make(chan int, 8)"), "{}", output);
}

#[test]
fn function_shapes() {
    let output = translate_source(
        "(package main)\n\
         (func external ((x int)) ((_ int)))\n\
         (func ((p (* point))) Scale ((factor float64)) ()\n\
           (*= (slot p x) factor))\n\
         (func variadic ((xs ... int)) ((_ int))\n\
           (return (len xs)))\n",
    )
    .unwrap();
    assert!(output.contains("func external (x int) (_ int)"), "{}", output);
    assert!(output.contains("func (p *point) Scale (factor float64)"), "{}", output);
    assert!(output.contains("p.x *= factor"), "{}", output);
    assert!(output.contains("func variadic (xs ...int) (_ int)"), "{}", output);
    assert!(output.contains("return len(xs)"), "{}", output);
}

#[test]
fn statement_forms() {
    let output = translate_source(
        "(package main)\n\
         (func f ((items (slice int))) ((_ int))\n\
           (:= total 0)\n\
           (range (:= (i x) items)\n\
             (+= total (* i x)))\n\
           (for ((:= n 0) (< n 3) (++ n))\n\
             (if (== n 2) (continue) (-- total)))\n\
           (while (> total 100) (/= total 2))\n\
           (if* (:= v (probe)) v (= total v))\n\
           (switch total\n\
             ((1 2) (return 1))\n\
             (default (fallthrough)))\n\
           (type-switch x total\n\
             (int (return 2))\n\
             (default (return 3)))\n\
           (return total))\n",
    )
    .unwrap();
    assert!(output.contains("total := 0"), "{}", output);
    assert!(output.contains("for i, x := range items"), "{}", output);
    assert!(output.contains("total += (i * x)"), "{}", output);
    assert!(output.contains("for n := 0\n(n < 3); n++ {"), "{}", output);
    assert!(output.contains("for (total > 100)"), "{}", output);
    assert!(output.contains("if v := probe()"), "{}", output);
    assert!(output.contains("switch total {"), "{}", output);
    assert!(output.contains("case 1, 2:"), "{}", output);
    assert!(output.contains("fallthrough"), "{}", output);
    assert!(output.contains("x := total.(type) {"), "{}", output);
    assert!(output.contains("case int:"), "{}", output);
}

#[test]
fn select_and_concurrency_statements() {
    let output = translate_source(
        "(package main)\n\
         (func f ((ch (chan int)) (done (chan bool))) ()\n\
           (go (worker ch))\n\
           (defer (cleanup))\n\
           (-> ch 1)\n\
           (select\n\
             ((:= v (<- ch)) (use v))\n\
             ((-> done true) (return))\n\
             (default (return))))\n",
    )
    .unwrap();
    assert!(output.contains("go worker(ch)"), "{}", output);
    assert!(output.contains("defer cleanup()"), "{}", output);
    assert!(output.contains("ch <- 1"), "{}", output);
    assert!(output.contains("select {"), "{}", output);
    assert!(output.contains("case v := <-ch:"), "{}", output);
    assert!(output.contains("case done <- true:"), "{}", output);
    assert!(output.contains("default:"), "{}", output);
}

#[test]
fn labels_and_jumps() {
    let output = translate_source(
        "(package main)\n\
         (func f () ()\n\
           :outer\n\
           (loop\n\
             (break outer))\n\
           (goto outer))\n",
    )
    .unwrap();
    assert!(output.contains("outer:\n"), "{}", output);
    assert!(output.contains("break outer"), "{}", output);
    assert!(output.contains("goto outer"), "{}", output);
}

#[test]
fn expression_forms() {
    let output = translate_source(
        "(package main)\n\
         (func f ((xs (slice int)) (v (interface))) ()\n\
           (:= a (at xs 0))\n\
           (:= b (slice xs 1 3))\n\
           (:= c (slice xs 0 2 4))\n\
           (:= d (assert v int))\n\
           (:= e (convert a float64))\n\
           (:= (q r) (values 1 2))\n\
           (:= g (func ((x int)) ((_ int)) (return (+ x 1))))\n\
           (f xs (values) ...))\n",
    )
    .unwrap();
    assert!(output.contains("a := xs[0]"), "{}", output);
    assert!(output.contains("b := xs[1:3]"), "{}", output);
    assert!(output.contains("c := xs[0:2:4]"), "{}", output);
    assert!(output.contains("d := v.(int)"), "{}", output);
    assert!(output.contains("e := (float64)(a)"), "{}", output);
    assert!(output.contains("q, r := 1, 2"), "{}", output);
    assert!(output.contains("g := func (x int) (_ int) {"), "{}", output);
}

#[test]
fn operator_expressions() {
    let output = translate_source(
        "(package main)\n\
         (var (a := (+ 1 2 3))\n\
              (b := (== 1 2))\n\
              (c := (- 5))\n\
              (d := (&& (< 1 2) (! false)))\n\
              (e := (&^ 7 1)))\n",
    )
    .unwrap();
    assert!(output.contains("a = (1 + 2 + 3)"), "{}", output);
    assert!(output.contains("b = (1 == 2)"), "{}", output);
    assert!(output.contains("c = -5"), "{}", output);
    assert!(output.contains("d = ((1 < 2) && !false)"), "{}", output);
    assert!(output.contains("e = (7 &^ 1)"), "{}", output);
}

#[test]
fn empty_list_is_runtime_nil() {
    let output = translate_source(
        "(package main)\n\
         (var (x := ()))\n",
    )
    .unwrap();
    assert!(output.contains("x = list.Nil()"), "{}", output);
    assert!(
        output.contains(&format!("import list \"{}\"", LIST_PATH)),
        "{}",
        output
    );
}

#[test]
fn quotation_compiles_to_list_reconstruction() {
    let output = translate_source(
        "(package main)\n\
         (func f ((b int) (c (* int))) ()\n\
           (sink `(a ,b ,@c)))\n",
    )
    .unwrap();
    assert!(output.contains("list.Append("), "{}", output);
    assert!(output.contains("lib.Intern(\"\", \"a\")"), "{}", output);
    assert!(
        output.contains(&format!("import lib \"{}\"", LIB_PATH)),
        "{}",
        output
    );
    // The lifted operands appear verbatim.
    assert!(output.contains("b), c)"), "{}", output);
}

#[test]
fn quote_of_leaf_is_the_leaf() {
    let output = translate_source(
        "(package main)\n\
         (var (x := '42) (y := 'sym))\n",
    )
    .unwrap();
    assert!(output.contains("x = 42"), "{}", output);
    assert!(output.contains("y = lib.Intern(\"\", \"sym\")"), "{}", output);
}

#[test]
fn unquote_outside_quasiquote_is_an_error() {
    let err = translate_source(
        "(package main)\n\
         (var (x := ,y))\n",
    )
    .unwrap_err();
    assert!(err.contains("unquote"), "{}", err);
}

#[test]
fn declare_emits_pragma_comment() {
    let output = translate_source(
        "(package main)\n\
         (declare \"go:noinline\")\n\
         (func f () () (return))\n",
    )
    .unwrap();
    assert!(output.contains("\n//go:noinline\n"), "{}", output);
}

#[test]
fn out_of_order_declarations_are_rejected() {
    let err = translate_source(
        "(package main)\n\
         (var (x := 1))\n\
         (import \"fmt\")\n",
    )
    .unwrap_err();
    assert!(err.contains("invalid declaration"), "{}", err);
}

#[test]
fn missing_package_clause_is_an_error() {
    let err = translate_source("(import \"fmt\")\n").unwrap_err();
    assert!(err.contains("package clause"), "{}", err);
}

// A classic let* macro: rewrites into nested single-binding blocks until
// the binding list is empty.
fn let_star(
    heap: &mut Heap,
    interner: &Interner,
    form: PairId,
    _env: &Environment,
) -> Result<Value, MacroError> {
    let args = heap.list_to_vec(&Value::Pair(form));
    if args.len() < 2 {
        return Err(MacroError::new("let* requires a binding list"));
    }
    let head = args[0].clone();
    let body = &args[2..];
    let begin = Value::Symbol(interner.intern("", "begin"));
    match &args[1] {
        Value::Nil => {
            let mut items = vec![begin];
            items.extend(body.iter().cloned());
            Ok(heap.list(&items))
        }
        Value::Pair(bindings) => {
            let first = heap.car(*bindings);
            let rest = heap.cdr(*bindings);
            let binding = heap.list_to_vec(&first);
            if binding.len() != 2 {
                return Err(MacroError::new("let* binding must be (name value)"));
            }
            let assign_head = Value::Symbol(interner.intern(KEYWORD_PACKAGE, "="));
            let assign = heap.list(&[assign_head, binding[0].clone(), binding[1].clone()]);
            let mut inner = vec![head, rest];
            inner.extend(body.iter().cloned());
            let inner_form = heap.list(&inner);
            Ok(heap.list(&[begin, assign, inner_form]))
        }
        _ => Err(MacroError::new("let* requires a binding list")),
    }
}

#[test]
fn plugin_macro_expansion_re_dispatches() {
    let interner = Interner::new();
    let registry = PluginRegistry::new();
    registry.register("my/macros", "let*", let_star);

    let output = translate_with(
        &interner,
        &registry,
        "(package main)\n\
         (use (mac \"my/macros\"))\n\
         (func main () ()\n\
           (mac:let* ((x 1) (y 2))\n\
             (println x y)))\n",
    )
    .unwrap();
    assert!(output.contains("x := 1"), "{}", output);
    assert!(output.contains("y := 2"), "{}", output);
    assert!(output.contains("println(x, y)"), "{}", output);
    // Use declarations leave no trace in the emitted Go.
    assert!(!output.contains("my/macros"), "{}", output);
}

#[test]
fn unknown_plugin_macro_is_an_error() {
    let interner = Interner::new();
    let registry = PluginRegistry::new();
    let err = translate_with(
        &interner,
        &registry,
        "(package main)\n\
         (use (mac \"my/macros\"))\n\
         (func main () () (mac:nope 1))\n",
    )
    .unwrap_err();
    assert!(err.contains("invalid macro invocation"), "{}", err);
}

#[test]
fn error_cascade_is_rate_limited() {
    // Far more broken declarations than the error budget allows.
    let mut src = String::from("(package main)\n");
    for i in 0..40 {
        src.push_str(&format!("(bogus{} 1)\n", i));
    }
    let err = translate_source(&src).unwrap_err();
    assert!(err.lines().count() <= 12, "{}", err);
}

#[test]
fn output_is_discarded_on_any_error() {
    let err = translate_source(
        "(package main)\n\
         (var (x := 1))\n\
         (nonsense)\n",
    )
    .unwrap_err();
    assert!(err.contains("invalid declaration"), "{}", err);
}
