// List library integration tests, exercising the operations together the
// way macro code uses them.

use num_bigint::BigInt;

use slick::printer::print_to_string;
use slick::{Heap, Interner, Value};

fn int(n: i64) -> Value {
    Value::Int(BigInt::from(n))
}

fn as_i64(v: &Value) -> i64 {
    match v {
        Value::Int(n) => i64::try_from(n).unwrap(),
        _ => panic!("expected integer, got {:?}", v),
    }
}

fn ints(heap: &mut Heap, ns: &[i64]) -> Value {
    let elements: Vec<Value> = ns.iter().map(|&n| int(n)).collect();
    heap.list(&elements)
}

#[test]
fn constructors() {
    let mut heap = Heap::new();
    let interner = Interner::new();

    let list = ints(&mut heap, &[1, 2, 3]);
    assert_eq!(print_to_string(&heap, &interner, &list), "(1 2 3)");

    let dotted = heap.cons_list(&[int(1), int(2), int(3)], int(4));
    assert_eq!(print_to_string(&heap, &interner, &dotted), "(1 2 3 . 4)");

    let filled = heap.make_list(3, &int(7));
    assert_eq!(print_to_string(&heap, &interner, &filled), "(7 7 7)");

    let tabulated = heap.tabulate(4, |_, i| int(i as i64 + 1));
    assert_eq!(print_to_string(&heap, &interner, &tabulated), "(1 2 3 4)");

    let copy = heap.copy_list(&list);
    assert!(heap.equal(&copy, &list));
    assert_ne!(copy.as_pair(), list.as_pair());
}

#[test]
fn circular_lists_are_detected_not_traversed() {
    let mut heap = Heap::new();
    let circ = heap.circular(int(1), &[int(2)]);
    assert!(heap.is_circular_list(&circ));
    assert_eq!(heap.non_circular_length(&circ), None);
    // The spine is reachable: four distinct values from two cells.
    let a = heap.car_of(&circ).unwrap();
    let b = heap.cadr(&circ).unwrap();
    let c = heap.caddr(&circ).unwrap();
    assert_eq!((as_i64(&a), as_i64(&b), as_i64(&c)), (1, 2, 1));
}

#[test]
fn selectors_are_permissive() {
    let mut heap = Heap::new();
    let list = ints(&mut heap, &[1]);
    assert_eq!(heap.car_of(&list), Some(int(1)));
    assert_eq!(heap.cdr_of(&list), Some(Value::Nil));
    // The empty list and leaves have no car or cdr, and that is not an
    // error.
    assert_eq!(heap.car_of(&Value::Nil), None);
    assert_eq!(heap.cadr(&list), None);
    assert_eq!(heap.cdr_of(&Value::Str("x".into())), None);
}

#[test]
fn folds_and_maps_compose() {
    let mut heap = Heap::new();
    let list = ints(&mut heap, &[1, 2, 3, 4, 5]);

    let doubled = heap.map(&list, |_, e| int(as_i64(&e) * 2));
    let sum = heap.fold(&doubled, int(0), |_, acc, e| int(as_i64(&acc) + as_i64(&e)));
    assert_eq!(as_i64(&sum), 30);

    let pairs = heap.map_n(&[list.clone(), doubled], |h, es| {
        h.list(&[es[0].clone(), es[1].clone()])
    });
    assert_eq!(heap.length(&pairs), 5);
    let first = heap.first(&pairs).unwrap();
    assert_eq!(as_i64(&heap.second(&first).unwrap()), 2);

    let flattened = heap.append_map(&pairs, |_, row| row);
    assert_eq!(heap.length(&flattened), 10);
}

#[test]
fn searching_and_filtering() {
    let mut heap = Heap::new();
    let list = ints(&mut heap, &[3, 1, 4, 1, 5, 9, 2, 6]);

    assert_eq!(heap.count(&list, |_, v| as_i64(v) == 1), 2);
    assert_eq!(heap.list_index(&list, |_, v| as_i64(v) > 4), Some(4));

    let (small, large) = heap.partition(&list, |_, v| as_i64(v) < 4);
    assert_eq!(heap.length(&small), 4);
    assert_eq!(heap.length(&large), 4);

    let unique = heap.delete_duplicates(&list);
    assert_eq!(heap.length(&unique), 7);

    let without_ones = heap.delete(&list, &int(1));
    assert!(heap.every(&without_ones, |_, v| as_i64(v) != 1));
}

#[test]
fn set_algebra() {
    let mut heap = Heap::new();
    let a = ints(&mut heap, &[1, 2, 3]);
    let b = ints(&mut heap, &[2, 3, 4]);

    let union = heap.set_union(&[a.clone(), b.clone()]);
    for n in 1..=4 {
        assert!(heap.member(&union, &int(n)).is_some(), "{}", n);
    }

    let inter = heap.set_intersection(&a, &[b.clone()]);
    let expected_inter = ints(&mut heap, &[2, 3]);
    assert!(heap.set_equal(&[inter, expected_inter]));

    let diff = heap.set_difference(&a, &[b]);
    let expected_diff = ints(&mut heap, &[1]);
    assert!(heap.set_equal(&[diff, expected_diff]));
}

#[test]
fn association_lists() {
    let mut heap = Heap::new();
    let interner = Interner::new();
    let key_a = Value::Symbol(interner.intern("", "a"));
    let key_b = Value::Symbol(interner.intern("", "b"));

    let mut alist = Value::Nil;
    alist = heap.acons(&alist, key_a.clone(), int(1));
    alist = heap.acons(&alist, key_b.clone(), int(2));

    let entry = heap.assoc(&alist, &key_a).unwrap();
    assert_eq!(as_i64(&heap.cdr(entry)), 1);

    let trimmed = heap.alist_delete(&alist, &key_a);
    assert!(heap.assoc(&trimmed, &key_a).is_none());
    assert!(heap.assoc(&trimmed, &key_b).is_some());
}

#[test]
fn linear_update_variants_agree_with_pure_ones() {
    let mut heap = Heap::new();

    let pure_in = ints(&mut heap, &[1, 2, 3, 4]);
    let pure_out = heap.filter(&pure_in, |_, v| as_i64(v) % 2 == 0);

    let linear_in = ints(&mut heap, &[1, 2, 3, 4]);
    let linear_out = heap.n_filter(&linear_in, |_, v| as_i64(v) % 2 == 0);

    assert!(heap.equal(&pure_out, &linear_out));

    let a = ints(&mut heap, &[1, 2]);
    let b = ints(&mut heap, &[3]);
    let pure_append = heap.append(&[a.clone(), b.clone()]);
    let linear_append = heap.n_append(&[a, b]);
    assert!(heap.equal(&pure_append, &linear_append));
}

#[test]
fn unfold_builds_what_fold_consumes() {
    let mut heap = Heap::new();
    let built = heap.unfold(0i64, |s| *s >= 6, |_, s| int(*s), |s| s + 2);
    let expected = ints(&mut heap, &[0, 2, 4]);
    assert!(heap.equal(&built, &expected));

    let total = heap.fold(&built, int(0), |_, acc, e| int(as_i64(&acc) + as_i64(&e)));
    assert_eq!(as_i64(&total), 6);
}

#[test]
fn structural_equality_ignores_identity() {
    let mut heap = Heap::new();
    let interner = Interner::new();
    let sym = Value::Symbol(interner.intern("pkg", "name"));

    let inner1 = heap.list(&[sym.clone(), int(1)]);
    let inner2 = heap.list(&[sym.clone(), int(1)]);
    let outer1 = heap.list(&[inner1.clone(), Value::Str("s".into())]);
    let outer2 = heap.list(&[inner2, Value::Str("s".into())]);

    assert!(heap.equal(&outer1, &outer2));
    let outer3 = heap.list(&[inner1, Value::Str("t".into())]);
    assert!(!heap.equal(&outer1, &outer3));
}
