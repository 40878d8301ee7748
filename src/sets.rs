// Slick List Library - Sets and Association Lists
//
// Lists used as sets, compared with structural equality, plus the
// association-list operations. Set results share tails with their inputs
// where the contracts allow it.

use crate::heap::Heap;
use crate::types::{PairId, Value};

impl Heap {
    /// Add the elements not already present to the front of the list. The
    /// list argument is always a suffix of the result.
    pub fn adjoin(&mut self, list: &Value, elements: &[Value]) -> Value {
        let mut result = list.clone();
        for element in elements {
            if self.member(&result, element).is_none() {
                result = self.pair(element.clone(), result);
            }
        }
        result
    }

    /// The union of the lists: the first list extended with every element
    /// of the later lists that is not already in the result.
    pub fn set_union(&mut self, lists: &[Value]) -> Value {
        let mut result = match lists.first() {
            None => return Value::Nil,
            Some(first) => first.clone(),
        };
        for list in &lists[1..] {
            let elements = self.list_to_vec(list);
            for element in elements {
                if self.member(&result, &element).is_none() {
                    result = self.pair(element, result);
                }
            }
        }
        result
    }

    /// The intersection: the elements of the first list present in every
    /// other list, in first-list order.
    pub fn set_intersection(&mut self, list: &Value, more: &[Value]) -> Value {
        self.filter(list, |heap, e| {
            more.iter().all(|other| heap.member(other, e).is_some())
        })
    }

    /// The difference: the elements of the first list present in none of
    /// the other lists.
    pub fn set_difference(&mut self, list: &Value, more: &[Value]) -> Value {
        self.filter(list, |heap, e| {
            more.iter().all(|other| heap.member(other, e).is_none())
        })
    }

    /// The symmetric difference, folded across the argument lists.
    pub fn set_xor(&mut self, lists: &[Value]) -> Value {
        let mut result = match lists.first() {
            None => return Value::Nil,
            Some(first) => first.clone(),
        };
        for list in &lists[1..] {
            let only_left = self.set_difference(&result.clone(), &[list.clone()]);
            let only_right = self.set_difference(list, &[result.clone()]);
            result = self.append(&[only_left, only_right]);
        }
        result
    }

    /// True iff each list is a subset of the next.
    pub fn set_subset(&self, lists: &[Value]) -> bool {
        lists.windows(2).all(|w| self.subset2(&w[0], &w[1]))
    }

    /// True iff all lists contain the same elements.
    pub fn set_equal(&self, lists: &[Value]) -> bool {
        lists
            .windows(2)
            .all(|w| self.subset2(&w[0], &w[1]) && self.subset2(&w[1], &w[0]))
    }

    fn subset2(&self, a: &Value, b: &Value) -> bool {
        self.every(a, |heap, e| heap.member(b, e).is_some())
    }

    // Association lists

    /// The first pair of the alist whose car is structurally equal to key.
    pub fn assoc(&self, alist: &Value, key: &Value) -> Option<PairId> {
        let mut current = alist.clone();
        while let Value::Pair(id) = current {
            if let Value::Pair(entry) = self.car(id) {
                if self.equal(self.car_ref(entry), key) {
                    return Some(entry);
                }
            }
            current = self.cdr(id);
        }
        None
    }

    /// Cons a new entry mapping key to value onto the alist.
    pub fn acons(&mut self, alist: &Value, key: Value, value: Value) -> Value {
        let entry = self.pair(key, value);
        self.pair(entry, alist.clone())
    }

    /// Copy the alist, copying each entry pair as well.
    pub fn alist_copy(&mut self, alist: &Value) -> Value {
        let entries = self.list_to_vec(alist);
        let mut copies = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::Pair(id) => {
                    let car = self.car(id);
                    let cdr = self.cdr(id);
                    copies.push(self.pair(car, cdr));
                }
                other => copies.push(other),
            }
        }
        self.list(&copies)
    }

    /// Delete all entries with the given key.
    pub fn alist_delete(&mut self, alist: &Value, key: &Value) -> Value {
        self.remove(alist, |heap, entry| match entry {
            Value::Pair(id) => heap.equal(heap.car_ref(*id), key),
            _ => false,
        })
    }

    pub fn n_alist_delete(&mut self, alist: &Value, key: &Value) -> Value {
        self.n_remove(alist, |heap, entry| match entry {
            Value::Pair(id) => heap.equal(heap.car_ref(*id), key),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn int(n: i64) -> Value {
        Value::Int(BigInt::from(n))
    }

    fn ints(heap: &mut Heap, ns: &[i64]) -> Value {
        let elements: Vec<Value> = ns.iter().map(|&n| int(n)).collect();
        heap.list(&elements)
    }

    fn sorted(heap: &Heap, list: &Value) -> Vec<i64> {
        let mut ns: Vec<i64> = heap
            .list_to_vec(list)
            .iter()
            .map(|v| match v {
                Value::Int(n) => i64::try_from(n).unwrap(),
                _ => panic!("expected integer"),
            })
            .collect();
        ns.sort();
        ns
    }

    #[test]
    fn test_adjoin() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3]);
        let result = heap.adjoin(&list, &[int(2), int(4)]);
        assert_eq!(sorted(&heap, &result), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_union() {
        let mut heap = Heap::new();
        let a = ints(&mut heap, &[1, 2]);
        let b = ints(&mut heap, &[2, 3]);
        let u = heap.set_union(&[a, b]);
        assert_eq!(sorted(&heap, &u), vec![1, 2, 3]);
        assert_eq!(heap.set_union(&[]), Value::Nil);
    }

    #[test]
    fn test_intersection_difference() {
        let mut heap = Heap::new();
        let a = ints(&mut heap, &[1, 2, 3, 4]);
        let b = ints(&mut heap, &[2, 4, 6]);
        let i = heap.set_intersection(&a, &[b.clone()]);
        assert_eq!(sorted(&heap, &i), vec![2, 4]);
        let d = heap.set_difference(&a, &[b]);
        assert_eq!(sorted(&heap, &d), vec![1, 3]);
    }

    #[test]
    fn test_xor() {
        let mut heap = Heap::new();
        let a = ints(&mut heap, &[1, 2, 3]);
        let b = ints(&mut heap, &[2, 3, 4]);
        let x = heap.set_xor(&[a, b]);
        assert_eq!(sorted(&heap, &x), vec![1, 4]);
    }

    #[test]
    fn test_subset_equal() {
        let mut heap = Heap::new();
        let small = ints(&mut heap, &[1]);
        let mid = ints(&mut heap, &[1, 2, 1]);
        let big = ints(&mut heap, &[1, 2, 3, 3]);
        assert!(heap.set_subset(&[small.clone(), mid.clone(), big.clone()]));
        assert!(!heap.set_subset(&[big.clone(), small]));
        let same = ints(&mut heap, &[2, 1, 2]);
        assert!(heap.set_equal(&[mid, same]));
        assert!(heap.set_subset(&[]));
        assert!(heap.set_equal(&[big]));
    }

    #[test]
    fn test_assoc() {
        let mut heap = Heap::new();
        let mut alist = Value::Nil;
        alist = heap.acons(&alist, int(1), Value::Rune('a'));
        alist = heap.acons(&alist, int(2), Value::Rune('b'));
        let entry = heap.assoc(&alist, &int(1)).unwrap();
        assert_eq!(heap.cdr(entry), Value::Rune('a'));
        assert!(heap.assoc(&alist, &int(3)).is_none());
    }

    #[test]
    fn test_alist_copy_and_delete() {
        let mut heap = Heap::new();
        let mut alist = Value::Nil;
        alist = heap.acons(&alist, int(1), Value::Rune('a'));
        alist = heap.acons(&alist, int(2), Value::Rune('b'));
        alist = heap.acons(&alist, int(1), Value::Rune('c'));

        let copy = heap.alist_copy(&alist);
        let original_entry = heap.assoc(&alist, &int(2)).unwrap();
        let copy_entry = heap.assoc(&copy, &int(2)).unwrap();
        assert_ne!(original_entry, copy_entry);
        assert!(heap.equal(&heap.cdr(original_entry), &heap.cdr(copy_entry)));

        let trimmed = heap.alist_delete(&alist, &int(1));
        assert_eq!(heap.length(&trimmed), 1);
        assert!(heap.assoc(&trimmed, &int(1)).is_none());
    }
}
