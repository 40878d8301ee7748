// Slick List Library - Core
//
// Constructors, selectors, predicates, structural equality, and slice
// conversion for cons-cell lists, in the tradition of SRFI 1. The reader
// only ever produces proper lists; dotted and circular lists arise through
// the constructors here and through macro functions.
//
// Naming: a linear-update operation carries an n_ prefix and is allowed,
// but not required, to recycle cells of its argument.
//
// Selectors are permissive: car/cdr of the empty list or of a non-pair is
// simply absent, never a failure.

use crate::heap::Heap;
use crate::types::{PairId, Value};
use num_bigint::BigInt;

impl Heap {
    // Constructors

    /// Build a proper list of the elements. An empty slice yields the
    /// empty list.
    pub fn list(&mut self, elements: &[Value]) -> Value {
        let mut result = Value::Nil;
        for element in elements.iter().rev() {
            result = self.pair(element.clone(), result);
        }
        result
    }

    /// Like list, but the last argument provides the tail of the
    /// constructed list:
    ///
    ///   cons_list([1, 2, 3], 4) => (1 2 3 . 4)
    pub fn cons_list(&mut self, elements: &[Value], tail: Value) -> Value {
        let mut result = tail;
        for element in elements.iter().rev() {
            result = self.pair(element.clone(), result);
        }
        result
    }

    /// A list of the given length whose elements are all `fill`.
    pub fn make_list(&mut self, length: usize, fill: &Value) -> Value {
        let mut result = Value::Nil;
        for _ in 0..length {
            result = self.pair(fill.clone(), result);
        }
        result
    }

    /// A list of the given length; element i is produced by init(i).
    pub fn tabulate(
        &mut self,
        length: usize,
        mut init: impl FnMut(&mut Heap, usize) -> Value,
    ) -> Value {
        let mut elements = Vec::with_capacity(length);
        for i in 0..length {
            elements.push(init(self, i));
        }
        self.list(&elements)
    }

    /// An arithmetic sequence of `count` integers starting at `start` with
    /// the given step.
    pub fn iota_list(&mut self, count: usize, start: i64, step: i64) -> Value {
        self.tabulate(count, |_, i| {
            Value::Int(BigInt::from(start + step * i as i64))
        })
    }

    /// A circular list of the elements:
    ///
    ///   circular(1, [2]) => (1 2 1 2 1 2 ...)
    pub fn circular(&mut self, first: Value, rest: &[Value]) -> Value {
        let head = self.alloc(first, Value::Nil);
        let mut last = head;
        for element in rest {
            let next = self.alloc(element.clone(), Value::Nil);
            self.set_cdr(last, Value::Pair(next));
            last = next;
        }
        self.set_cdr(last, Value::Pair(head));
        Value::Pair(head)
    }

    /// Copy the spine of the list. A dotted tail is carried over; leaves
    /// are shared.
    pub fn copy_list(&mut self, list: &Value) -> Value {
        let (elements, tail) = self.spine(list);
        self.cons_list(&elements, tail)
    }

    // Selectors

    pub fn car_of(&self, v: &Value) -> Option<Value> {
        match v {
            Value::Pair(id) => Some(self.car(*id)),
            _ => None,
        }
    }

    pub fn cdr_of(&self, v: &Value) -> Option<Value> {
        match v {
            Value::Pair(id) => Some(self.cdr(*id)),
            _ => None,
        }
    }

    pub fn caar(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.car_of(v)?)
    }

    pub fn cadr(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cdr_of(v)?)
    }

    pub fn cdar(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.car_of(v)?)
    }

    pub fn cddr(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.cdr_of(v)?)
    }

    pub fn caaar(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.caar(v)?)
    }

    pub fn caadr(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cadr(v)?)
    }

    pub fn cadar(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cdar(v)?)
    }

    pub fn caddr(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cddr(v)?)
    }

    pub fn cdaar(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.caar(v)?)
    }

    pub fn cdadr(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.cadr(v)?)
    }

    pub fn cddar(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.cdar(v)?)
    }

    pub fn cdddr(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.cddr(v)?)
    }

    pub fn cadddr(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cdddr(v)?)
    }

    pub fn cddddr(&self, v: &Value) -> Option<Value> {
        self.cdr_of(&self.cdddr(v)?)
    }

    pub fn first(&self, v: &Value) -> Option<Value> {
        self.car_of(v)
    }

    pub fn second(&self, v: &Value) -> Option<Value> {
        self.cadr(v)
    }

    pub fn third(&self, v: &Value) -> Option<Value> {
        self.caddr(v)
    }

    pub fn fourth(&self, v: &Value) -> Option<Value> {
        self.cadddr(v)
    }

    pub fn fifth(&self, v: &Value) -> Option<Value> {
        self.car_of(&self.cddddr(v)?)
    }

    /// Element n of the list, zero-based.
    pub fn list_ref(&self, list: &Value, n: usize) -> Option<Value> {
        self.car_of(&self.list_tail(list, n)?)
    }

    /// The list with its first k elements dropped. drop(list, 0) is the
    /// list itself; the result of a full drop may be a dotted tail.
    pub fn list_tail(&self, list: &Value, k: usize) -> Option<Value> {
        let mut current = list.clone();
        for _ in 0..k {
            current = self.cdr_of(&current)?;
        }
        Some(current)
    }

    /// The first k elements of the list as a fresh list.
    pub fn take(&mut self, list: &Value, k: usize) -> Option<Value> {
        let mut elements = Vec::with_capacity(k);
        let mut current = list.clone();
        for _ in 0..k {
            let id = current.as_pair()?;
            elements.push(self.car(id));
            current = self.cdr(id);
        }
        Some(self.list(&elements))
    }

    /// Linear-update take: truncates the list in place after k elements.
    pub fn n_take(&mut self, list: &Value, k: usize) -> Option<Value> {
        if k == 0 {
            return Some(Value::Nil);
        }
        let mut current = list.as_pair()?;
        for _ in 1..k {
            current = self.cdr(current).as_pair()?;
        }
        self.set_cdr(current, Value::Nil);
        Some(list.clone())
    }

    pub fn drop(&self, list: &Value, k: usize) -> Option<Value> {
        self.list_tail(list, k)
    }

    /// The last k elements of the list; shares a tail with the argument.
    pub fn take_right(&self, list: &Value, k: usize) -> Option<Value> {
        let mut lead = self.list_tail(list, k)?;
        let mut lag = list.clone();
        while let Value::Pair(id) = lead {
            lead = self.cdr(id);
            lag = self.cdr_of(&lag)?;
        }
        Some(lag)
    }

    /// All but the last k elements of the list, as a fresh list.
    pub fn drop_right(&mut self, list: &Value, k: usize) -> Option<Value> {
        let length = self.length(list);
        if k > length {
            return None;
        }
        self.take(list, length - k)
    }

    pub fn n_drop_right(&mut self, list: &Value, k: usize) -> Option<Value> {
        let length = self.length(list);
        if k > length {
            return None;
        }
        self.n_take(list, length - k)
    }

    /// Split the list at index k: the first k elements as a fresh list,
    /// and the shared remainder.
    pub fn split_at(&mut self, list: &Value, k: usize) -> Option<(Value, Value)> {
        let prefix = self.take(list, k)?;
        let suffix = self.list_tail(list, k)?;
        Some((prefix, suffix))
    }

    pub fn n_split_at(&mut self, list: &Value, k: usize) -> Option<(Value, Value)> {
        let suffix = self.list_tail(list, k)?;
        let prefix = self.n_take(list, k)?;
        Some((prefix, suffix))
    }

    /// The last element of a finite list.
    pub fn last(&self, list: &Value) -> Option<Value> {
        Some(self.car(self.last_pair(list)?))
    }

    /// The last pair of a finite list.
    pub fn last_pair(&self, list: &Value) -> Option<PairId> {
        let mut current = list.as_pair()?;
        while let Value::Pair(next) = self.cdr(current) {
            current = next;
        }
        Some(current)
    }

    // Predicates

    /// True iff the value is the empty list or a pair chain terminated by
    /// the empty list. Detects cycles.
    pub fn is_proper_list(&self, v: &Value) -> bool {
        match self.scan_list(v) {
            ListShape::Proper(_) => true,
            _ => false,
        }
    }

    pub fn is_dotted_list(&self, v: &Value) -> bool {
        matches!(self.scan_list(v), ListShape::Dotted(_))
    }

    pub fn is_circular_list(&self, v: &Value) -> bool {
        matches!(self.scan_list(v), ListShape::Circular)
    }

    /// The number of pairs in the spine, stopping at any non-pair cdr.
    /// Must not be called on a circular list.
    pub fn length(&self, list: &Value) -> usize {
        let mut n = 0;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            n += 1;
            current = self.cdr(id);
        }
        n
    }

    /// Cycle-safe length: absent for circular lists.
    pub fn non_circular_length(&self, list: &Value) -> Option<usize> {
        match self.scan_list(list) {
            ListShape::Proper(n) | ListShape::Dotted(n) => Some(n),
            ListShape::Circular => None,
        }
    }

    /// Classify a value as a proper, dotted, or circular list, with the
    /// spine length for the finite shapes. A non-pair, non-nil value is a
    /// dotted list of length zero.
    pub fn scan_list(&self, v: &Value) -> ListShape {
        let mut slow = v.clone();
        let mut fast = v.clone();
        let mut n = 0;
        loop {
            let fast_id = match fast {
                Value::Pair(id) => id,
                Value::Nil => return ListShape::Proper(n),
                _ => return ListShape::Dotted(n),
            };
            n += 1;
            fast = self.cdr(fast_id);
            let fast_id = match fast {
                Value::Pair(id) => id,
                Value::Nil => return ListShape::Proper(n),
                _ => return ListShape::Dotted(n),
            };
            n += 1;
            fast = self.cdr(fast_id);
            slow = self.cdr_of(&slow).unwrap_or(Value::Nil);
            if slow == fast {
                return ListShape::Circular;
            }
        }
    }

    // Equality

    /// Structural equality through car and cdr. Symbols compare by handle;
    /// other leaves compare by value. Must not be called on circular
    /// structures.
    pub fn equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Pair(x), Value::Pair(y)) => {
                if x == y {
                    return true;
                }
                self.equal(self.car_ref(*x), self.car_ref(*y))
                    && self.equal(self.cdr_ref(*x), self.cdr_ref(*y))
            }
            _ => a == b,
        }
    }

    // Conversion

    /// The elements of the list as a vector. A dotted tail is dropped.
    pub fn list_to_vec(&self, list: &Value) -> Vec<Value> {
        self.spine(list).0
    }

    /// The elements and the final cdr (the empty list for a proper list).
    pub fn spine(&self, list: &Value) -> (Vec<Value>, Value) {
        let mut elements = Vec::new();
        let mut current = list.clone();
        loop {
            match current {
                Value::Pair(id) => {
                    elements.push(self.car(id));
                    current = self.cdr(id);
                }
                tail => return (elements, tail),
            }
        }
    }

    // Append and reverse

    /// Append the lists. Every list but the last is copied; the last is
    /// shared.
    pub fn append(&mut self, lists: &[Value]) -> Value {
        match lists.split_last() {
            None => Value::Nil,
            Some((last, front)) => {
                let mut result = last.clone();
                for list in front.iter().rev() {
                    let elements = self.list_to_vec(list);
                    result = self.cons_list(&elements, result);
                }
                result
            }
        }
    }

    /// Linear-update append: links each list to the next through the cdr
    /// of its last pair.
    pub fn n_append(&mut self, lists: &[Value]) -> Value {
        let mut result = Value::Nil;
        let mut last: Option<PairId> = None;
        for list in lists {
            if list.is_nil() {
                continue;
            }
            match last {
                None => result = list.clone(),
                Some(id) => self.set_cdr(id, list.clone()),
            }
            last = self.last_pair(list).or(last);
        }
        result
    }

    /// Append the lists of a list of lists.
    pub fn concatenate(&mut self, lists: &Value) -> Value {
        let elements = self.list_to_vec(lists);
        self.append(&elements)
    }

    /// reverse(list) consed onto tail.
    pub fn append_reverse(&mut self, list: &Value, tail: Value) -> Value {
        let mut result = tail;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            result = self.pair(self.car(id), result);
            current = self.cdr(id);
        }
        result
    }

    /// In-place append_reverse: flips the cdr links of the argument.
    pub fn n_append_reverse(&mut self, list: &Value, tail: Value) -> Value {
        let mut result = tail;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let next = self.cdr(id);
            self.set_cdr(id, result);
            result = Value::Pair(id);
            current = next;
        }
        result
    }

    pub fn reverse(&mut self, list: &Value) -> Value {
        self.append_reverse(list, Value::Nil)
    }

    pub fn n_reverse(&mut self, list: &Value) -> Value {
        self.n_append_reverse(list, Value::Nil)
    }
}

/// The shape of a value viewed as a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// Terminated by the empty list; carries the element count.
    Proper(usize),
    /// Terminated by a non-pair, non-nil value; carries the pair count.
    Dotted(usize),
    Circular,
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

    #[test]
    fn test_list_and_to_vec() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3]);
        assert_eq!(heap.list_to_vec(&list), vec![int(1), int(2), int(3)]);
        assert_eq!(heap.list(&[]), Value::Nil);
    }

    #[test]
    fn test_cons_list_dotted() {
        let mut heap = Heap::new();
        let dotted = heap.cons_list(&[int(1), int(2)], int(3));
        assert!(heap.is_dotted_list(&dotted));
        assert_eq!(heap.spine(&dotted), (vec![int(1), int(2)], int(3)));
    }

    #[test]
    fn test_selectors() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3, 4, 5]);
        assert_eq!(heap.first(&list), Some(int(1)));
        assert_eq!(heap.second(&list), Some(int(2)));
        assert_eq!(heap.third(&list), Some(int(3)));
        assert_eq!(heap.fourth(&list), Some(int(4)));
        assert_eq!(heap.fifth(&list), Some(int(5)));
        assert_eq!(heap.list_ref(&list, 4), Some(int(5)));
        assert_eq!(heap.list_ref(&list, 5), None);
        assert_eq!(heap.car_of(&Value::Nil), None);
        assert_eq!(heap.cdr_of(&int(1)), None);
    }

    #[test]
    fn test_nested_selectors() {
        let mut heap = Heap::new();
        let inner = ints(&mut heap, &[1, 2]);
        let list = heap.list(&[inner, int(3)]);
        assert_eq!(heap.caar(&list), Some(int(1)));
        assert_eq!(heap.cadr(&list), Some(int(3)));
        assert_eq!(heap.cadar(&list), Some(int(2)));
    }

    #[test]
    fn test_take_drop() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3, 4]);
        let prefix = heap.take(&list, 2).unwrap();
        assert_eq!(heap.list_to_vec(&prefix), vec![int(1), int(2)]);
        let suffix = heap.drop(&list, 2).unwrap();
        assert_eq!(heap.list_to_vec(&suffix), vec![int(3), int(4)]);
        assert_eq!(heap.take(&list, 5), None);
        assert_eq!(heap.drop(&list, 4), Some(Value::Nil));

        let right = heap.take_right(&list, 1).unwrap();
        assert_eq!(heap.list_to_vec(&right), vec![int(4)]);
        let front = heap.drop_right(&list, 1).unwrap();
        assert_eq!(heap.list_to_vec(&front), vec![int(1), int(2), int(3)]);
    }

    #[test]
    fn test_split_at() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3]);
        let (prefix, suffix) = heap.split_at(&list, 1).unwrap();
        assert_eq!(heap.list_to_vec(&prefix), vec![int(1)]);
        assert_eq!(heap.list_to_vec(&suffix), vec![int(2), int(3)]);
    }

    #[test]
    fn test_shapes() {
        let mut heap = Heap::new();
        let proper = ints(&mut heap, &[1, 2, 3]);
        assert_eq!(heap.scan_list(&proper), ListShape::Proper(3));
        assert!(heap.is_proper_list(&proper));
        assert!(heap.is_proper_list(&Value::Nil));

        let dotted = heap.cons_list(&[int(1)], int(2));
        assert_eq!(heap.scan_list(&dotted), ListShape::Dotted(1));

        let circular = heap.circular(int(1), &[int(2)]);
        assert_eq!(heap.scan_list(&circular), ListShape::Circular);
        assert_eq!(heap.non_circular_length(&circular), None);
    }

    #[test]
    fn test_length() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3]);
        assert_eq!(heap.length(&list), 3);
        assert_eq!(heap.length(&Value::Nil), 0);
    }

    #[test]
    fn test_equal() {
        let mut heap = Heap::new();
        let a = ints(&mut heap, &[1, 2, 3]);
        let b = ints(&mut heap, &[1, 2, 3]);
        let c = ints(&mut heap, &[1, 2]);
        assert!(heap.equal(&a, &b));
        assert!(!heap.equal(&a, &c));
        assert!(heap.equal(&Value::Nil, &Value::Nil));
    }

    #[test]
    fn test_append() {
        let mut heap = Heap::new();
        let a = ints(&mut heap, &[1, 2]);
        let b = ints(&mut heap, &[3]);
        let joined = heap.append(&[a.clone(), b.clone()]);
        assert_eq!(heap.list_to_vec(&joined), vec![int(1), int(2), int(3)]);
        // The first argument was copied, not mutated.
        assert_eq!(heap.length(&a), 2);

        let njoined = heap.n_append(&[a.clone(), b]);
        assert_eq!(heap.list_to_vec(&njoined), vec![int(1), int(2), int(3)]);
        // Linear-update append recycled the first argument's cells.
        assert_eq!(heap.length(&a), 3);
    }

    #[test]
    fn test_reverse() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2, 3]);
        let reversed = heap.reverse(&list);
        assert_eq!(heap.list_to_vec(&reversed), vec![int(3), int(2), int(1)]);
        // Pure reverse left the argument intact.
        assert_eq!(heap.list_to_vec(&list), vec![int(1), int(2), int(3)]);

        let nreversed = heap.n_reverse(&list);
        assert_eq!(heap.list_to_vec(&nreversed), vec![int(3), int(2), int(1)]);
    }

    #[test]
    fn test_tabulate_and_iota() {
        let mut heap = Heap::new();
        let squares = heap.tabulate(4, |_, i| int((i * i) as i64));
        assert_eq!(
            heap.list_to_vec(&squares),
            vec![int(0), int(1), int(4), int(9)]
        );
        let iota = heap.iota_list(3, 5, -1);
        assert_eq!(heap.list_to_vec(&iota), vec![int(5), int(4), int(3)]);
    }

    #[test]
    fn test_copy_shares_no_spine() {
        let mut heap = Heap::new();
        let list = ints(&mut heap, &[1, 2]);
        let copy = heap.copy_list(&list);
        let copy_id = copy.as_pair().unwrap();
        heap.set_car(copy_id, int(9));
        assert_eq!(heap.first(&list), Some(int(1)));
    }
}
