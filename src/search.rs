// Slick List Library - Searching, Filtering, and Deletion
//
// All searches commit to left-to-right traversal; the n-ary variants stop
// with the shortest argument list. Filter-like operations preserve the
// order of the elements they keep.

use crate::heap::Heap;
use crate::types::{PairId, Value};

impl Heap {
    /// The first element satisfying the predicate.
    pub fn find(
        &self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Option<Value> {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            if pred(self, &element) {
                return Some(element);
            }
            current = self.cdr(id);
        }
        None
    }

    /// The first sublist whose head satisfies the predicate.
    pub fn find_tail(
        &self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Option<Value> {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            if pred(self, self.car_ref(id)) {
                return Some(Value::Pair(id));
            }
            current = self.cdr(id);
        }
        None
    }

    pub fn any(&self, list: &Value, mut pred: impl FnMut(&Heap, &Value) -> bool) -> bool {
        self.find(list, |heap, e| pred(heap, e)).is_some()
    }

    pub fn every(&self, list: &Value, mut pred: impl FnMut(&Heap, &Value) -> bool) -> bool {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            if !pred(self, self.car_ref(id)) {
                return false;
            }
            current = self.cdr(id);
        }
        true
    }

    /// n-ary any: true iff the predicate holds for some aligned row of
    /// elements, stopping with the shortest list.
    pub fn any_n(&self, lists: &[Value], mut pred: impl FnMut(&Heap, &[Value]) -> bool) -> bool {
        let mut currents: Vec<Value> = lists.to_vec();
        loop {
            let mut cars = Vec::with_capacity(currents.len());
            for current in &currents {
                match current {
                    Value::Pair(id) => cars.push(self.car(*id)),
                    _ => return false,
                }
            }
            if pred(self, &cars) {
                return true;
            }
            for current in currents.iter_mut() {
                let id = current.as_pair().unwrap();
                *current = self.cdr(id);
            }
        }
    }

    /// n-ary every, stopping with the shortest list.
    pub fn every_n(&self, lists: &[Value], mut pred: impl FnMut(&Heap, &[Value]) -> bool) -> bool {
        let mut currents: Vec<Value> = lists.to_vec();
        loop {
            let mut cars = Vec::with_capacity(currents.len());
            for current in &currents {
                match current {
                    Value::Pair(id) => cars.push(self.car(*id)),
                    _ => return true,
                }
            }
            if !pred(self, &cars) {
                return false;
            }
            for current in currents.iter_mut() {
                let id = current.as_pair().unwrap();
                *current = self.cdr(id);
            }
        }
    }

    /// The index of the first element satisfying the predicate.
    pub fn list_index(
        &self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Option<usize> {
        let mut index = 0;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            if pred(self, self.car_ref(id)) {
                return Some(index);
            }
            index += 1;
            current = self.cdr(id);
        }
        None
    }

    /// The first sublist whose head is structurally equal to x.
    pub fn member(&self, list: &Value, x: &Value) -> Option<Value> {
        self.find_tail(list, |heap, e| heap.equal(e, x))
    }

    /// The number of elements satisfying the predicate.
    pub fn count(&self, list: &Value, mut pred: impl FnMut(&Heap, &Value) -> bool) -> usize {
        let mut n = 0;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            if pred(self, self.car_ref(id)) {
                n += 1;
            }
            current = self.cdr(id);
        }
        n
    }

    /// The longest initial prefix whose elements satisfy the predicate,
    /// as a fresh list.
    pub fn take_while(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        let mut kept = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            if !pred(self, &element) {
                break;
            }
            kept.push(element);
            current = self.cdr(id);
        }
        self.list(&kept)
    }

    /// Linear-update take_while: truncates at the first failing element.
    pub fn n_take_while(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        let mut last: Option<PairId> = None;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            if !pred(self, self.car_ref(id)) {
                match last {
                    None => return Value::Nil,
                    Some(p) => {
                        self.set_cdr(p, Value::Nil);
                        return list.clone();
                    }
                }
            }
            last = Some(id);
            current = self.cdr(id);
        }
        list.clone()
    }

    /// The remaining sublist after the longest satisfying prefix; shares
    /// structure with the argument.
    pub fn drop_while(
        &self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        let mut current = list.clone();
        while let Value::Pair(id) = current.clone() {
            if !pred(self, self.car_ref(id)) {
                return current;
            }
            current = self.cdr(id);
        }
        current
    }

    /// span splits the list at the first element that fails the predicate.
    pub fn span(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> (Value, Value) {
        let prefix = self.take_while(list, |heap, e| pred(heap, e));
        let suffix = self.drop_while(list, |heap, e| pred(heap, e));
        (prefix, suffix)
    }

    /// break_when splits the list at the first element that satisfies the
    /// predicate.
    pub fn break_when(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> (Value, Value) {
        self.span(list, |heap, e| !pred(heap, e))
    }

    /// All elements satisfying the predicate, in input order.
    pub fn filter(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        let mut kept = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            if pred(self, &element) {
                kept.push(element);
            }
        }
        self.list(&kept)
    }

    /// Linear-update filter: relinks the kept cells of the argument.
    pub fn n_filter(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        let mut head = Value::Nil;
        let mut last: Option<PairId> = None;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            current = self.cdr(id);
            if pred(self, self.car_ref(id)) {
                match last {
                    None => head = Value::Pair(id),
                    Some(p) => self.set_cdr(p, Value::Pair(id)),
                }
                last = Some(id);
            }
        }
        if let Some(p) = last {
            self.set_cdr(p, Value::Nil);
        }
        head
    }

    /// All elements not satisfying the predicate, in input order.
    pub fn remove(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        self.filter(list, |heap, e| !pred(heap, e))
    }

    pub fn n_remove(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> Value {
        self.n_filter(list, |heap, e| !pred(heap, e))
    }

    /// Partition into the elements that satisfy the predicate and those
    /// that do not, both in input order.
    pub fn partition(
        &mut self,
        list: &Value,
        mut pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> (Value, Value) {
        let mut ins = Vec::new();
        let mut outs = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            if pred(self, &element) {
                ins.push(element);
            } else {
                outs.push(element);
            }
        }
        let ins = self.list(&ins);
        let outs = self.list(&outs);
        (ins, outs)
    }

    pub fn n_partition(
        &mut self,
        list: &Value,
        pred: impl FnMut(&Heap, &Value) -> bool,
    ) -> (Value, Value) {
        self.partition(list, pred)
    }

    /// Delete all elements structurally equal to x.
    pub fn delete(&mut self, list: &Value, x: &Value) -> Value {
        self.remove(list, |heap, e| heap.equal(e, x))
    }

    pub fn n_delete(&mut self, list: &Value, x: &Value) -> Value {
        self.n_remove(list, |heap, e| heap.equal(e, x))
    }

    /// Remove duplicate elements; the first occurrence of each element is
    /// the one retained. Quadratic in the list length.
    pub fn delete_duplicates(&mut self, list: &Value) -> Value {
        let mut kept: Vec<Value> = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            if !kept.iter().any(|seen| self.equal(seen, &element)) {
                kept.push(element);
            }
        }
        self.list(&kept)
    }

    pub fn n_delete_duplicates(&mut self, list: &Value) -> Value {
        let mut head = Value::Nil;
        let mut last: Option<PairId> = None;
        let mut kept: Vec<Value> = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            current = self.cdr(id);
            let element = self.car(id);
            if kept.iter().any(|seen| self.equal(seen, &element)) {
                continue;
            }
            kept.push(element);
            match last {
                None => head = Value::Pair(id),
                Some(p) => self.set_cdr(p, Value::Pair(id)),
            }
            last = Some(id);
        }
        if let Some(p) = last {
            self.set_cdr(p, Value::Nil);
        }
        head
    }

    /// Zip the lists into a list of rows, stopping with the shortest:
    ///
    ///   zip([(1 2 3), (a b)]) => ((1 a) (2 b))
    pub fn zip(&mut self, lists: &[Value]) -> Value {
        let mut rows = Vec::new();
        let mut currents: Vec<Value> = lists.to_vec();
        'outer: loop {
            let mut cars = Vec::with_capacity(currents.len());
            for current in &currents {
                match current {
                    Value::Pair(id) => cars.push(self.car(*id)),
                    _ => break 'outer,
                }
            }
            for current in currents.iter_mut() {
                let id = current.as_pair().unwrap();
                *current = self.cdr(id);
            }
            let row = self.list(&cars);
            rows.push(row);
        }
        self.list(&rows)
    }

    /// Unzip a list of rows into n lists of columns. Rows shorter than n
    /// stop contributing to their missing columns.
    pub fn unzip(&mut self, list: &Value, n: usize) -> Vec<Value> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); n];
        let rows = self.list_to_vec(list);
        for row in rows {
            for (i, column) in columns.iter_mut().enumerate() {
                if let Some(element) = self.list_ref(&row, i) {
                    column.push(element);
                }
            }
        }
        columns.into_iter().map(|c| self.list(&c)).collect()
    }
}
