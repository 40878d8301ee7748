// Slick List Library - Folds, Maps, and Unfolds
//
// The fundamental iterators and constructors over lists. Every operation
// traverses left to right; the n-ary variants terminate when the shortest
// argument list runs out. Closures receive the heap so they can allocate.

use crate::heap::Heap;
use crate::types::{PairId, Value};

impl Heap {
    /// The fundamental list iterator:
    ///
    ///   fold((e1 e2 ... en), init, f) = f(... f(f(init, e1), e2) ..., en)
    ///
    /// The list must be finite.
    pub fn fold(
        &mut self,
        list: &Value,
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, Value) -> Value,
    ) -> Value {
        let mut acc = init;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            acc = f(self, acc, element);
        }
        acc
    }

    /// The fundamental list recursion operator:
    ///
    ///   fold_right((e1 e2 ... en), init, f) = f(e1, f(e2, ... f(en, init)))
    pub fn fold_right(
        &mut self,
        list: &Value,
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, Value) -> Value,
    ) -> Value {
        let elements = self.list_to_vec(list);
        let mut acc = init;
        for element in elements.into_iter().rev() {
            acc = f(self, acc, element);
        }
        acc
    }

    /// fold over several lists in lockstep, stopping with the shortest.
    pub fn fold_n(
        &mut self,
        lists: &[Value],
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, &[Value]) -> Value,
    ) -> Value {
        let mut acc = init;
        let mut currents: Vec<Value> = lists.to_vec();
        loop {
            let mut cars = Vec::with_capacity(currents.len());
            for current in &currents {
                match current {
                    Value::Pair(id) => cars.push(self.car(*id)),
                    _ => return acc,
                }
            }
            for current in currents.iter_mut() {
                let id = current.as_pair().unwrap();
                *current = self.cdr(id);
            }
            acc = f(self, acc, &cars);
        }
    }

    /// fold_right over several lists in lockstep.
    pub fn fold_right_n(
        &mut self,
        lists: &[Value],
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, &[Value]) -> Value,
    ) -> Value {
        let mut rows: Vec<Vec<Value>> = Vec::new();
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
            rows.push(cars);
        }
        let mut acc = init;
        for row in rows.into_iter().rev() {
            acc = f(self, acc, &row);
        }
        acc
    }

    /// Like fold, but f is applied to successive sublists rather than to
    /// elements. f may reliably assign to the cdr of the pair it is given.
    pub fn pair_fold(
        &mut self,
        list: &Value,
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, PairId) -> Value,
    ) -> Value {
        let mut acc = init;
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            current = self.cdr(id);
            acc = f(self, acc, id);
        }
        acc
    }

    /// pair_fold in fold_right order.
    pub fn pair_fold_right(
        &mut self,
        list: &Value,
        init: Value,
        mut f: impl FnMut(&mut Heap, Value, PairId) -> Value,
    ) -> Value {
        let mut pairs = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            pairs.push(id);
            current = self.cdr(id);
        }
        let mut acc = init;
        for id in pairs.into_iter().rev() {
            acc = f(self, acc, id);
        }
        acc
    }

    /// A variant of fold that uses the first element as the seed; init is
    /// only used for the empty list.
    pub fn reduce(
        &mut self,
        list: &Value,
        init: Value,
        f: impl FnMut(&mut Heap, Value, Value) -> Value,
    ) -> Value {
        match list {
            Value::Pair(id) => {
                let seed = self.car(*id);
                let rest = self.cdr(*id);
                self.fold(&rest, seed, f)
            }
            _ => init,
        }
    }

    /// The fold_right variant of reduce.
    pub fn reduce_right(
        &mut self,
        list: &Value,
        init: Value,
        f: impl FnMut(&mut Heap, Value, Value) -> Value,
    ) -> Value {
        let elements = self.list_to_vec(list);
        match elements.split_last() {
            None => init,
            Some((last, front)) => {
                let mut acc = last.clone();
                let mut f = f;
                for element in front.iter().rev() {
                    acc = f(self, acc, element.clone());
                }
                acc
            }
        }
    }

    /// The fundamental recursive list constructor: generate seeds with
    /// next, map them to elements, and stop when done answers true.
    pub fn unfold<S>(
        &mut self,
        seed: S,
        mut done: impl FnMut(&S) -> bool,
        mut element: impl FnMut(&mut Heap, &S) -> Value,
        mut next: impl FnMut(S) -> S,
    ) -> Value {
        let mut elements = Vec::new();
        let mut seed = seed;
        while !done(&seed) {
            elements.push(element(self, &seed));
            seed = next(seed);
        }
        self.list(&elements)
    }

    /// The iterative counterpart of unfold: elements are produced in
    /// reverse and consed onto tail.
    pub fn unfold_right<S>(
        &mut self,
        seed: S,
        mut done: impl FnMut(&S) -> bool,
        mut element: impl FnMut(&mut Heap, &S) -> Value,
        mut next: impl FnMut(S) -> S,
        tail: Value,
    ) -> Value {
        let mut result = tail;
        let mut seed = seed;
        while !done(&seed) {
            let e = element(self, &seed);
            result = self.pair(e, result);
            seed = next(seed);
        }
        result
    }

    /// Apply f to each element, in order, and return the list of results.
    pub fn map(
        &mut self,
        list: &Value,
        mut f: impl FnMut(&mut Heap, Value) -> Value,
    ) -> Value {
        let mut results = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            results.push(f(self, element));
        }
        self.list(&results)
    }

    /// Linear-update map: overwrites each car with the mapped value.
    pub fn n_map(
        &mut self,
        list: &Value,
        mut f: impl FnMut(&mut Heap, Value) -> Value,
    ) -> Value {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            let mapped = f(self, element);
            self.set_car(id, mapped);
        }
        list.clone()
    }

    /// map over several lists in lockstep, stopping with the shortest.
    pub fn map_n(
        &mut self,
        lists: &[Value],
        mut f: impl FnMut(&mut Heap, &[Value]) -> Value,
    ) -> Value {
        let mut results = Vec::new();
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
            results.push(f(self, &cars));
        }
        self.list(&results)
    }

    /// Like map, called for effect.
    pub fn for_each(&mut self, list: &Value, mut f: impl FnMut(&mut Heap, Value)) {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            f(self, element);
        }
    }

    /// for_each over several lists in lockstep.
    pub fn for_each_n(&mut self, lists: &[Value], mut f: impl FnMut(&mut Heap, &[Value])) {
        let mut currents: Vec<Value> = lists.to_vec();
        loop {
            let mut cars = Vec::with_capacity(currents.len());
            for current in &currents {
                match current {
                    Value::Pair(id) => cars.push(self.car(*id)),
                    _ => return,
                }
            }
            for current in currents.iter_mut() {
                let id = current.as_pair().unwrap();
                *current = self.cdr(id);
            }
            f(self, &cars);
        }
    }

    /// Like for_each, but f is applied to successive sublists.
    pub fn pair_for_each(&mut self, list: &Value, mut f: impl FnMut(&mut Heap, PairId)) {
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            current = self.cdr(id);
            f(self, id);
        }
    }

    /// Map f over the list and append the resulting lists together.
    pub fn append_map(
        &mut self,
        list: &Value,
        mut f: impl FnMut(&mut Heap, Value) -> Value,
    ) -> Value {
        let mut pieces = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            pieces.push(f(self, element));
        }
        self.append(&pieces)
    }

    /// Map f over the list, keeping only the present results, in order.
    pub fn filter_map(
        &mut self,
        list: &Value,
        mut f: impl FnMut(&mut Heap, Value) -> Option<Value>,
    ) -> Value {
        let mut results = Vec::new();
        let mut current = list.clone();
        while let Value::Pair(id) = current {
            let element = self.car(id);
            current = self.cdr(id);
            if let Some(mapped) = f(self, element) {
                results.push(mapped);
            }
        }
        self.list(&results)
    }
}
