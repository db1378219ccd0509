//! K-way series merge
//!
//! Merges any number of series generators into one stream ordered by series
//! key, ties broken by input order. An index min-heap tracks the next series
//! of every live input: construction primes each input once, and each
//! `next()` first advances the input served by the previous call, restoring
//! the heap. No series are buffered; the heap holds input indices only.

use std::cmp::Ordering;

use super::generator::SeriesGenerator;
use crate::sequence::TimeValues;

/// Globally ordered stream over multiple series generators
#[derive(Debug)]
pub struct MergedSeriesGenerator {
    inputs: Vec<SeriesGenerator>,
    heap: Vec<usize>,
    remaining: u64,
    started: bool,
}

impl MergedSeriesGenerator {
    /// Merge without a series cap
    pub fn new(inputs: Vec<SeriesGenerator>) -> Self {
        MergedSeriesGenerator::with_limit(inputs, u64::MAX)
    }

    /// Merge emitting at most `limit` series overall
    pub fn with_limit(mut inputs: Vec<SeriesGenerator>, limit: u64) -> Self {
        // Prime every input; only those with at least one series enter the heap.
        let mut heap = Vec::with_capacity(inputs.len());
        for (i, gen) in inputs.iter_mut().enumerate() {
            if gen.next() {
                heap.push(i);
            }
        }
        let mut merged = MergedSeriesGenerator {
            inputs,
            heap,
            remaining: limit,
            started: false,
        };
        merged.heapify();
        merged
    }

    /// Advances to the next series; false forever once exhausted
    pub fn next(&mut self) -> bool {
        if self.remaining == 0 || self.heap.is_empty() {
            return false;
        }
        if self.started {
            // The previous call served the top input; move it along or drop it.
            if self.inputs[self.heap[0]].next() {
                self.sift_down(0);
            } else {
                let last = self.heap.len() - 1;
                self.heap.swap(0, last);
                self.heap.truncate(last);
                self.sift_down(0);
            }
            if self.heap.is_empty() {
                return false;
            }
        } else {
            self.started = true;
        }
        self.remaining -= 1;
        true
    }

    /// Key of the current series; only valid after `next()` returned true
    pub fn key(&self) -> &[u8] {
        self.current().key()
    }

    pub fn measurement(&self) -> &str {
        self.current().measurement()
    }

    pub fn field(&self) -> &str {
        self.current().field()
    }

    /// Tag pairs of the current series
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.current().tags()
    }

    /// Value sequence of the current series
    pub fn time_values(&mut self) -> &mut TimeValues {
        match self.heap.first() {
            Some(&i) => self.inputs[i].time_values(),
            None => panic!("no current series: merged generator is exhausted"),
        }
    }

    fn current(&self) -> &SeriesGenerator {
        match self.heap.first() {
            Some(&i) => &self.inputs[i],
            None => panic!("no current series: merged generator is exhausted"),
        }
    }

    fn heapify(&mut self) {
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let (ia, ib) = (self.heap[a], self.heap[b]);
        match self.inputs[ia].key().cmp(self.inputs[ib].key()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => ia < ib,
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            if left >= self.heap.len() {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < self.heap.len() && self.less(right, left) {
                child = right;
            }
            if self.less(child, i) {
                self.heap.swap(child, i);
                i = child;
            } else {
                break;
            }
        }
    }
}
