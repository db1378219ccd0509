//! Cartesian tag-set sequences
//!
//! An odometer over per-key countable sequences. Keys are ordered ascending
//! left to right and the rightmost key varies fastest, so successive
//! combinations (and the serialized keys built from them) ascend
//! lexicographically. The total combination count is the product of the
//! member counts; an empty tag set yields exactly one empty combination.

use super::countable::CountableSequence;

/// Iterates every combination of the member sequences' values
#[derive(Debug)]
pub struct TagsSequence {
    keys: Vec<String>,
    values: Vec<CountableSequence>,
    total: u64,
    remaining: u64,
    started: bool,
}

impl TagsSequence {
    /// Builds the product sequence; `keys` must already be sorted ascending
    /// and aligned with `values`
    pub fn new(keys: Vec<String>, values: Vec<CountableSequence>) -> Self {
        assert_eq!(keys.len(), values.len(), "tag keys and values must align");
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        let total = values
            .iter()
            .fold(1u64, |acc, s| acc.saturating_mul(s.count()));
        TagsSequence {
            keys,
            values,
            total,
            remaining: total,
            started: false,
        }
    }

    /// Advances to the next combination; false once all have been produced
    pub fn next(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        if self.started {
            // Rightmost sequence advances first; a wrap carries leftward.
            for seq in self.values.iter_mut().rev() {
                if seq.next() {
                    break;
                }
            }
        } else {
            self.started = true;
        }
        self.remaining -= 1;
        true
    }

    /// Total number of combinations
    pub fn count(&self) -> u64 {
        self.total
    }

    /// The current combination as ordered `(key, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(CountableSequence::value))
    }

    /// Appends the current combination to `key` as `,k=v` pairs
    pub fn write_key(&self, key: &mut Vec<u8>) {
        for (k, v) in self.pairs() {
            key.push(b',');
            key.extend_from_slice(k.as_bytes());
            key.push(b'=');
            key.extend_from_slice(v.as_bytes());
        }
    }
}
