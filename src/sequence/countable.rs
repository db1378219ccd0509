//! Countable string sequences
//!
//! Finite, resettable cursors over tag values. Both variants share one wrap
//! contract: `next()` advances the cursor, and when it runs past the last
//! value it returns false with the cursor back on the first value. The
//! cartesian product's carry loop relies on that contract.

use crate::schema::model::TAG_TEMPLATE_PLACEHOLDER;

/// A finite, resettable sequence of tag values
#[derive(Debug, Clone)]
pub enum CountableSequence {
    Array(StringArraySequence),
    Counter(CounterFormatSequence),
}

impl CountableSequence {
    /// Advances to the next value; false when wrapping back to the first
    pub fn next(&mut self) -> bool {
        match self {
            CountableSequence::Array(s) => s.next(),
            CountableSequence::Counter(s) => s.next(),
        }
    }

    /// The value currently under the cursor
    pub fn value(&self) -> &str {
        match self {
            CountableSequence::Array(s) => s.value(),
            CountableSequence::Counter(s) => s.value(),
        }
    }

    /// Rewinds to the first value
    pub fn reset(&mut self) {
        match self {
            CountableSequence::Array(s) => s.reset(),
            CountableSequence::Counter(s) => s.reset(),
        }
    }

    /// Total number of distinct values
    pub fn count(&self) -> u64 {
        match self {
            CountableSequence::Array(s) => s.count(),
            CountableSequence::Counter(s) => s.count(),
        }
    }
}

/// Cursor over a fixed set of values, held sorted and de-duplicated
#[derive(Debug, Clone)]
pub struct StringArraySequence {
    values: Vec<String>,
    index: usize,
}

impl StringArraySequence {
    /// Builds a sequence over `values`, sorting and de-duplicating them
    pub fn new(mut values: Vec<String>) -> Self {
        debug_assert!(!values.is_empty());
        values.sort();
        values.dedup();
        StringArraySequence { values, index: 0 }
    }

    pub fn next(&mut self) -> bool {
        self.index += 1;
        if self.index == self.values.len() {
            self.index = 0;
            return false;
        }
        true
    }

    pub fn value(&self) -> &str {
        &self.values[self.index]
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn count(&self) -> u64 {
        self.values.len() as u64
    }
}

/// Cursor over `count` generated values, formed by substituting a
/// zero-padded counter into a template
///
/// The pad width is the decimal width of the last counter value, so the
/// generated values sort lexicographically in generation order.
#[derive(Debug, Clone)]
pub struct CounterFormatSequence {
    template: String,
    width: usize,
    start: u64,
    end: u64,
    current: u64,
    value: String,
}

impl CounterFormatSequence {
    /// Builds a sequence yielding `template` with the counter values
    /// `start..start + count` substituted at the `{}` placeholder
    pub fn new(template: impl Into<String>, start: u64, count: u64) -> Self {
        debug_assert!(count > 0);
        let end = start + count;
        let mut seq = CounterFormatSequence {
            template: template.into(),
            width: decimal_width(end - 1),
            start,
            end,
            current: start,
            value: String::new(),
        };
        seq.render();
        seq
    }

    fn render(&mut self) {
        let counter = format!("{:0width$}", self.current, width = self.width);
        self.value = self.template.replace(TAG_TEMPLATE_PLACEHOLDER, &counter);
    }

    pub fn next(&mut self) -> bool {
        self.current += 1;
        if self.current == self.end {
            self.current = self.start;
            self.render();
            return false;
        }
        self.render();
        true
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn reset(&mut self) {
        self.current = self.start;
        self.render();
    }

    pub fn count(&self) -> u64 {
        self.end - self.start
    }
}

fn decimal_width(n: u64) -> usize {
    if n == 0 {
        1
    } else {
        (n.ilog10() + 1) as usize
    }
}
