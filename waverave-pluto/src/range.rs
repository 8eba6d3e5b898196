//! Capability ranges.
//!
//! Everything a [`Source`][crate::Source] reports about what the hardware can
//! do is expressed as a [`Range`] (one contiguous span with a step size) or a
//! [`MetaRange`] (an ordered list of ranges, used for discrete value sets
//! like the supported sample rates).
//!
//! ```
//! use waverave_pluto::{Generation, Range};
//!
//! let freqs = Generation::Pluto.freq_range();
//! assert_eq!(freqs, Range::new(70e6, 6000e6, 1.0));
//! assert!(freqs.contains(2.4e9));
//!
//! let rates = Generation::Pluto.sample_rates();
//! assert_eq!(rates.values().collect::<Vec<_>>(), [2.5e6, 5e6, 10e6, 20e6]);
//! ```

/// A contiguous, inclusive span of values with a step size.
///
/// A range with `start == stop` and a step of 0 represents a single value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    /// Lowest value, inclusive.
    pub start: f64,
    /// Highest value, inclusive.
    pub stop: f64,
    /// Step between valid values. 0 means continuous.
    pub step: f64,
}

impl Range {
    /// Create a range spanning `start..=stop` in increments of `step`.
    pub const fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Create a range holding exactly one value.
    pub const fn single(value: f64) -> Self {
        Self {
            start: value,
            stop: value,
            step: 0.0,
        }
    }

    /// Check if the value lies within the span. Doesn't check step alignment.
    pub fn contains(&self, value: f64) -> bool {
        (self.start..=self.stop).contains(&value)
    }

    /// Clamp a value into the range, optionally rounding it onto the step grid.
    pub fn clip(&self, value: f64, clip_step: bool) -> f64 {
        let value = value.clamp(self.start, self.stop);
        if clip_step && self.step > 0.0 {
            let steps = ((value - self.start) / self.step).round();
            (self.start + steps * self.step).min(self.stop)
        } else {
            value
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.stop {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..={} (step {})", self.start, self.stop, self.step)
        }
    }
}

/// An ordered list of [`Range`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaRange(Vec<Range>);

impl MetaRange {
    /// Create an empty meta-range.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a range.
    pub fn push(&mut self, range: Range) {
        self.0.push(range);
    }

    /// Lowest value across all ranges, if there are any.
    pub fn start(&self) -> Option<f64> {
        self.0.iter().map(|r| r.start).reduce(f64::min)
    }

    /// Highest value across all ranges, if there are any.
    pub fn stop(&self) -> Option<f64> {
        self.0.iter().map(|r| r.stop).reduce(f64::max)
    }

    /// Check if any of the ranges contains the value.
    pub fn contains(&self, value: f64) -> bool {
        self.0.iter().any(|r| r.contains(value))
    }

    /// Iterate over the start value of each range. For a discrete set built
    /// from [`Range::single`], this is every value in the set.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|r| r.start)
    }

    /// Iterate over the ranges.
    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.0.iter()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no ranges.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Range>> for MetaRange {
    fn from(value: Vec<Range>) -> Self {
        Self(value)
    }
}

impl FromIterator<Range> for MetaRange {
    fn from_iter<T: IntoIterator<Item = Range>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
