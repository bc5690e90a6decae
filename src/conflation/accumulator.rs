//! Single-slot accumulator holding the conflated, undelivered value.

use std::mem;

use super::rules::Conflate;

/// The relay's only buffer. Memory stays at one `T` no matter how far the
/// consumer falls behind.
#[derive(Debug)]
pub struct Accumulator<T: Conflate> {
    value: T,
    /// Submissions folded into `value` since the last reset.
    merged: u64,
}

impl<T: Conflate> Accumulator<T> {
    pub fn new() -> Self {
        Self {
            value: T::identity(),
            merged: 0,
        }
    }

    /// Fold an incoming value into the slot.
    pub fn merge(&mut self, incoming: T) {
        let current = mem::replace(&mut self.value, T::identity());
        self.value = current.combine(incoming);
        self.merged += 1;
    }

    /// Take the accumulated value out, resetting the slot to identity.
    ///
    /// Returns the value together with the number of submissions it covers.
    pub fn take(&mut self) -> (T, u64) {
        let merged = mem::take(&mut self.merged);
        (mem::replace(&mut self.value, T::identity()), merged)
    }

    /// Put back a value whose handoff was refused.
    ///
    /// Only called right after [`Accumulator::take`], before anything new has
    /// been merged in.
    pub fn restore(&mut self, value: T, merged: u64) {
        debug_assert!(self.is_empty(), "restore into a non-empty accumulator");
        self.value = value;
        self.merged = merged;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merged == 0
    }

    /// Number of submissions currently folded into the slot.
    #[inline]
    pub fn merged(&self) -> u64 {
        self.merged
    }
}

impl<T: Conflate> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflation::rules::Latest;

    #[test]
    fn test_starts_empty_at_identity() {
        let mut acc: Accumulator<Vec<u8>> = Accumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.merged(), 0);
        assert_eq!(acc.take(), (Vec::new(), 0));
    }

    #[test]
    fn test_merge_then_take_resets() {
        let mut acc = Accumulator::new();
        acc.merge(vec![1]);
        acc.merge(vec![2, 3]);
        assert_eq!(acc.merged(), 2);

        let (value, merged) = acc.take();
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(merged, 2);

        // Reset to identity
        assert!(acc.is_empty());
        assert_eq!(acc.take(), (Vec::new(), 0));
    }

    #[test]
    fn test_restore_after_refused_handoff() {
        let mut acc = Accumulator::new();
        acc.merge(Latest::new(7));
        let (value, merged) = acc.take();

        acc.restore(value, merged);
        assert_eq!(acc.merged(), 1);

        // New data still merges on top of the restored value
        acc.merge(Latest::new(8));
        let (value, merged) = acc.take();
        assert_eq!(value, Latest::new(8));
        assert_eq!(merged, 2);
    }

    #[test]
    fn test_identity_submission_still_counts() {
        // An identity submission is still a submission that must be delivered.
        let mut acc: Accumulator<Vec<u8>> = Accumulator::new();
        acc.merge(Vec::new());
        assert!(!acc.is_empty());
    }
}
