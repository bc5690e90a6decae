//! Conflation rules for payload types.
//!
//! The relay only knows how to fold values together through [`Conflate`].
//! Payloads pick their own semantics:
//! - Aggregates (sales, volumes): sum/max fields, never lose a contribution
//! - Latest-wins values (tickers, positions): [`Latest`] overwrites
//! - Batches: `Vec<T>` appends, preserving every element

use serde::{Deserialize, Serialize};

/// Merge capability required from every value flowing through a relay.
///
/// Folding every submitted value into [`Conflate::identity`], in arrival order,
/// must yield the accumulated effect of all of them.
pub trait Conflate: Sized + Send + 'static {
    /// Fold `incoming` into the accumulated value.
    fn combine(self, incoming: Self) -> Self;

    /// The neutral value the accumulator is reset to after a delivery.
    fn identity() -> Self;
}

/// Latest-wins wrapper: only the freshest value survives a merge.
///
/// Use this for data where intermediate states carry no information of their
/// own. Every earlier value in a batch is overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Latest<T>(pub Option<T>);

impl<T> Latest<T> {
    pub fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: Send + 'static> Conflate for Latest<T> {
    #[inline]
    fn combine(self, incoming: Self) -> Self {
        match incoming.0 {
            Some(_) => incoming,
            None => self,
        }
    }

    #[inline]
    fn identity() -> Self {
        Self(None)
    }
}

/// Batching rule: append, keep everything in arrival order.
impl<T: Send + 'static> Conflate for Vec<T> {
    #[inline]
    fn combine(mut self, mut incoming: Self) -> Self {
        self.append(&mut incoming);
        self
    }

    #[inline]
    fn identity() -> Self {
        Vec::new()
    }
}

/// Fold a sequence of values starting from identity.
pub fn fold_all<T: Conflate>(values: impl IntoIterator<Item = T>) -> T {
    values.into_iter().fold(T::identity(), T::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_overwrites() {
        let merged = Latest::new(1).combine(Latest::new(2)).combine(Latest::new(3));
        assert_eq!(merged, Latest::new(3));
    }

    #[test]
    fn test_latest_identity_does_not_erase() {
        let merged = Latest::new("btc").combine(Latest::identity());
        assert_eq!(merged.get(), Some(&"btc"));
        assert_eq!(Latest::<u8>::identity().into_inner(), None);
    }

    #[test]
    fn test_vec_appends_in_order() {
        let merged = vec![1, 2].combine(vec![3]).combine(Vec::identity()).combine(vec![4, 5]);
        assert_eq!(merged, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_fold_all() {
        let folded: Vec<u32> = fold_all([vec![1], vec![2, 3], vec![]]);
        assert_eq!(folded, vec![1, 2, 3]);

        let empty: Latest<u32> = fold_all(std::iter::empty());
        assert_eq!(empty, Latest(None));
    }
}
