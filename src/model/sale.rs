use serde::{Deserialize, Serialize};

use crate::conflation::Conflate;

/// A sale, or the sum of several sales conflated together.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Sale {
    pub dollars: f64,
    /// Milliseconds since the feed started. The latest one survives a merge.
    pub timestamp_ms: u64,
    /// How many individual sales this value covers
    #[serde(default = "one")]
    pub count: u64,
}

fn one() -> u64 {
    1
}

impl Sale {
    pub fn new(dollars: f64, timestamp_ms: u64) -> Self {
        Self {
            dollars,
            timestamp_ms,
            count: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Conflate for Sale {
    fn combine(self, incoming: Self) -> Self {
        Self {
            dollars: self.dollars + incoming.dollars,
            timestamp_ms: self.timestamp_ms.max(incoming.timestamp_ms),
            count: self.count + incoming.count,
        }
    }

    fn identity() -> Self {
        Self {
            dollars: 0.0,
            timestamp_ms: 0,
            count: 0,
        }
    }
}

impl std::fmt::Display for Sale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "${:.2} at {:.1}s ({} {})",
            self.dollars,
            self.timestamp_ms as f64 / 1000.0,
            self.count,
            if self.count == 1 { "sale" } else { "sales" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflation::rules::fold_all;

    #[test]
    fn test_combine_sums_and_keeps_latest_timestamp() {
        let merged = Sale::new(3.0, 1500).combine(Sale::new(4.0, 1000));
        assert_eq!(merged.dollars, 7.0);
        assert_eq!(merged.timestamp_ms, 1500);
        assert_eq!(merged.count, 2);
    }

    #[test]
    fn test_identity_is_neutral() {
        let sale = Sale::new(5.0, 2000);
        assert_eq!(Sale::identity().combine(sale), sale);
        assert!(Sale::identity().is_empty());
    }

    #[test]
    fn test_fold_preserves_total() {
        let sales = (1..=4).map(|i| Sale::new(i as f64, i * 500));
        let total = fold_all(sales);
        assert_eq!(total.dollars, 10.0);
        assert_eq!(total.timestamp_ms, 2000);
        assert_eq!(total.count, 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(Sale::new(12.0, 3500).to_string(), "$12.00 at 3.5s (1 sale)");
        let merged = Sale::new(1.0, 500).combine(Sale::new(2.0, 1000));
        assert_eq!(merged.to_string(), "$3.00 at 1.0s (2 sales)");
    }

    #[test]
    fn test_parse_without_count() {
        let sale: Sale = serde_json::from_str(r#"{"dollars":2.5,"timestamp_ms":750}"#).unwrap();
        assert_eq!(sale, Sale::new(2.5, 750));
    }
}
