use serde::{Deserialize, Serialize};

/// Average and count of a group of comment ratings.
///
/// An empty group is `(0, 0)`, never a missing value, so it can be merged and
/// scored like any other group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub value: f64,
    pub count: u64,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary { value: 0.0, count: 0 };

    pub fn new(value: f64, count: u64) -> Self {
        if count == 0 {
            return Self::EMPTY;
        }
        Self { value, count }
    }

    /// Summary of `count` ratings adding up to `total`
    pub fn from_total(total: f64, count: u64) -> Self {
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            value: total / count as f64,
            count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sum of the ratings this summary stands for
    pub fn total(&self) -> f64 {
        self.value * self.count as f64
    }

    /// Count-weighted merge of two groups
    pub fn merge(self, other: RatingSummary) -> RatingSummary {
        let count = self.count + other.count;
        if count == 0 {
            return Self::EMPTY;
        }
        RatingSummary {
            value: (self.total() + other.total()) / count as f64,
            count,
        }
    }
}
