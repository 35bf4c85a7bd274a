use std::collections::HashMap;

use crate::models::{RatingSummary, RecordId};

/// Bayesian weighted average of a doctor's ratings against the global prior.
///
/// ```text
/// (doctor.value * doctor.count + global.value * global.count) / (doctor.count + global.count)
/// ```
///
/// Few reviews pull the score toward the global mean; many reviews converge on
/// the doctor's own average. Both counts zero scores 0.
pub fn rank_score(doctor: RatingSummary, global: RatingSummary) -> f64 {
    let weight = doctor.count + global.count;
    if weight == 0 {
        return 0.0;
    }
    (doctor.total() + global.total()) / weight as f64
}

/// Per-doctor rating groups plus the global prior folded from them once per query
#[derive(Debug, Clone, Default)]
pub struct RatingSnapshot {
    pub global: RatingSummary,
    per_doctor: HashMap<RecordId, RatingSummary>,
}

impl RatingSnapshot {
    pub fn from_doctor_ratings(groups: Vec<(RecordId, RatingSummary)>) -> Self {
        let global = groups
            .iter()
            .fold(RatingSummary::EMPTY, |acc, (_, summary)| acc.merge(*summary));
        Self {
            global,
            per_doctor: groups.into_iter().collect(),
        }
    }

    /// Doctors without comments read as `(0, 0)`
    pub fn for_doctor(&self, doctor_id: RecordId) -> RatingSummary {
        self.per_doctor
            .get(&doctor_id)
            .copied()
            .unwrap_or(RatingSummary::EMPTY)
    }

    pub fn score(&self, doctor_id: RecordId) -> f64 {
        rank_score(self.for_doctor(doctor_id), self.global)
    }
}
