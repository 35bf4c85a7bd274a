use serde::{Deserialize, Serialize};

use super::{RecordId, Timestamp};
use crate::error::{AppError, AppResult};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// One patient's review of one doctor. At most one exists per (author, doctor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub author_id: RecordId,
    pub rating: f64,
    pub text: String,
    /// Oldest first, unique by voter
    pub votes: Vec<Vote>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: RecordId,
    pub is_positive: bool,
}

/// Review body as submitted by an authenticated author
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSubmission {
    pub doctor_id: RecordId,
    pub rating: f64,
    pub text: String,
}

impl ReviewSubmission {
    pub fn validate(&self) -> AppResult<()> {
        if !self.rating.is_finite() || self.rating < MIN_RATING || self.rating > MAX_RATING {
            return Err(AppError::Validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, self.rating
            )));
        }
        if self.text.trim().is_empty() {
            return Err(AppError::Validation("text is required".to_string()));
        }
        Ok(())
    }
}


#[cfg(test)]
impl Comment {
    pub fn fixture(id: RecordId, doctor_id: RecordId, author_id: RecordId, rating: f64) -> Self {
        Comment {
            id,
            doctor_id,
            author_id,
            rating,
            text: format!("{} stars", rating),
            votes: Vec::new(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }
}
