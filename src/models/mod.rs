// Domain records stored by the review service and the views derived from them

pub mod comment;
pub mod doctor;
pub mod rating;
pub mod reference;

pub use comment::{Comment, ReviewSubmission, Vote};
pub use doctor::{Contact, Doctor, DoctorDetail, DoctorProfile, DoctorView, Education, Experience, RankedDoctor};
pub use rating::RatingSummary;
pub use reference::{Hospital, Profession};

use serde::Deserialize;

/// Record identifier, generated by `IdGenerator`
pub type RecordId = i64;

/// Unix timestamp in seconds
pub type Timestamp = i64;

pub fn current_time_secs() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Skip/limit window over an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    /// Negative skips clamp to zero; a non-positive limit falls back to `default_limit`
    pub fn new(skip: i64, limit: i64, default_limit: u64) -> Self {
        Self {
            skip: skip.max(0) as u64,
            limit: if limit <= 0 { default_limit } else { limit as u64 },
        }
    }
}

/// Raw `skip`/`limit`/`term` query parameters as clients send them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
}

impl ListQuery {
    pub fn page(&self, default_limit: u64) -> Page {
        Page::new(self.skip, self.limit, default_limit)
    }
}
