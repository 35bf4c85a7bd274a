// Review store interface - the persistence seam for ranking, reviews and votes

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Comment, Doctor, DoctorView, Hospital, Page, Profession, RatingSummary, RecordId, Vote};
use crate::votes::{VoteIntent, VoteWrite};

/// Store operations the service layer relies on.
///
/// Implementations own all durable state and are the only point of
/// concurrency control; callers hold no shared mutable state of their own.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn health_check(&self) -> AppResult<()>;

    // Reference data
    async fn create_profession(&self, profession: &Profession) -> AppResult<()>;
    async fn list_professions(&self) -> AppResult<Vec<Profession>>;
    async fn profession_exists(&self, id: RecordId) -> AppResult<bool>;
    async fn create_hospital(&self, hospital: &Hospital) -> AppResult<()>;
    async fn list_hospitals(&self) -> AppResult<Vec<Hospital>>;
    async fn hospital_exists(&self, id: RecordId) -> AppResult<bool>;

    // Doctors
    /// Insert or replace the profile owned by `doctor.user_id`. Returns the
    /// stored profile and whether it was newly created.
    async fn upsert_doctor(&self, doctor: &Doctor) -> AppResult<(Doctor, bool)>;
    async fn doctor_exists(&self, id: RecordId) -> AppResult<bool>;
    /// Every doctor with both reference entities present, in insertion order
    async fn ranking_candidates(&self) -> AppResult<Vec<DoctorView>>;
    async fn doctor_view(&self, id: RecordId) -> AppResult<Option<DoctorView>>;
    async fn doctor_view_by_user(&self, user_id: RecordId) -> AppResult<Option<DoctorView>>;

    // Rating aggregation
    /// One summary per doctor that has comments, ordered by doctor id
    async fn doctor_ratings(&self) -> AppResult<Vec<(RecordId, RatingSummary)>>;
    /// `None` when the doctor has no comments
    async fn doctor_rating(&self, doctor_id: RecordId) -> AppResult<Option<RatingSummary>>;

    // Comments
    /// Insert, or replace rating and text of the comment already written by
    /// the same author for the same doctor. Votes are left untouched.
    async fn upsert_comment(&self, comment: &Comment) -> AppResult<(Comment, bool)>;
    async fn list_comments(&self, doctor_id: RecordId, page: Page) -> AppResult<Vec<Comment>>;
    async fn comment_exists(&self, id: RecordId) -> AppResult<bool>;

    // Votes
    /// Apply `intent` for `voter_id` as one atomic conditional update.
    /// Fails with `NotFound` when the comment does not exist.
    async fn apply_vote(
        &self,
        comment_id: RecordId,
        voter_id: RecordId,
        intent: VoteIntent,
    ) -> AppResult<VoteWrite>;
    async fn votes_for(&self, comment_id: RecordId) -> AppResult<Vec<Vote>>;
}
