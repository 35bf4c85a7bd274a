// ReviewService - patient reviews of doctors

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{IdGenerator, ReviewStore, ViewerContext};
use crate::models::{current_time_secs, Comment, Page, RecordId, ReviewSubmission};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    ids: Arc<IdGenerator>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Create or replace the viewer's review of a doctor.
    ///
    /// Returns the stored comment and `true` when it did not exist before.
    /// Existing votes on a replaced review are kept.
    pub async fn submit_review(
        &self,
        viewer: &ViewerContext,
        submission: ReviewSubmission,
    ) -> AppResult<(Comment, bool)> {
        let author_id = viewer.require_user()?;
        submission.validate()?;

        if !self.store.doctor_exists(submission.doctor_id).await? {
            return Err(AppError::NotFound(format!(
                "Doctor {} not found",
                submission.doctor_id
            )));
        }

        let now = current_time_secs();
        let candidate = Comment {
            id: self.ids.next_id(),
            doctor_id: submission.doctor_id,
            author_id,
            rating: submission.rating,
            text: submission.text,
            votes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let (comment, created) = self.store.upsert_comment(&candidate).await?;
        info!(
            "Review {} of doctor {} by {} {} ({})",
            comment.id,
            comment.doctor_id,
            author_id,
            if created { "created" } else { "updated" },
            viewer.request_id
        );
        Ok((comment, created))
    }

    pub async fn list_comments(&self, doctor_id: RecordId, page: Page) -> AppResult<Vec<Comment>> {
        debug!("Listing comments of doctor {} {:?}", doctor_id, page);
        self.store.list_comments(doctor_id, page).await
    }
}
