// Vote Ledger - one like/dislike per voter per comment

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ReviewStore;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{RecordId, Vote};

/// What a voter asks for, independent of what they currently hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteIntent {
    Positive,
    Negative,
    Clear,
}

impl VoteIntent {
    /// Vote state the voter should hold afterwards
    pub fn target(self) -> Option<bool> {
        match self {
            VoteIntent::Positive => Some(true),
            VoteIntent::Negative => Some(false),
            VoteIntent::Clear => None,
        }
    }
}

/// Outcome of one intent against one voter's current vote.
///
/// | current  | Positive        | Negative         | Clear     |
/// |----------|-----------------|------------------|-----------|
/// | none     | Inserted(true)  | Inserted(false)  | Unchanged |
/// | positive | Unchanged       | Flipped(false)   | Removed   |
/// | negative | Flipped(true)   | Unchanged        | Removed   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteTransition {
    Inserted { is_positive: bool },
    Flipped { is_positive: bool },
    Removed,
    Unchanged,
}

impl VoteTransition {
    pub fn resolve(current: Option<bool>, intent: VoteIntent) -> Self {
        match (current, intent.target()) {
            (None, None) => VoteTransition::Unchanged,
            (None, Some(is_positive)) => VoteTransition::Inserted { is_positive },
            (Some(_), None) => VoteTransition::Removed,
            (Some(held), Some(wanted)) if held == wanted => VoteTransition::Unchanged,
            (Some(_), Some(is_positive)) => VoteTransition::Flipped { is_positive },
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, VoteTransition::Unchanged)
    }
}

/// What the store observed while applying an intent atomically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteWrite {
    /// Vote the voter held immediately before the write
    pub previous: Option<bool>,
    /// Size of the comment's vote set after the write
    pub vote_count: u64,
}

/// Acknowledgment returned to the voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub comment_id: RecordId,
    pub voter_id: RecordId,
    pub transition: VoteTransition,
    pub vote: Option<Vote>,
    pub vote_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub likes: u64,
    pub dislikes: u64,
    pub votes: Vec<Vote>,
}

impl VoteTally {
    pub fn from_votes(votes: Vec<Vote>) -> Self {
        let likes = votes.iter().filter(|v| v.is_positive).count() as u64;
        Self {
            likes,
            dislikes: votes.len() as u64 - likes,
            votes,
        }
    }
}

#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn ReviewStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Apply one voter's intent to a comment's vote set.
    ///
    /// The store performs the match-then-mutate in a single conditional
    /// statement, so concurrent calls from the same voter can never produce
    /// two votes for that voter.
    pub async fn apply_vote(
        &self,
        viewer: &ViewerContext,
        comment_id: RecordId,
        intent: VoteIntent,
    ) -> AppResult<VoteReceipt> {
        let voter_id = viewer.require_user()?;

        let write = self.store.apply_vote(comment_id, voter_id, intent).await?;
        let transition = VoteTransition::resolve(write.previous, intent);

        if transition.is_mutation() {
            info!(
                "Vote on comment {} by {}: {:?} ({})",
                comment_id, voter_id, transition, viewer.request_id
            );
        } else {
            debug!("Vote on comment {} by {} unchanged", comment_id, voter_id);
        }

        Ok(VoteReceipt {
            comment_id,
            voter_id,
            transition,
            vote: intent.target().map(|is_positive| Vote { voter_id, is_positive }),
            vote_count: write.vote_count,
        })
    }

    pub async fn votes_for(&self, comment_id: RecordId) -> AppResult<VoteTally> {
        if !self.store.comment_exists(comment_id).await? {
            return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
        }
        let votes = self.store.votes_for(comment_id).await?;
        Ok(VoteTally::from_votes(votes))
    }

    /// The single vote `voter_id` holds on the comment, if any
    pub async fn vote_of(&self, comment_id: RecordId, voter_id: RecordId) -> AppResult<Option<Vote>> {
        let tally = self.votes_for(comment_id).await?;
        Ok(tally.votes.into_iter().find(|v| v.voter_id == voter_id))
    }
}
