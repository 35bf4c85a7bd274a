// ViewerContext - who is making the request
// Built once per request by the middleware; services read it, never mutate it.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    /// Authenticated user, `None` for anonymous readers
    pub user_id: Option<RecordId>,
    pub request_id: String,
}

impl ViewerContext {
    pub fn new(user_id: Option<RecordId>, request_id: String) -> Self {
        ViewerContext { user_id, request_id }
    }

    pub fn authenticated(user_id: RecordId) -> Self {
        Self::new(Some(user_id), format!("user-{}-{}", user_id, Uuid::new_v4()))
    }

    pub fn anonymous() -> Self {
        Self::new(None, format!("anon-{}", Uuid::new_v4()))
    }

    /// Identity for operations that write on the viewer's behalf
    pub fn require_user(&self) -> AppResult<RecordId> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("Sign in to perform this action".to_string()))
    }
}
