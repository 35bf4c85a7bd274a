// ViewerContext Middleware - resolves the caller from gateway headers
// The gateway authenticates sessions and forwards the user id; this layer only trusts it.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::infrastructure::viewer::ViewerContext;
use crate::models::RecordId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach an `Arc<ViewerContext>` to every request
pub async fn viewer_context_middleware(mut request: Request, next: Next) -> Response {
    let viewer = Arc::new(viewer_from_headers(request.headers()));
    debug!(
        "Request {} {} as {:?} ({})",
        request.method(),
        request.uri().path(),
        viewer.user_id,
        viewer.request_id
    );
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

/// Unparseable identities degrade to anonymous; write paths reject them later
pub fn viewer_from_headers(headers: &HeaderMap) -> ViewerContext {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req-{}", Uuid::new_v4()));

    ViewerContext::new(extract_user_id(headers), request_id)
}

fn extract_user_id(headers: &HeaderMap) -> Option<RecordId> {
    let raw = headers.get(USER_ID_HEADER)?;
    match raw.to_str().ok().and_then(|s| s.trim().parse::<RecordId>().ok()) {
        Some(id) if id > 0 => Some(id),
        _ => {
            warn!("Ignoring malformed {} header", USER_ID_HEADER);
            None
        }
    }
}
