use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::submissions::handlers::submission_handler;
use crate::features::submissions::services::SubmissionService;

/// Photo-to-report submission routes. Auth middleware is applied by the caller.
pub fn routes(service: Arc<SubmissionService>) -> Router {
    Router::new()
        .route("/api/submissions/drafts", post(submission_handler::create_draft))
        .route("/api/submissions", post(submission_handler::submit))
        .route(
            "/api/submissions/adjudicate",
            post(submission_handler::adjudicate),
        )
        .with_state(service)
}
