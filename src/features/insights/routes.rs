use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::insights::handlers;
use crate::features::insights::services::InsightService;

pub fn routes(insight_service: Arc<InsightService>) -> Router {
    Router::new()
        .route("/api/authority/insights", post(handlers::ask_insight))
        .with_state(insight_service)
}
