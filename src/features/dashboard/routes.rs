use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Citizen and authority dashboard routes
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/dashboard/me", get(handlers::get_citizen_dashboard))
        .route(
            "/api/authority/overview",
            get(handlers::get_authority_overview),
        )
        .with_state(dashboard_service)
}
