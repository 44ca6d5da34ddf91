use std::sync::Arc;

use axum::{
    routing::{get, patch, put},
    Router,
};

use crate::features::reports::handlers::{authority_handler, report_handler};
use crate::features::reports::services::ReportService;

/// Citizen report tracking and authority triage routes.
/// Auth middleware is applied by the caller.
pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reports", get(report_handler::list_reports))
        .route(
            "/api/reports/{id}",
            get(report_handler::get_report).delete(report_handler::delete_report),
        )
        .route(
            "/api/authority/reports",
            get(authority_handler::list_reports),
        )
        .route(
            "/api/authority/reports/{id}/status",
            patch(authority_handler::update_report_status),
        )
        .route(
            "/api/authority/reports/{id}/resolution-photo",
            put(authority_handler::upload_resolution_photo),
        )
        .route(
            "/api/authority/reports/{id}/duplicates",
            get(authority_handler::list_duplicates),
        )
        .with_state(service)
}
