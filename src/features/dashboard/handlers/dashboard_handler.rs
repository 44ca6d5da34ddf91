use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::guards::{RequireAuthority, RequireCitizen};
use crate::features::dashboard::dtos::*;
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Get the signed-in citizen's report statistics
#[utoipa::path(
    get,
    path = "/api/dashboard/me",
    tag = "dashboard",
    responses(
        (status = 200, description = "Citizen dashboard", body = ApiResponse<CitizenDashboardDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_citizen_dashboard(
    RequireCitizen(user): RequireCitizen,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<CitizenDashboardDto>>, AppError> {
    let dashboard = service.citizen_dashboard(&user).await?;
    Ok(Json(ApiResponse::success(Some(dashboard), None, None)))
}

/// Get city-wide report statistics (authority)
#[utoipa::path(
    get,
    path = "/api/authority/overview",
    tag = "dashboard",
    responses(
        (status = 200, description = "Authority overview", body = ApiResponse<AuthorityOverviewDto>),
        (status = 403, description = "Authority access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_authority_overview(
    RequireAuthority(_authority): RequireAuthority,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<AuthorityOverviewDto>>, AppError> {
    let overview = service.authority_overview().await?;
    Ok(Json(ApiResponse::success(Some(overview), None, None)))
}
