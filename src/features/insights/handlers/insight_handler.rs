use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::guards::RequireAuthority;
use crate::features::insights::dtos::{InsightQueryDto, InsightResponseDto};
use crate::features::insights::services::InsightService;
use crate::shared::types::ApiResponse;

/// Ask a free-text question about recent reports (authority)
#[utoipa::path(
    post,
    path = "/api/authority/insights",
    tag = "insights",
    request_body = InsightQueryDto,
    responses(
        (status = 200, description = "Model-written answer", body = ApiResponse<InsightResponseDto>),
        (status = 400, description = "Empty query"),
        (status = 403, description = "Authority access required"),
        (status = 502, description = "Model unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn ask_insight(
    RequireAuthority(_authority): RequireAuthority,
    State(service): State<Arc<InsightService>>,
    ValidatedJson(dto): ValidatedJson<InsightQueryDto>,
) -> Result<Json<ApiResponse<InsightResponseDto>>, AppError> {
    let answer = service.ask(&dto.query).await?;
    Ok(Json(ApiResponse::success(Some(answer), None, None)))
}
