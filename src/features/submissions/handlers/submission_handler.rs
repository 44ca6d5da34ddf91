use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::guards::RequireCitizen;
use crate::features::submissions::adjudication::SubmissionState;
use crate::features::submissions::dtos::{
    AdjudicateSubmissionDto, SubmissionResponseDto, SubmitReportDto,
};
use crate::features::submissions::services::SubmissionService;
use crate::shared::types::ApiResponse;
use crate::shared::upload::PhotoForm;

type SubmissionResponse = (StatusCode, Json<ApiResponse<SubmissionResponseDto>>);

fn respond(state: SubmissionState) -> SubmissionResponse {
    let (status, message) = match &state {
        SubmissionState::Drafting(_) => (StatusCode::OK, "Photo analyzed. Review and submit."),
        SubmissionState::AwaitingAdjudication { .. } => (
            StatusCode::OK,
            "Similar reports found. Is your issue one of these?",
        ),
        SubmissionState::Merged { .. } => (
            StatusCode::OK,
            "Thanks! Your confirmation was added to the existing report.",
        ),
        SubmissionState::CreatedNew(_) => (StatusCode::CREATED, "Report submitted"),
    };

    (
        status,
        Json(ApiResponse::success(
            Some(state.into()),
            Some(message.to_string()),
            None,
        )),
    )
}

/// Upload a photo and get an analyzed draft
///
/// Accepts multipart/form-data with `photo`, `latitude` and `longitude`.
/// The photo is stored, then issue analysis, location naming and
/// fingerprinting run concurrently. No report is created.
#[utoipa::path(
    post,
    path = "/api/submissions/drafts",
    request_body(content_type = "multipart/form-data", description = "Form with `photo`, `latitude` and `longitude`"),
    responses(
        (status = 200, description = "Draft ready for review", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Missing photo or coordinates, or unsupported image type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "submissions"
)]
pub async fn create_draft(
    RequireCitizen(user): RequireCitizen,
    State(service): State<Arc<SubmissionService>>,
    multipart: Multipart,
) -> Result<SubmissionResponse> {
    let mut form = PhotoForm::read(multipart).await?;
    let photo = form.take_photo()?;
    let latitude = form.number("latitude")?;
    let longitude = form.number("longitude")?;

    let state = service
        .create_draft(&user, latitude, longitude, photo)
        .await?;
    Ok(respond(state))
}

/// Submit a reviewed draft
///
/// Creates the report right away when no existing report shares a
/// fingerprint keyword. Otherwise returns the candidates for adjudication.
#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = SubmitReportDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<SubmissionResponseDto>),
        (status = 200, description = "Possible duplicates found", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Photo belongs to another user"),
        (status = 409, description = "Draft was already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "submissions"
)]
pub async fn submit(
    RequireCitizen(user): RequireCitizen,
    State(service): State<Arc<SubmissionService>>,
    ValidatedJson(dto): ValidatedJson<SubmitReportDto>,
) -> Result<SubmissionResponse> {
    let state = service.submit(&user, dto.into()).await?;
    Ok(respond(state))
}

/// Confirm or reject the duplicate candidates
#[utoipa::path(
    post,
    path = "/api/submissions/adjudicate",
    request_body = AdjudicateSubmissionDto,
    responses(
        (status = 200, description = "Merged into an existing report", body = ApiResponse<SubmissionResponseDto>),
        (status = 201, description = "Created as a new report", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Candidates no longer exist or draft was already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "submissions"
)]
pub async fn adjudicate(
    RequireCitizen(user): RequireCitizen,
    State(service): State<Arc<SubmissionService>>,
    ValidatedJson(dto): ValidatedJson<AdjudicateSubmissionDto>,
) -> Result<SubmissionResponse> {
    let state = service
        .adjudicate(&user, dto.submission.into(), dto.decision, &dto.candidate_ids)
        .await?;
    Ok(respond(state))
}
