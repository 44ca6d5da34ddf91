use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAuthority;
use crate::features::reports::dtos::{
    DuplicateSubmissionResponseDto, ReportFilterQuery, ReportResponseDto,
    StatusUpdateResponseDto, UpdateReportStatusDto,
};
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use crate::shared::upload::PhotoForm;

/// List all reports (authority)
#[utoipa::path(
    get,
    path = "/api/authority/reports",
    params(ReportFilterQuery, PaginationQuery),
    responses(
        (status = 200, description = "Page of reports, newest first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Authority access required")
    ),
    security(("bearer_auth" = [])),
    tag = "authority"
)]
pub async fn list_reports(
    RequireAuthority(_authority): RequireAuthority,
    State(service): State<Arc<ReportService>>,
    Query(filter): Query<ReportFilterQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = service.list(&filter.into(), &pagination).await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::paginated(total, &pagination)),
    )))
}

/// Update report status (authority)
#[utoipa::path(
    patch,
    path = "/api/authority/reports/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusUpdateResponseDto>),
        (status = 400, description = "Resolution photo missing"),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "authority"
)]
pub async fn update_report_status(
    RequireAuthority(authority): RequireAuthority,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReportStatusDto>,
) -> Result<Json<ApiResponse<StatusUpdateResponseDto>>> {
    let (report, notification_sent) = service.update_status(&authority, id, dto.status).await?;
    let message = format!("Status updated to {}", report.status.label());
    Ok(Json(ApiResponse::success(
        Some(StatusUpdateResponseDto {
            report: report.into(),
            notification_sent,
        }),
        Some(message),
        None,
    )))
}

/// Upload the photo proving an issue was fixed (authority)
///
/// Accepts multipart/form-data with a `photo` part.
#[utoipa::path(
    put,
    path = "/api/authority/reports/{id}/resolution-photo",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body(content_type = "multipart/form-data", description = "Form with a `photo` part"),
    responses(
        (status = 200, description = "Resolution photo stored", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Missing or invalid photo"),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "authority"
)]
pub async fn upload_resolution_photo(
    RequireAuthority(_authority): RequireAuthority,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let mut form = PhotoForm::read(multipart).await?;
    let photo = form.take_photo()?;

    let report = service.set_resolution_photo(id, photo).await?;
    Ok(Json(ApiResponse::success(
        Some(report.into()),
        Some("Resolution photo uploaded".to_string()),
        None,
    )))
}

/// List citizens who confirmed a report as a duplicate of theirs (authority)
#[utoipa::path(
    get,
    path = "/api/authority/reports/{id}/duplicates",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Duplicate submissions", body = ApiResponse<Vec<DuplicateSubmissionResponseDto>>),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "authority"
)]
pub async fn list_duplicates(
    RequireAuthority(_authority): RequireAuthority,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<DuplicateSubmissionResponseDto>>>> {
    let duplicates = service.list_duplicates(id).await?;
    let total = duplicates.len() as i64;
    let dtos: Vec<DuplicateSubmissionResponseDto> =
        duplicates.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::total(total)),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::{ReportSeverity, ReportStatus};
    use crate::features::reports::routes;
    use crate::features::users::services::UserProfileService;
    use crate::shared::test_helpers::{
        report_fixture, with_authority_auth, InMemoryPhotoStorage, InMemoryReportRepository,
        InMemoryUserProfileRepository,
    };
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server(reports: Arc<InMemoryReportRepository>) -> TestServer {
        let profiles = Arc::new(UserProfileService::new(Arc::new(
            InMemoryUserProfileRepository::new(),
        )));
        let service = Arc::new(ReportService::new(
            reports,
            Arc::new(InMemoryPhotoStorage::new()),
            profiles,
        ));
        TestServer::new(with_authority_auth(routes::routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_severity() {
        let mut high = report_fixture("c1", &["pothole"]);
        high.severity = ReportSeverity::High;
        let mut resolved = report_fixture("c2", &["graffiti"]);
        resolved.status = ReportStatus::Resolved;
        let reports = Arc::new(InMemoryReportRepository::with_reports(vec![
            high,
            resolved,
            report_fixture("c3", &["trash"]),
        ]));
        let server = server(reports);

        let response = server
            .get("/api/authority/reports")
            .add_query_param("severity", "high")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["severity"], "high");

        let response = server
            .get("/api/authority/reports")
            .add_query_param("status", "resolved")
            .add_query_param("page_size", "10")
            .await;
        let body: Value = response.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["meta"]["page_size"], 10);
        assert_eq!(body["data"][0]["status"], "resolved");
    }

    #[tokio::test]
    async fn test_resolve_flow_over_http() {
        let report = report_fixture("c1", &["streetlight"]);
        let id = report.id;
        let reports = Arc::new(InMemoryReportRepository::with_reports(vec![report]));
        let server = server(reports.clone());

        let response = server
            .patch(&format!("/api/authority/reports/{}/status", id))
            .json(&json!({"status": "resolved"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let form = MultipartForm::new().add_part(
            "photo",
            Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .file_name("fixed.png")
                .mime_type("image/png"),
        );
        server
            .put(&format!("/api/authority/reports/{}/resolution-photo", id))
            .multipart(form)
            .await
            .assert_status_ok();

        let response = server
            .patch(&format!("/api/authority/reports/{}/status", id))
            .json(&json!({"status": "resolved"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["report"]["status_label"], "Resolved");
        assert_eq!(body["data"]["notification_sent"], false);
        assert_eq!(reports.get(id).unwrap().status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolution_photo_rejects_non_images() {
        let report = report_fixture("c1", &["pothole"]);
        let id = report.id;
        let server = server(Arc::new(InMemoryReportRepository::with_reports(vec![
            report,
        ])));

        let form = MultipartForm::new().add_part(
            "photo",
            Part::bytes(b"%PDF".to_vec())
                .file_name("doc.pdf")
                .mime_type("application/pdf"),
        );
        let response = server
            .put(&format!("/api/authority/reports/{}/resolution-photo", id))
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
