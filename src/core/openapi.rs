use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::insights::{dtos as insights_dtos, handlers as insights_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::submissions::{
    adjudication as submissions_adjudication, dtos as submissions_dtos,
    handlers as submissions_handlers,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users_handlers::profile_handler::get_profile,
        users_handlers::profile_handler::update_profile,
        // Submissions
        submissions_handlers::submission_handler::create_draft,
        submissions_handlers::submission_handler::submit,
        submissions_handlers::submission_handler::adjudicate,
        // Reports (citizen)
        reports_handlers::report_handler::list_reports,
        reports_handlers::report_handler::get_report,
        reports_handlers::report_handler::delete_report,
        // Reports (authority)
        reports_handlers::authority_handler::list_reports,
        reports_handlers::authority_handler::update_report_status,
        reports_handlers::authority_handler::upload_resolution_photo,
        reports_handlers::authority_handler::list_duplicates,
        // Dashboard
        dashboard_handlers::get_citizen_dashboard,
        dashboard_handlers::get_authority_overview,
        // Insights
        insights_handlers::ask_insight,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Users
            users_dtos::UserProfileResponseDto,
            users_dtos::UpdateProfileDto,
            ApiResponse<users_dtos::UserProfileResponseDto>,
            // Submissions
            submissions_adjudication::AdjudicationDecision,
            submissions_dtos::DraftResponseDto,
            submissions_dtos::SubmitReportDto,
            submissions_dtos::AdjudicateSubmissionDto,
            submissions_dtos::CandidateReportDto,
            submissions_dtos::SubmissionResponseDto,
            ApiResponse<submissions_dtos::SubmissionResponseDto>,
            // Reports
            reports_models::ReportStatus,
            reports_models::ReportSeverity,
            reports_models::IssueCategory,
            reports_dtos::ReportResponseDto,
            reports_dtos::DuplicateSubmissionResponseDto,
            reports_dtos::UpdateReportStatusDto,
            reports_dtos::StatusUpdateResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<Vec<reports_dtos::DuplicateSubmissionResponseDto>>,
            ApiResponse<reports_dtos::StatusUpdateResponseDto>,
            // Dashboard
            dashboard_dtos::CitizenDashboardDto,
            dashboard_dtos::StatusCountDto,
            dashboard_dtos::CategoryCountDto,
            dashboard_dtos::AuthorityOverviewDto,
            ApiResponse<dashboard_dtos::CitizenDashboardDto>,
            ApiResponse<dashboard_dtos::AuthorityOverviewDto>,
            // Insights
            insights_dtos::InsightQueryDto,
            insights_dtos::InsightResponseDto,
            ApiResponse<insights_dtos::InsightResponseDto>,
        )
    ),
    tags(
        (name = "users", description = "Citizen profile and notification preferences"),
        (name = "submissions", description = "Photo submission, fingerprinting and duplicate adjudication"),
        (name = "reports", description = "Citizen report tracking"),
        (name = "authority", description = "Report triage for authorities"),
        (name = "dashboard", description = "Citizen and authority dashboards"),
        (name = "insights", description = "Natural-language questions over recent reports"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "CivicLens API",
        version = "0.1.0",
        description = "API documentation for CivicLens",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
