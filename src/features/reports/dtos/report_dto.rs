use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::reports::models::{
    corroboration_note, DuplicateSubmission, IssueCategory, Report, ReportSeverity, ReportStatus,
};
use crate::features::reports::repositories::ReportFilter;

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub reference_number: String,
    pub user_id: String,
    pub user_full_name: String,
    pub issue_type: String,
    /// Display taxonomy bucket derived from `issue_type`
    pub category: IssueCategory,
    pub severity: ReportSeverity,
    pub description: String,
    pub image_url: String,
    pub resolution_image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub fingerprint_keywords: Vec<String>,
    pub status: ReportStatus,
    pub status_label: String,
    pub authority_id: Option<String>,
    pub upvote_count: i32,
    /// Present when other citizens confirmed this issue
    pub corroboration_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            category: r.category(),
            status_label: r.status.label().to_string(),
            corroboration_note: corroboration_note(r.upvote_count),
            id: r.id,
            reference_number: r.reference_number,
            user_id: r.user_id,
            user_full_name: r.user_full_name,
            issue_type: r.issue_type,
            severity: r.severity,
            description: r.description,
            image_url: r.image_url,
            resolution_image_url: r.resolution_image_url,
            latitude: r.latitude,
            longitude: r.longitude,
            location_name: r.location_name,
            fingerprint_keywords: r.fingerprint_keywords,
            status: r.status,
            authority_id: r.authority_id,
            upvote_count: r.upvote_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DuplicateSubmissionResponseDto {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: String,
    pub user_full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<DuplicateSubmission> for DuplicateSubmissionResponseDto {
    fn from(d: DuplicateSubmission) -> Self {
        Self {
            id: d.id,
            report_id: d.report_id,
            user_id: d.user_id,
            user_full_name: d.user_full_name,
            created_at: d.created_at,
        }
    }
}

/// Request DTO for changing a report's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateReportStatusDto {
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateResponseDto {
    pub report: ReportResponseDto,
    /// Whether the submitter was notified of the change
    pub notification_sent: bool,
}

/// Filters for the authority report listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportFilterQuery {
    /// Only reports in this status
    pub status: Option<ReportStatus>,
    /// Only reports of this severity
    pub severity: Option<ReportSeverity>,
}

impl From<ReportFilterQuery> for ReportFilter {
    fn from(q: ReportFilterQuery) -> Self {
        Self {
            status: q.status,
            severity: q.severity,
        }
    }
}
