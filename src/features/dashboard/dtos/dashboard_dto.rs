use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::dtos::ReportResponseDto;
use crate::features::reports::models::{IssueCategory, ReportStatus};

/// Personal statistics for the signed-in citizen
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitizenDashboardDto {
    pub total: i64,
    pub submitted: i64,
    pub in_progress: i64,
    pub resolved: i64,
    /// None until the citizen has submitted a report
    pub most_common_category: Option<IssueCategory>,
    /// Newest first
    pub recent_reports: Vec<ReportResponseDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: ReportStatus,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountDto {
    pub category: IssueCategory,
    pub label: String,
    pub count: i64,
}

/// City-wide statistics for authorities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorityOverviewDto {
    pub total: i64,
    /// Submitted plus in progress
    pub pending: i64,
    pub resolved: i64,
    pub by_status: Vec<StatusCountDto>,
    pub by_category: Vec<CategoryCountDto>,
}
