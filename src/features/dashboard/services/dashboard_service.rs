use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::{
    AuthorityOverviewDto, CategoryCountDto, CitizenDashboardDto, StatusCountDto,
};
use crate::features::reports::models::{IssueCategory, ReportStatus};
use crate::features::reports::repositories::ReportRepository;
use crate::shared::constants::RECENT_REPORTS_LIMIT;

/// Report counts for every status, zeros included
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusCounts {
    pub submitted: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

impl StatusCounts {
    pub fn from_rows(rows: &[(ReportStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                ReportStatus::Submitted => counts.submitted += count,
                ReportStatus::InProgress => counts.in_progress += count,
                ReportStatus::Resolved => counts.resolved += count,
            }
        }
        counts
    }

    pub fn get(&self, status: ReportStatus) -> i64 {
        match status {
            ReportStatus::Submitted => self.submitted,
            ReportStatus::InProgress => self.in_progress,
            ReportStatus::Resolved => self.resolved,
        }
    }

    pub fn total(&self) -> i64 {
        self.submitted + self.in_progress + self.resolved
    }

    /// Not yet resolved
    pub fn pending(&self) -> i64 {
        self.submitted + self.in_progress
    }
}

/// Free-text issue type counts folded into the display taxonomy, in
/// `IssueCategory::ALL` order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCounts(Vec<(IssueCategory, i64)>);

impl CategoryCounts {
    pub fn from_rows(rows: &[(String, i64)]) -> Self {
        let mut counts: Vec<(IssueCategory, i64)> =
            IssueCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for (issue_type, count) in rows {
            let category = IssueCategory::from_issue_type(issue_type);
            if let Some(entry) = counts.iter_mut().find(|(c, _)| *c == category) {
                entry.1 += count;
            }
        }
        Self(counts)
    }

    /// Category with the most reports; ties go to the earlier category
    pub fn most_common(&self) -> Option<IssueCategory> {
        let mut best: Option<(IssueCategory, i64)> = None;
        for (category, count) in &self.0 {
            if *count > 0 && best.is_none_or(|(_, top)| *count > top) {
                best = Some((*category, *count));
            }
        }
        best.map(|(category, _)| category)
    }

    pub fn entries(&self) -> &[(IssueCategory, i64)] {
        &self.0
    }
}

/// Aggregated views over reports for citizens and authorities
pub struct DashboardService {
    reports: Arc<dyn ReportRepository>,
}

impl DashboardService {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    pub async fn citizen_dashboard(&self, user: &AuthenticatedUser) -> Result<CitizenDashboardDto> {
        let statuses = StatusCounts::from_rows(&self.reports.count_by_status(Some(&user.sub)).await?);
        let categories =
            CategoryCounts::from_rows(&self.reports.count_by_issue_type(Some(&user.sub)).await?);
        let recent = self.reports.list_by_user(&user.sub).await?;

        Ok(CitizenDashboardDto {
            total: statuses.total(),
            submitted: statuses.submitted,
            in_progress: statuses.in_progress,
            resolved: statuses.resolved,
            most_common_category: categories.most_common(),
            recent_reports: recent
                .into_iter()
                .take(RECENT_REPORTS_LIMIT as usize)
                .map(Into::into)
                .collect(),
        })
    }

    pub async fn authority_overview(&self) -> Result<AuthorityOverviewDto> {
        let statuses = StatusCounts::from_rows(&self.reports.count_by_status(None).await?);
        let categories = CategoryCounts::from_rows(&self.reports.count_by_issue_type(None).await?);

        Ok(AuthorityOverviewDto {
            total: statuses.total(),
            pending: statuses.pending(),
            resolved: statuses.resolved,
            by_status: ReportStatus::ALL
                .iter()
                .map(|s| StatusCountDto {
                    status: *s,
                    label: s.label().to_string(),
                    count: statuses.get(*s),
                })
                .collect(),
            by_category: categories
                .entries()
                .iter()
                .map(|(category, count)| CategoryCountDto {
                    category: *category,
                    label: category.label().to_string(),
                    count: *count,
                })
                .collect(),
        })
    }
}
