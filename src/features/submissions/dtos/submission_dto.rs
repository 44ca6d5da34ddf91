use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::dtos::{DuplicateSubmissionResponseDto, ReportResponseDto};
use crate::features::reports::models::{IssueCategory, Report, ReportSeverity, ReportStatus};
use crate::features::submissions::adjudication::{AdjudicationDecision, SubmissionState};
use crate::features::submissions::fingerprint::Fingerprint;
use crate::features::submissions::models::{Submission, SubmissionDraft};

/// Analyzed photo returned to the client for review before submitting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DraftResponseDto {
    pub image_url: String,
    /// Send back unchanged when submitting
    pub image_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub issue_type: String,
    pub severity: Option<ReportSeverity>,
    pub description: String,
    /// Keywords used to look for existing reports of the same issue
    pub fingerprint: Vec<String>,
    pub analysis_error: Option<String>,
    pub fingerprint_warning: Option<String>,
}

impl From<SubmissionDraft> for DraftResponseDto {
    fn from(d: SubmissionDraft) -> Self {
        Self {
            image_url: d.image_url,
            image_key: d.image_key,
            latitude: d.latitude,
            longitude: d.longitude,
            location_name: d.location_name,
            issue_type: d.issue_type,
            severity: d.severity,
            description: d.description,
            fingerprint: d.fingerprint.into_keywords(),
            analysis_error: d.analysis_error,
            fingerprint_warning: d.fingerprint_warning,
        }
    }
}

/// Request DTO for submitting a reviewed draft
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitReportDto {
    #[validate(length(min = 1, max = 512, message = "image_key is required"))]
    pub image_key: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,

    #[validate(length(max = 255, message = "Location name must not exceed 255 characters"))]
    #[serde(default)]
    pub location_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Issue type must be 1-100 characters"))]
    pub issue_type: String,

    pub severity: ReportSeverity,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: String,

    /// Keywords from the draft; empty skips the duplicate check
    #[validate(length(max = 50, message = "Fingerprint must not exceed 50 keywords"))]
    #[serde(default)]
    pub fingerprint: Vec<String>,
}

impl From<SubmitReportDto> for Submission {
    fn from(dto: SubmitReportDto) -> Self {
        Self {
            image_key: dto.image_key,
            latitude: dto.latitude,
            longitude: dto.longitude,
            location_name: dto
                .location_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            issue_type: dto.issue_type.trim().to_string(),
            severity: dto.severity,
            description: dto.description.trim().to_string(),
            fingerprint: Fingerprint::normalize(dto.fingerprint),
        }
    }
}

/// Request DTO for deciding whether a submission duplicates the candidates shown
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjudicateSubmissionDto {
    #[validate(nested)]
    pub submission: SubmitReportDto,

    pub decision: AdjudicationDecision,

    /// Ids of the candidates the citizen compared against
    #[serde(default)]
    pub candidate_ids: Vec<Uuid>,
}

/// Existing report shown to the citizen for comparison
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateReportDto {
    pub id: Uuid,
    pub reference_number: String,
    pub issue_type: String,
    pub category: IssueCategory,
    pub description: String,
    pub image_url: String,
    pub location_name: Option<String>,
    pub status: ReportStatus,
    pub status_label: String,
    pub upvote_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for CandidateReportDto {
    fn from(r: Report) -> Self {
        Self {
            category: r.category(),
            status_label: r.status.label().to_string(),
            id: r.id,
            reference_number: r.reference_number,
            issue_type: r.issue_type,
            description: r.description,
            image_url: r.image_url,
            location_name: r.location_name,
            status: r.status,
            upvote_count: r.upvote_count,
            created_at: r.created_at,
        }
    }
}

/// Where a submission stands, tagged by `state`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionResponseDto {
    Drafting {
        draft: DraftResponseDto,
    },
    AwaitingAdjudication {
        candidates: Vec<CandidateReportDto>,
    },
    Merged {
        report: ReportResponseDto,
        duplicate: DuplicateSubmissionResponseDto,
    },
    CreatedNew {
        report: ReportResponseDto,
    },
}

impl From<SubmissionState> for SubmissionResponseDto {
    fn from(state: SubmissionState) -> Self {
        match state {
            SubmissionState::Drafting(draft) => Self::Drafting {
                draft: draft.into(),
            },
            SubmissionState::AwaitingAdjudication { candidates } => Self::AwaitingAdjudication {
                candidates: candidates.into_iter().map(Into::into).collect(),
            },
            SubmissionState::Merged { report, duplicate } => Self::Merged {
                report: report.into(),
                duplicate: duplicate.into(),
            },
            SubmissionState::CreatedNew(report) => Self::CreatedNew {
                report: report.into(),
            },
        }
    }
}
