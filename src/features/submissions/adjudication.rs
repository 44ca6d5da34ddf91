//! Lifecycle of one citizen submission through duplicate adjudication.
//!
//! ```text
//! Drafting ──submit──▶ CreatedNew                    (no candidates)
//!    │
//!    └──submit──▶ AwaitingAdjudication ──confirm──▶ Merged
//!                                      └──reject───▶ CreatedNew
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::models::{DuplicateSubmission, Report};
use crate::features::submissions::models::SubmissionDraft;

#[derive(Debug, Clone)]
pub enum SubmissionState {
    /// Photo stored and analyzed; nothing persisted as a report yet
    Drafting(SubmissionDraft),
    /// Existing reports share keywords; waiting for the citizen's decision
    AwaitingAdjudication { candidates: Vec<Report> },
    /// Folded into an existing report as a corroboration
    Merged {
        report: Report,
        duplicate: DuplicateSubmission,
    },
    /// Persisted as an independent report
    CreatedNew(Report),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Drafting(_) => "drafting",
            SubmissionState::AwaitingAdjudication { .. } => "awaiting_adjudication",
            SubmissionState::Merged { .. } => "merged",
            SubmissionState::CreatedNew(_) => "created_new",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Merged { .. } | SubmissionState::CreatedNew(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjudicationDecision {
    /// The submission shows an issue already reported
    ConfirmDuplicate,
    /// The submission is a different issue
    RejectDuplicate,
}

/// Report a confirmed duplicate merges into: the oldest by `created_at`,
/// ties broken by id
pub fn select_canonical(candidates: &[Report]) -> Option<&Report> {
    candidates.iter().min_by_key(|r| (r.created_at, r.id))
}
