mod duplicate_submission;
mod report;

pub use duplicate_submission::{CreateDuplicateSubmission, DuplicateSubmission};
pub use report::{
    corroboration_note, CreateReport, IssueCategory, Report, ReportSeverity, ReportStatus,
};
