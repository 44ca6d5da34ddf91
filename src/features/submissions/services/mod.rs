pub mod candidate_matcher;
pub mod fingerprint_extractor;
pub mod issue_analyzer;
pub mod submission_service;

pub use candidate_matcher::CandidateMatcher;
pub use fingerprint_extractor::{FingerprintExtractor, FingerprintOutcome};
pub use issue_analyzer::{IssueAnalysis, IssueAnalyzer};
pub use submission_service::SubmissionService;
