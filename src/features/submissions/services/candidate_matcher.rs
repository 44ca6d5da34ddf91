use std::sync::Arc;

use crate::core::error::Result;
use crate::features::reports::models::Report;
use crate::features::reports::repositories::ReportRepository;
use crate::features::submissions::fingerprint::Fingerprint;

/// Finds existing reports that share at least one fingerprint keyword with a
/// new submission
pub struct CandidateMatcher {
    reports: Arc<dyn ReportRepository>,
}

impl CandidateMatcher {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    /// Candidates oldest first. An empty fingerprint matches nothing and
    /// never reaches the store.
    pub async fn find_candidates(&self, fingerprint: &Fingerprint) -> Result<Vec<Report>> {
        if fingerprint.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = self
            .reports
            .find_sharing_keywords(fingerprint.match_keys())
            .await?;

        candidates.retain(|r| fingerprint.overlaps(&r.fingerprint_keywords));
        candidates.sort_by_key(|r| (r.created_at, r.id));

        tracing::debug!(
            "Fingerprint {:?} matched {} candidate(s)",
            fingerprint.match_keys(),
            candidates.len()
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{report_at, InMemoryReportRepository};

    #[tokio::test]
    async fn test_candidate_iff_keywords_intersect() {
        let a = report_at("2024-01-01T00:00:00Z", &["graffiti", "brick", "alley"]);
        let b = report_at("2024-01-05T00:00:00Z", &["graffiti", "brick", "alley"]);
        let unrelated = report_at("2024-01-03T00:00:00Z", &["pothole", "asphalt"]);
        let repo = Arc::new(InMemoryReportRepository::with_reports(vec![
            b.clone(),
            unrelated,
            a.clone(),
        ]));
        let matcher = CandidateMatcher::new(repo);

        let fingerprint = Fingerprint::normalize(["graffiti", "brick", "park"]);
        let candidates = matcher.find_candidates(&fingerprint).await.unwrap();

        let ids: Vec<_> = candidates.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_empty_fingerprint_skips_store() {
        let repo = Arc::new(InMemoryReportRepository::with_reports(vec![report_at(
            "2024-01-01T00:00:00Z",
            &["pothole"],
        )]));
        let matcher = CandidateMatcher::new(repo.clone());

        let candidates = matcher.find_candidates(&Fingerprint::empty()).await.unwrap();

        assert!(candidates.is_empty());
        assert!(repo.keyword_queries().is_empty());
    }

    #[tokio::test]
    async fn test_query_uses_first_ten_keywords_only() {
        let late_match = report_at("2024-01-01T00:00:00Z", &["k12"]);
        let early_match = report_at("2024-01-02T00:00:00Z", &["k2"]);
        let repo = Arc::new(InMemoryReportRepository::with_reports(vec![
            late_match,
            early_match.clone(),
        ]));
        let matcher = CandidateMatcher::new(repo.clone());
        let fingerprint = Fingerprint::normalize((1..=15).map(|i| format!("k{}", i)));

        let candidates = matcher.find_candidates(&fingerprint).await.unwrap();

        let queries = repo.keyword_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].len(), 10);
        assert_eq!(queries[0].last().map(String::as_str), Some("k10"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, early_match.id);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let repo = Arc::new(InMemoryReportRepository::new());
        repo.fail_next_query();
        let matcher = CandidateMatcher::new(repo);

        let result = matcher
            .find_candidates(&Fingerprint::normalize(["pothole"]))
            .await;

        assert!(matches!(
            result,
            Err(crate::core::error::AppError::Database(_))
        ));
    }
}
