use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{CreateDuplicateSubmission, Report};
use crate::features::reports::repositories::ReportRepository;
use crate::features::submissions::adjudication::{
    select_canonical, AdjudicationDecision, SubmissionState,
};
use crate::features::submissions::models::{Submission, SubmissionDraft};
use crate::features::submissions::services::{
    CandidateMatcher, FingerprintExtractor, IssueAnalyzer,
};
use crate::features::users::services::UserProfileService;
use crate::modules::geocoding::ReverseGeocoder;
use crate::modules::llm::{PhotoPayload, VisionModel};
use crate::modules::storage::{PhotoKind, PhotoStorage};
use crate::shared::upload::PhotoUpload;
use crate::shared::validation::validate_coordinates;

/// Drives a citizen submission from photo upload to exactly one outcome:
/// a new report or a corroboration of an existing one
pub struct SubmissionService {
    reports: Arc<dyn ReportRepository>,
    storage: Arc<dyn PhotoStorage>,
    profiles: Arc<UserProfileService>,
    analyzer: IssueAnalyzer,
    extractor: FingerprintExtractor,
    matcher: CandidateMatcher,
}

impl SubmissionService {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        storage: Arc<dyn PhotoStorage>,
        profiles: Arc<UserProfileService>,
        model: Arc<dyn VisionModel>,
        geocoder: Option<Arc<dyn ReverseGeocoder>>,
    ) -> Self {
        Self {
            matcher: CandidateMatcher::new(reports.clone()),
            analyzer: IssueAnalyzer::new(model.clone(), geocoder),
            extractor: FingerprintExtractor::new(model),
            reports,
            storage,
            profiles,
        }
    }

    /// Store the photo and run analysis, location naming and fingerprinting
    /// concurrently. Nothing is persisted as a report.
    pub async fn create_draft(
        &self,
        user: &AuthenticatedUser,
        latitude: f64,
        longitude: f64,
        photo: PhotoUpload,
    ) -> Result<SubmissionState> {
        validate_coordinates(latitude, longitude).map_err(AppError::BadRequest)?;

        let stored = self
            .storage
            .store(
                PhotoKind::Report,
                &user.sub,
                photo.extension(),
                &photo.data,
                &photo.content_type,
            )
            .await?;

        let payload = PhotoPayload::new(&photo.content_type, &photo.data);
        let (analysis, location_name, fingerprint) = tokio::join!(
            self.analyzer.analyze(&payload, latitude, longitude),
            self.analyzer.name_location(&payload, latitude, longitude),
            self.extractor.extract(&payload),
        );

        tracing::info!(
            "Draft created for {}: key={}, issue_type='{}', keywords={:?}",
            user.sub,
            stored.key,
            analysis.issue_type,
            fingerprint.fingerprint.keywords()
        );

        Ok(SubmissionState::Drafting(SubmissionDraft {
            image_url: stored.url,
            image_key: stored.key,
            latitude,
            longitude,
            location_name,
            issue_type: analysis.issue_type,
            severity: analysis.severity,
            description: analysis.description,
            fingerprint: fingerprint.fingerprint,
            analysis_error: analysis.error,
            fingerprint_warning: fingerprint.warning,
        }))
    }

    /// Persist immediately when no existing report shares a keyword,
    /// otherwise hand the candidates back for the citizen to judge
    pub async fn submit(
        &self,
        user: &AuthenticatedUser,
        submission: Submission,
    ) -> Result<SubmissionState> {
        self.check_photo_owner(user, &submission)?;
        self.check_draft_unused(&submission).await?;

        let candidates = self.matcher.find_candidates(&submission.fingerprint).await?;
        if candidates.is_empty() {
            let report = self.create_report(user, &submission).await?;
            return Ok(SubmissionState::CreatedNew(report));
        }

        tracing::info!(
            "Submission by {} has {} duplicate candidate(s)",
            user.sub,
            candidates.len()
        );
        Ok(SubmissionState::AwaitingAdjudication { candidates })
    }

    /// Apply the citizen's decision about the candidates they were shown
    pub async fn adjudicate(
        &self,
        user: &AuthenticatedUser,
        submission: Submission,
        decision: AdjudicationDecision,
        candidate_ids: &[Uuid],
    ) -> Result<SubmissionState> {
        self.check_photo_owner(user, &submission)?;
        self.check_draft_unused(&submission).await?;

        match decision {
            AdjudicationDecision::RejectDuplicate => {
                let report = self.create_report(user, &submission).await?;
                Ok(SubmissionState::CreatedNew(report))
            }
            AdjudicationDecision::ConfirmDuplicate => {
                self.merge(user, &submission, candidate_ids).await
            }
        }
    }

    async fn merge(
        &self,
        user: &AuthenticatedUser,
        submission: &Submission,
        candidate_ids: &[Uuid],
    ) -> Result<SubmissionState> {
        if candidate_ids.is_empty() {
            return Err(AppError::Validation(
                "candidate_ids is required to confirm a duplicate".to_string(),
            ));
        }

        let mut candidates = self.reports.find_by_ids(candidate_ids).await?;
        candidates.retain(|r| submission.fingerprint.overlaps(&r.fingerprint_keywords));

        let canonical = select_canonical(&candidates).ok_or_else(|| {
            AppError::Conflict(
                "The reports you compared against no longer exist. Please submit again."
                    .to_string(),
            )
        })?;

        let submitter = self.profiles.get_or_create(user).await?;
        let (report, duplicate) = self
            .reports
            .record_duplicate(&CreateDuplicateSubmission {
                report_id: canonical.id,
                user_id: user.sub.clone(),
                user_full_name: submitter.full_name,
                image_key: submission.image_key.clone(),
            })
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Report {} was removed before it could be corroborated",
                    canonical.id
                ))
            })?;

        tracing::info!(
            "Submission by {} merged into report {} (upvotes now {})",
            user.sub,
            report.reference_number,
            report.upvote_count
        );

        // The photo may still back a report created from the same draft
        if self
            .reports
            .find_by_image_key(&submission.image_key)
            .await?
            .is_some()
        {
            tracing::warn!(
                "Keeping photo {} of merged submission, a report still uses it",
                submission.image_key
            );
        } else if let Err(e) = self.storage.remove(&submission.image_key).await {
            tracing::warn!(
                "Failed to remove photo {} of merged submission: {}",
                submission.image_key,
                e
            );
        }

        Ok(SubmissionState::Merged { report, duplicate })
    }

    async fn create_report(
        &self,
        user: &AuthenticatedUser,
        submission: &Submission,
    ) -> Result<Report> {
        let submitter = self.profiles.get_or_create(user).await?;
        let image_url = self.storage.url_for(&submission.image_key);

        let report = self
            .reports
            .insert(&submission.to_create_report(&user.sub, &submitter.full_name, image_url))
            .await?;

        tracing::info!(
            "Report {} created by {} ({})",
            report.reference_number,
            user.sub,
            report.issue_type
        );
        Ok(report)
    }

    /// A draft resolves to exactly one outcome; replays are conflicts
    async fn check_draft_unused(&self, submission: &Submission) -> Result<()> {
        if self
            .reports
            .is_image_key_consumed(&submission.image_key)
            .await?
        {
            tracing::warn!("Replayed submission for draft photo {}", submission.image_key);
            return Err(AppError::Conflict(
                "This draft has already been submitted".to_string(),
            ));
        }
        Ok(())
    }

    /// The photo must be one this user uploaded through a draft
    fn check_photo_owner(&self, user: &AuthenticatedUser, submission: &Submission) -> Result<()> {
        if self
            .storage
            .owns_key(PhotoKind::Report, &user.sub, &submission.image_key)
        {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "The photo does not belong to this submission".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::{ReportSeverity, ReportStatus};
    use crate::features::submissions::fingerprint::Fingerprint;
    use crate::shared::test_helpers::{
        citizen_user, report_at, InMemoryPhotoStorage, InMemoryReportRepository,
        InMemoryUserProfileRepository, ScriptedVisionModel, ANALYSIS_PROMPT, FINGERPRINT_PROMPT,
        LOCATION_PROMPT,
    };

    struct Fixture {
        service: SubmissionService,
        reports: Arc<InMemoryReportRepository>,
        storage: Arc<InMemoryPhotoStorage>,
        model: Arc<ScriptedVisionModel>,
    }

    fn fixture_with_model(seed: Vec<Report>, model: ScriptedVisionModel) -> Fixture {
        let reports = Arc::new(InMemoryReportRepository::with_reports(seed));
        let storage = Arc::new(InMemoryPhotoStorage::new());
        let profiles = Arc::new(UserProfileService::new(Arc::new(
            InMemoryUserProfileRepository::new(),
        )));
        let model = Arc::new(model);
        Fixture {
            service: SubmissionService::new(
                reports.clone(),
                storage.clone(),
                profiles,
                model.clone(),
                None,
            ),
            reports,
            storage,
            model,
        }
    }

    fn fixture(seed: Vec<Report>) -> Fixture {
        fixture_with_model(seed, ScriptedVisionModel::new())
    }

    /// Graffiti A (2024-01-01) and B (2024-01-05) sharing the same keywords
    fn graffiti_pair() -> (Report, Report) {
        (
            report_at("2024-01-01T00:00:00Z", &["graffiti", "brick", "alley"]),
            report_at("2024-01-05T00:00:00Z", &["graffiti", "brick", "alley"]),
        )
    }

    fn submission(f: &Fixture, keywords: &[&str]) -> Submission {
        let key = format!(
            "{}{}.jpg",
            f.storage.namespace(PhotoKind::Report, &citizen_user().sub),
            Uuid::now_v7()
        );
        f.storage.insert(&key, b"draft-photo");
        Submission {
            image_key: key,
            latitude: 34.0522,
            longitude: -118.2437,
            location_name: Some("Main St".to_string()),
            issue_type: "Graffiti".to_string(),
            severity: ReportSeverity::Medium,
            description: "Tag on the wall".to_string(),
            fingerprint: Fingerprint::normalize(keywords),
        }
    }

    fn jpeg() -> PhotoUpload {
        PhotoUpload::new(vec![0xff, 0xd8, 0xff], "image/jpeg").unwrap()
    }

    #[tokio::test]
    async fn test_draft_combines_analysis_location_and_fingerprint() {
        let f = fixture_with_model(
            vec![],
            ScriptedVisionModel::new()
                .reply(
                    ANALYSIS_PROMPT,
                    r#"{"issue_type": "Pothole", "severity": "high", "description": "Deep pothole."}"#,
                )
                .reply(LOCATION_PROMPT, r#"{"location_name": "Corner of 5th and Main"}"#)
                .reply(
                    FINGERPRINT_PROMPT,
                    r#"{"keywords": ["pothole", "asphalt", "road", "crack"]}"#,
                ),
        );
        let citizen = citizen_user();

        let state = f
            .service
            .create_draft(&citizen, 34.0522, -118.2437, jpeg())
            .await
            .unwrap();

        let SubmissionState::Drafting(draft) = state else {
            panic!("expected a draft");
        };
        assert_eq!(draft.issue_type, "Pothole");
        assert_eq!(draft.severity, Some(ReportSeverity::High));
        assert_eq!(draft.location_name.as_deref(), Some("Corner of 5th and Main"));
        assert_eq!(draft.fingerprint.len(), 4);
        assert_eq!(draft.analysis_error, None);
        assert_eq!(draft.fingerprint_warning, None);
        assert!(f.storage.contains(&draft.image_key));
        assert!(f
            .storage
            .owns_key(PhotoKind::Report, &citizen.sub, &draft.image_key));
        assert!(draft.image_url.ends_with(&draft.image_key));
        assert_eq!(f.reports.len(), 0);
    }

    #[tokio::test]
    async fn test_draft_survives_model_failures() {
        let f = fixture_with_model(
            vec![],
            ScriptedVisionModel::new()
                .fail(ANALYSIS_PROMPT, "boom")
                .fail(LOCATION_PROMPT, "boom")
                .fail(FINGERPRINT_PROMPT, "boom")
                .fail(FINGERPRINT_PROMPT, "boom"),
        );

        let state = f
            .service
            .create_draft(&citizen_user(), 1.0, 2.0, jpeg())
            .await
            .unwrap();

        let SubmissionState::Drafting(draft) = state else {
            panic!("expected a draft");
        };
        assert!(draft.fingerprint.is_empty());
        assert!(draft.fingerprint_warning.is_some());
        assert!(draft.analysis_error.is_some());
        assert_eq!(draft.location_name, None);
    }

    #[tokio::test]
    async fn test_draft_rejects_bad_coordinates_before_any_remote_call() {
        let f = fixture(vec![]);

        let err = f
            .service
            .create_draft(&citizen_user(), 91.0, 0.0, jpeg())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(f.storage.len(), 0);
        assert_eq!(f.model.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_new_issue_on_empty_store_is_created() {
        let f = fixture(vec![]);
        let s = submission(&f, &["pothole", "asphalt", "road", "crack"]);

        let state = f.service.submit(&citizen_user(), s).await.unwrap();

        let SubmissionState::CreatedNew(report) = state else {
            panic!("expected created_new");
        };
        assert_eq!(report.upvote_count, 0);
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.fingerprint_keywords, vec!["pothole", "asphalt", "road", "crack"]);
        assert_eq!(report.user_id, citizen_user().sub);
        assert_eq!(f.reports.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fingerprint_skips_duplicate_check() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a, b]);
        let s = submission(&f, &[]);

        let state = f.service.submit(&citizen_user(), s).await.unwrap();

        assert!(matches!(state, SubmissionState::CreatedNew(ref r) if r.upvote_count == 0));
        assert!(f.reports.keyword_queries().is_empty());
        assert_eq!(f.reports.len(), 3);
    }

    #[tokio::test]
    async fn test_overlap_waits_for_adjudication_without_writing() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![b.clone(), a.clone()]);
        let s = submission(&f, &["graffiti", "brick", "park"]);

        let state = f.service.submit(&citizen_user(), s).await.unwrap();

        let SubmissionState::AwaitingAdjudication { candidates } = state else {
            panic!("expected awaiting_adjudication");
        };
        let ids: Vec<Uuid> = candidates.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(f.reports.len(), 2);
    }

    #[tokio::test]
    async fn test_confirm_merges_into_oldest_candidate() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a.clone(), b.clone()]);
        let s = submission(&f, &["graffiti", "brick", "park"]);
        let photo_key = s.image_key.clone();

        let state = f
            .service
            .adjudicate(
                &citizen_user(),
                s,
                AdjudicationDecision::ConfirmDuplicate,
                &[b.id, a.id],
            )
            .await
            .unwrap();

        let SubmissionState::Merged { report, duplicate } = state else {
            panic!("expected merged");
        };
        assert_eq!(report.id, a.id);
        assert_eq!(report.upvote_count, 1);
        assert_eq!(duplicate.report_id, a.id);
        assert_eq!(duplicate.user_id, citizen_user().sub);

        assert_eq!(f.reports.get(a.id).unwrap().upvote_count, 1);
        assert_eq!(f.reports.get(b.id).unwrap().upvote_count, 0);
        assert_eq!(f.reports.len(), 2);
        assert_eq!(f.reports.list_duplicates(a.id).await.unwrap().len(), 1);
        assert!(f.reports.list_duplicates(b.id).await.unwrap().is_empty());
        assert!(!f.storage.contains(&photo_key));
    }

    #[tokio::test]
    async fn test_reject_creates_independent_report() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a.clone(), b.clone()]);
        let s = submission(&f, &["graffiti", "brick", "park"]);
        let photo_key = s.image_key.clone();

        let state = f
            .service
            .adjudicate(
                &citizen_user(),
                s,
                AdjudicationDecision::RejectDuplicate,
                &[a.id, b.id],
            )
            .await
            .unwrap();

        let SubmissionState::CreatedNew(report) = state else {
            panic!("expected created_new");
        };
        assert_eq!(report.upvote_count, 0);
        assert_eq!(report.image_key, photo_key);
        assert_eq!(f.reports.len(), 3);
        assert_eq!(f.reports.get(a.id).unwrap().upvote_count, 0);
        assert_eq!(f.reports.get(b.id).unwrap().upvote_count, 0);
        assert!(f.reports.list_duplicates(a.id).await.unwrap().is_empty());
        assert!(f.storage.contains(&photo_key));
    }

    #[tokio::test]
    async fn test_confirm_against_vanished_candidates_conflicts() {
        let f = fixture(vec![]);
        let s = submission(&f, &["graffiti", "brick", "park"]);
        let photo_key = s.image_key.clone();

        let err = f
            .service
            .adjudicate(
                &citizen_user(),
                s,
                AdjudicationDecision::ConfirmDuplicate,
                &[Uuid::now_v7()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.reports.len(), 0);
        assert!(f.storage.contains(&photo_key));
    }

    #[tokio::test]
    async fn test_confirm_ignores_ids_that_do_not_share_keywords() {
        let unrelated = report_at("2023-06-01T00:00:00Z", &["streetlight", "pole"]);
        let f = fixture(vec![unrelated.clone()]);
        let s = submission(&f, &["graffiti", "brick"]);

        let err = f
            .service
            .adjudicate(
                &citizen_user(),
                s,
                AdjudicationDecision::ConfirmDuplicate,
                &[unrelated.id],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.reports.get(unrelated.id).unwrap().upvote_count, 0);
    }

    #[tokio::test]
    async fn test_confirm_requires_candidate_ids() {
        let f = fixture(vec![]);
        let s = submission(&f, &["graffiti"]);

        let err = f
            .service
            .adjudicate(&citizen_user(), s, AdjudicationDecision::ConfirmDuplicate, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_every_decision_has_exactly_one_outcome() {
        for decision in [
            AdjudicationDecision::ConfirmDuplicate,
            AdjudicationDecision::RejectDuplicate,
        ] {
            let (a, b) = graffiti_pair();
            let f = fixture(vec![a.clone(), b.clone()]);
            let s = submission(&f, &["graffiti", "brick", "park"]);

            f.service
                .adjudicate(&citizen_user(), s, decision, &[a.id, b.id])
                .await
                .unwrap();

            let new_reports = f.reports.len() - 2;
            let upvotes: i32 = [a.id, b.id]
                .iter()
                .map(|id| f.reports.get(*id).unwrap().upvote_count)
                .sum();
            let duplicates = f.reports.list_duplicates(a.id).await.unwrap().len()
                + f.reports.list_duplicates(b.id).await.unwrap().len();

            match decision {
                AdjudicationDecision::ConfirmDuplicate => {
                    assert_eq!((new_reports, upvotes, duplicates), (0, 1, 1))
                }
                AdjudicationDecision::RejectDuplicate => {
                    assert_eq!((new_reports, upvotes, duplicates), (1, 0, 0))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_replayed_submission_keeps_first_outcome_and_photo() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a.clone(), b.clone()]);
        let s = submission(&f, &["graffiti", "brick", "park"]);
        let photo_key = s.image_key.clone();
        let citizen = citizen_user();

        let state = f
            .service
            .adjudicate(
                &citizen,
                s.clone(),
                AdjudicationDecision::RejectDuplicate,
                &[a.id, b.id],
            )
            .await
            .unwrap();
        assert!(matches!(state, SubmissionState::CreatedNew(_)));

        for _ in 0..2 {
            let err = f
                .service
                .adjudicate(
                    &citizen,
                    s.clone(),
                    AdjudicationDecision::ConfirmDuplicate,
                    &[a.id, b.id],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }
        let err = f.service.submit(&citizen, s).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(f.reports.len(), 3);
        assert_eq!(f.reports.get(a.id).unwrap().upvote_count, 0);
        assert_eq!(f.reports.get(b.id).unwrap().upvote_count, 0);
        assert!(f.reports.list_duplicates(a.id).await.unwrap().is_empty());
        assert!(f.reports.find_by_image_key(&photo_key).await.unwrap().is_some());
        assert!(f.storage.contains(&photo_key));
    }

    #[tokio::test]
    async fn test_second_confirm_of_same_draft_conflicts() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a.clone(), b.clone()]);
        let s = submission(&f, &["graffiti", "brick"]);

        f.service
            .adjudicate(
                &citizen_user(),
                s.clone(),
                AdjudicationDecision::ConfirmDuplicate,
                &[a.id, b.id],
            )
            .await
            .unwrap();
        let err = f
            .service
            .adjudicate(
                &citizen_user(),
                s,
                AdjudicationDecision::ConfirmDuplicate,
                &[a.id, b.id],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.reports.get(a.id).unwrap().upvote_count, 1);
        assert_eq!(f.reports.list_duplicates(a.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_racing_a_reject_keeps_the_photo() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a.clone(), b.clone()]);
        let s = submission(&f, &["graffiti", "brick"]);
        let photo_key = s.image_key.clone();
        // the reject lands after the replay check, so only merge itself runs
        f.reports
            .insert(&s.to_create_report(&citizen_user().sub, "Citizen", String::new()))
            .await
            .unwrap();

        let state = f
            .service
            .merge(&citizen_user(), &s, &[a.id, b.id])
            .await
            .unwrap();

        assert!(matches!(state, SubmissionState::Merged { .. }));
        assert!(f.storage.contains(&photo_key));
    }

    #[tokio::test]
    async fn test_candidate_query_failure_writes_nothing() {
        let (a, b) = graffiti_pair();
        let f = fixture(vec![a, b]);
        let s = submission(&f, &["graffiti"]);
        f.reports.fail_next_query();

        let err = f.service.submit(&citizen_user(), s).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(f.reports.len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_photo_key_is_forbidden() {
        let f = fixture(vec![]);
        let mut s = submission(&f, &["pothole"]);
        s.image_key = format!(
            "{}stolen.jpg",
            f.storage.namespace(PhotoKind::Report, "another-user")
        );

        let err = f.service.submit(&citizen_user(), s).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(f.reports.len(), 0);
    }
}
