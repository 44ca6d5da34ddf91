//! In-memory doubles and fixtures shared by unit and handler tests.

#![allow(clippy::new_without_default, clippy::len_without_is_empty)]

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{DateTime, Datelike, Utc};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{
    CreateDuplicateSubmission, CreateReport, DuplicateSubmission, Report, ReportSeverity,
    ReportStatus,
};
use crate::features::reports::repositories::{ReportFilter, ReportRepository};
use crate::features::users::models::{CreateUserProfile, UpdateUserProfile, UserProfile};
use crate::features::users::repositories::UserProfileRepository;
use crate::modules::llm::{CompletionRequest, LlmError, VisionModel};
use crate::modules::storage::{PhotoStorage, StorageError};
use crate::shared::types::PaginationQuery;
use crate::shared::validation::encode_key_segment;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn citizen_user() -> AuthenticatedUser {
    AuthenticatedUser {
        account_id: "citizen-account".to_string(),
        sub: "citizen-sub".to_string(),
        session_uid: Some("citizen-session".to_string()),
        roles: vec!["citizen".to_string()],
        name: Some("Casey Citizen".to_string()),
        email: Some("casey@example.com".to_string()),
    }
}

pub fn authority_user() -> AuthenticatedUser {
    AuthenticatedUser {
        account_id: "authority-account".to_string(),
        sub: "authority-sub".to_string(),
        session_uid: Some("authority-session".to_string()),
        roles: vec!["authority".to_string()],
        name: Some("Public Works Desk".to_string()),
        email: Some("works@city.example".to_string()),
    }
}

async fn inject_citizen(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(citizen_user());
    next.run(request).await
}

async fn inject_authority(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(authority_user());
    next.run(request).await
}

/// Stand-in for the JWT middleware that authenticates every request as a citizen
pub fn with_citizen_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_citizen))
}

pub fn with_authority_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_authority))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

static NEXT_REFERENCE: AtomicI64 = AtomicI64::new(1);

fn next_reference(now: DateTime<Utc>) -> String {
    format!(
        "RPT-{}-{:07}",
        now.year(),
        NEXT_REFERENCE.fetch_add(1, Ordering::Relaxed)
    )
}

/// A submitted, medium-severity report with the given fingerprint keywords
pub fn report_fixture(user_id: &str, keywords: &[&str]) -> Report {
    let id = Uuid::now_v7();
    let now = Utc::now();
    let image_key = format!("public/reports/{}/{}.jpg", encode_key_segment(user_id), id);
    Report {
        id,
        reference_number: next_reference(now),
        user_id: user_id.to_string(),
        user_full_name: Name().fake(),
        issue_type: "Pothole".to_string(),
        severity: ReportSeverity::Medium,
        description: Sentence(4..10).fake(),
        image_url: format!("http://storage.test/civiclens/{}", image_key),
        image_key,
        resolution_image_url: None,
        resolution_image_key: None,
        latitude: 34.0522,
        longitude: -118.2437,
        location_name: None,
        fingerprint_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        status: ReportStatus::Submitted,
        authority_id: None,
        upvote_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Report created at an RFC 3339 timestamp, e.g. `2024-01-01T00:00:00Z`
pub fn report_at(created_at: &str, keywords: &[&str]) -> Report {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .expect("fixture timestamp must be RFC 3339")
        .with_timezone(&Utc);
    Report {
        created_at,
        updated_at: created_at,
        ..report_fixture("someone-else", keywords)
    }
}

pub fn profile_fixture(user_id: &str) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        user_id: user_id.to_string(),
        full_name: Name().fake(),
        email: None,
        role: "citizen".to_string(),
        neighborhood: None,
        notify_email: false,
        notify_sms: false,
        created_at: now,
        updated_at: now,
    }
}

fn injected_failure() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

// ---------------------------------------------------------------------------
// Report repository
// ---------------------------------------------------------------------------

/// Vec-backed `ReportRepository` mirroring the Postgres orderings
#[derive(Default)]
pub struct InMemoryReportRepository {
    reports: Mutex<Vec<Report>>,
    duplicates: Mutex<Vec<DuplicateSubmission>>,
    keyword_queries: Mutex<Vec<Vec<String>>>,
    fail_next: AtomicBool,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
            ..Self::default()
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    /// Keyword lists passed to `find_sharing_keywords`, in call order
    pub fn keyword_queries(&self) -> Vec<Vec<String>> {
        self.keyword_queries.lock().unwrap().clone()
    }

    /// Make the next repository call fail with a database error
    pub fn fail_next_query(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn newest_first(mut reports: Vec<Report>) -> Vec<Report> {
        reports.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        reports
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Option<Report>
    where
        F: FnOnce(&mut Report),
    {
        let mut reports = self.reports.lock().unwrap();
        let report = reports.iter_mut().find(|r| r.id == id)?;
        apply(report);
        report.updated_at = Utc::now();
        Some(report.clone())
    }

    fn report_uses_key(&self, image_key: &str) -> bool {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.image_key == image_key)
    }

    fn duplicate_uses_key(&self, image_key: &str) -> bool {
        self.duplicates
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.image_key == image_key)
    }

    fn draft_conflict() -> AppError {
        AppError::Conflict("This draft has already been submitted".to_string())
    }

    fn submitted_by(&self, user_id: Option<&str>) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| user_id.is_none_or(|u| r.user_id == u))
            .cloned()
            .collect()
    }
}

fn filter_matches(filter: &ReportFilter, report: &Report) -> bool {
    filter.status.is_none_or(|s| s == report.status)
        && filter.severity.is_none_or(|s| s == report.severity)
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn insert(&self, data: &CreateReport) -> Result<Report> {
        self.check_failure()?;
        // unique reports.image_key
        if self.report_uses_key(&data.image_key) {
            return Err(Self::draft_conflict());
        }
        let now = Utc::now();
        let report = Report {
            id: Uuid::now_v7(),
            reference_number: next_reference(now),
            user_id: data.user_id.clone(),
            user_full_name: data.user_full_name.clone(),
            issue_type: data.issue_type.clone(),
            severity: data.severity,
            description: data.description.clone(),
            image_url: data.image_url.clone(),
            image_key: data.image_key.clone(),
            resolution_image_url: None,
            resolution_image_key: None,
            latitude: data.latitude,
            longitude: data.longitude,
            location_name: data.location_name.clone(),
            fingerprint_keywords: data.fingerprint_keywords.clone(),
            status: ReportStatus::Submitted,
            authority_id: None,
            upvote_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.reports.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        self.check_failure()?;
        Ok(self.get(id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Report>> {
        self.check_failure()?;
        let mut found: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    async fn find_by_image_key(&self, image_key: &str) -> Result<Option<Report>> {
        self.check_failure()?;
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.image_key == image_key)
            .cloned())
    }

    async fn is_image_key_consumed(&self, image_key: &str) -> Result<bool> {
        self.check_failure()?;
        Ok(self.report_uses_key(image_key) || self.duplicate_uses_key(image_key))
    }

    async fn find_sharing_keywords(&self, keywords: &[String]) -> Result<Vec<Report>> {
        self.keyword_queries.lock().unwrap().push(keywords.to_vec());
        self.check_failure()?;
        let mut found: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.fingerprint_keywords.iter().any(|k| keywords.contains(k)))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Report>> {
        self.check_failure()?;
        Ok(Self::newest_first(self.submitted_by(Some(user_id))))
    }

    async fn list(
        &self,
        filter: &ReportFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        self.check_failure()?;
        let matching: Vec<Report> = Self::newest_first(self.submitted_by(None))
            .into_iter()
            .filter(|r| filter_matches(filter, r))
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Report>> {
        self.check_failure()?;
        Ok(Self::newest_first(self.submitted_by(None))
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        authority_id: &str,
    ) -> Result<Option<Report>> {
        self.check_failure()?;
        Ok(self.update(id, |r| {
            r.status = status;
            r.authority_id = Some(authority_id.to_string());
        }))
    }

    async fn set_resolution_image(
        &self,
        id: Uuid,
        image_url: &str,
        image_key: &str,
    ) -> Result<Option<Report>> {
        self.check_failure()?;
        Ok(self.update(id, |r| {
            r.resolution_image_url = Some(image_url.to_string());
            r.resolution_image_key = Some(image_key.to_string());
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.check_failure()?;
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|r| r.id != id);
        let deleted = reports.len() < before;
        if deleted {
            self.duplicates.lock().unwrap().retain(|d| d.report_id != id);
        }
        Ok(deleted)
    }

    async fn record_duplicate(
        &self,
        data: &CreateDuplicateSubmission,
    ) -> Result<Option<(Report, DuplicateSubmission)>> {
        self.check_failure()?;
        // unique duplicate_submissions.image_key
        if self.duplicate_uses_key(&data.image_key) {
            return Err(Self::draft_conflict());
        }
        let Some(report) = self.update(data.report_id, |r| r.upvote_count += 1) else {
            return Ok(None);
        };
        let duplicate = DuplicateSubmission {
            id: Uuid::now_v7(),
            report_id: data.report_id,
            user_id: data.user_id.clone(),
            user_full_name: data.user_full_name.clone(),
            image_key: data.image_key.clone(),
            created_at: Utc::now(),
        };
        self.duplicates.lock().unwrap().push(duplicate.clone());
        Ok(Some((report, duplicate)))
    }

    async fn list_duplicates(&self, report_id: Uuid) -> Result<Vec<DuplicateSubmission>> {
        self.check_failure()?;
        Ok(self
            .duplicates
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> Result<Vec<(ReportStatus, i64)>> {
        self.check_failure()?;
        let reports = self.submitted_by(user_id);
        Ok(ReportStatus::ALL
            .iter()
            .map(|s| (*s, reports.iter().filter(|r| r.status == *s).count() as i64))
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn count_by_issue_type(&self, user_id: Option<&str>) -> Result<Vec<(String, i64)>> {
        self.check_failure()?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for report in self.submitted_by(user_id) {
            *counts.entry(report.issue_type).or_default() += 1;
        }
        let mut counts: Vec<(String, i64)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserProfileRepository {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl InMemoryUserProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryUserProfileRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn insert_if_absent(&self, data: &CreateUserProfile) -> Result<UserProfile> {
        let now = Utc::now();
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .entry(data.user_id.clone())
            .or_insert_with(|| UserProfile {
                user_id: data.user_id.clone(),
                full_name: data.full_name.clone(),
                email: data.email.clone(),
                role: data.role.clone(),
                neighborhood: None,
                notify_email: false,
                notify_sms: false,
                created_at: now,
                updated_at: now,
            });
        Ok(profile.clone())
    }

    async fn update(
        &self,
        user_id: &str,
        data: &UpdateUserProfile,
    ) -> Result<Option<UserProfile>> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(full_name) = &data.full_name {
            profile.full_name = full_name.clone();
        }
        if let Some(email) = &data.email {
            profile.email = Some(email.clone());
        }
        if let Some(neighborhood) = &data.neighborhood {
            profile.neighborhood = Some(neighborhood.clone());
        }
        if let Some(notify_email) = data.notify_email {
            profile.notify_email = notify_email;
        }
        if let Some(notify_sms) = data.notify_sms {
            profile.notify_sms = notify_sms;
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }
}

// ---------------------------------------------------------------------------
// Photo storage
// ---------------------------------------------------------------------------

pub struct InMemoryPhotoStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryPhotoStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl PhotoStorage for InMemoryPhotoStorage {
    fn prefix(&self) -> &str {
        "public"
    }

    fn url_for(&self, key: &str) -> String {
        format!("http://storage.test/civiclens/{}", key)
    }

    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> std::result::Result<(), StorageError> {
        self.insert(key, data);
        Ok(())
    }

    async fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Vision model
// ---------------------------------------------------------------------------

/// Phrases that identify each system prompt
pub const FINGERPRINT_PROMPT: &str = "fingerprint";
pub const ANALYSIS_PROMPT: &str = "Analyze the attached image";
pub const LOCATION_PROMPT: &str = "You name locations";
pub const INSIGHT_PROMPT: &str = "civic analyst";

const KNOWN_PROMPTS: [&str; 4] = [
    FINGERPRINT_PROMPT,
    ANALYSIS_PROMPT,
    LOCATION_PROMPT,
    INSIGHT_PROMPT,
];

/// `VisionModel` that answers from per-prompt queues. A prompt with nothing
/// queued fails with `EmptyResponse`.
#[derive(Default)]
pub struct ScriptedVisionModel {
    replies: Mutex<HashMap<&'static str, VecDeque<std::result::Result<String, String>>>>,
    calls: Mutex<Vec<(&'static str, bool)>>,
}

impl ScriptedVisionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, prompt: &'static str, text: &str) -> Self {
        self.queue(prompt, Ok(text.to_string()))
    }

    pub fn fail(self, prompt: &'static str, message: &str) -> Self {
        self.queue(prompt, Err(message.to_string()))
    }

    fn queue(self, prompt: &'static str, reply: std::result::Result<String, String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(prompt)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self, prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == prompt)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request_had_photo(&self, prompt: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| *p == prompt)
            .is_some_and(|(_, had_photo)| *had_photo)
    }
}

#[async_trait]
impl VisionModel for ScriptedVisionModel {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, LlmError> {
        let prompt = KNOWN_PROMPTS
            .iter()
            .copied()
            .find(|p| request.system.contains(p))
            .unwrap_or("unknown");
        self.calls
            .lock()
            .unwrap()
            .push((prompt, request.photo.is_some()));

        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(prompt)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Request(message)),
            None => Err(LlmError::EmptyResponse),
        }
    }
}
