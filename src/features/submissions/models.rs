use crate::features::reports::models::{CreateReport, ReportSeverity};
use crate::features::submissions::fingerprint::Fingerprint;

/// Result of uploading and analyzing a photo. The client keeps it, lets the
/// citizen edit the fields, and sends it back to submit.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub image_url: String,
    pub image_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub issue_type: String,
    pub severity: Option<ReportSeverity>,
    pub description: String,
    pub fingerprint: Fingerprint,
    /// Set when issue analysis failed and the fields must be filled by hand
    pub analysis_error: Option<String>,
    /// Set when no fingerprint could be produced and duplicates will not be checked
    pub fingerprint_warning: Option<String>,
}

/// A completed draft as sent back by the citizen. The submitter comes from
/// the authenticated request, never from the payload.
#[derive(Debug, Clone)]
pub struct Submission {
    pub image_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub issue_type: String,
    pub severity: ReportSeverity,
    pub description: String,
    pub fingerprint: Fingerprint,
}

impl Submission {
    pub fn to_create_report(
        &self,
        user_id: &str,
        user_full_name: &str,
        image_url: String,
    ) -> CreateReport {
        CreateReport {
            user_id: user_id.to_string(),
            user_full_name: user_full_name.to_string(),
            issue_type: self.issue_type.clone(),
            severity: self.severity,
            description: self.description.clone(),
            image_url,
            image_key: self.image_key.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name.clone(),
            fingerprint_keywords: self.fingerprint.keywords().to_vec(),
        }
    }
}
