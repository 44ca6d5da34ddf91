use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[serde(alias = "Submitted")]
    Submitted,
    #[serde(alias = "In Progress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Resolved")]
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Submitted,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
    ];

    /// Human-facing label used in notifications and dashboards
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "Submitted",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Resolved => "Resolved",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Submitted => write!(f, "submitted"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// Report severity enum matching database enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "report_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportSeverity {
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl ReportSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSeverity::Low => "low",
            ReportSeverity::Medium => "medium",
            ReportSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display taxonomy that free-text issue types are bucketed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum IssueCategory {
    Pothole,
    Graffiti,
    #[serde(rename = "Waste Management")]
    WasteManagement,
    #[serde(rename = "Broken Streetlight")]
    BrokenStreetlight,
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 5] = [
        IssueCategory::Pothole,
        IssueCategory::Graffiti,
        IssueCategory::WasteManagement,
        IssueCategory::BrokenStreetlight,
        IssueCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::Pothole => "Pothole",
            IssueCategory::Graffiti => "Graffiti",
            IssueCategory::WasteManagement => "Waste Management",
            IssueCategory::BrokenStreetlight => "Broken Streetlight",
            IssueCategory::Other => "Other",
        }
    }

    /// Bucket a free-text issue type, case-insensitively
    pub fn from_issue_type(issue_type: &str) -> Self {
        let normalized = issue_type.trim().to_lowercase();

        if let Some(exact) = Self::ALL
            .iter()
            .find(|c| c.label().to_lowercase() == normalized)
        {
            return *exact;
        }

        if normalized.contains("pothole") {
            IssueCategory::Pothole
        } else if normalized.contains("graffiti") {
            IssueCategory::Graffiti
        } else if ["waste", "trash", "garbage", "litter", "dumping"]
            .iter()
            .any(|w| normalized.contains(w))
        {
            IssueCategory::WasteManagement
        } else if ["streetlight", "street light", "lamp post", "lamppost"]
            .iter()
            .any(|w| normalized.contains(w))
        {
            IssueCategory::BrokenStreetlight
        } else {
            IssueCategory::Other
        }
    }
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub reference_number: String,
    pub user_id: String,
    pub user_full_name: String,
    pub issue_type: String,
    pub severity: ReportSeverity,
    pub description: String,
    pub image_url: String,
    pub image_key: String,
    pub resolution_image_url: Option<String>,
    pub resolution_image_key: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub fingerprint_keywords: Vec<String>,
    pub status: ReportStatus,
    pub authority_id: Option<String>,
    pub upvote_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn category(&self) -> IssueCategory {
        IssueCategory::from_issue_type(&self.issue_type)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Data for creating a new report
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub user_id: String,
    pub user_full_name: String,
    pub issue_type: String,
    pub severity: ReportSeverity,
    pub description: String,
    pub image_url: String,
    pub image_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub fingerprint_keywords: Vec<String>,
}

/// Sentence shown to authorities for a report others have corroborated
pub fn corroboration_note(upvote_count: i32) -> Option<String> {
    (upvote_count > 0).then(|| {
        format!(
            "{} other citizen(s) have also reported this issue.",
            upvote_count
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_type_maps_case_insensitively() {
        assert_eq!(IssueCategory::from_issue_type("pothole"), IssueCategory::Pothole);
        assert_eq!(IssueCategory::from_issue_type("GRAFFITI"), IssueCategory::Graffiti);
        assert_eq!(
            IssueCategory::from_issue_type("waste management"),
            IssueCategory::WasteManagement
        );
        assert_eq!(
            IssueCategory::from_issue_type("Broken streetlight"),
            IssueCategory::BrokenStreetlight
        );
    }

    #[test]
    fn test_issue_type_synonyms_and_unknowns() {
        assert_eq!(
            IssueCategory::from_issue_type("Overflowing trash bin"),
            IssueCategory::WasteManagement
        );
        assert_eq!(
            IssueCategory::from_issue_type("Deep pothole near curb"),
            IssueCategory::Pothole
        );
        assert_eq!(IssueCategory::from_issue_type("Fallen tree"), IssueCategory::Other);
        assert_eq!(IssueCategory::from_issue_type(""), IssueCategory::Other);
    }

    #[test]
    fn test_status_labels_and_aliases() {
        assert_eq!(ReportStatus::InProgress.label(), "In Progress");
        let parsed: ReportStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, ReportStatus::InProgress);
        let parsed: ReportStatus = serde_json::from_str("\"resolved\"").unwrap();
        assert_eq!(parsed, ReportStatus::Resolved);
        assert_eq!(
            serde_json::to_string(&ReportStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_severity_accepts_capitalized_input() {
        let parsed: ReportSeverity = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(parsed, ReportSeverity::High);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"high\"");
    }

    #[test]
    fn test_corroboration_note() {
        assert_eq!(corroboration_note(0), None);
        assert_eq!(
            corroboration_note(2).as_deref(),
            Some("2 other citizen(s) have also reported this issue.")
        );
    }
}
