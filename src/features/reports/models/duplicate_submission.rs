use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Record of a citizen confirming their submission duplicates an existing report
#[derive(Debug, Clone, FromRow)]
pub struct DuplicateSubmission {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: String,
    pub user_full_name: String,
    /// Key of the draft photo this submission consumed
    pub image_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDuplicateSubmission {
    pub report_id: Uuid,
    pub user_id: String,
    pub user_full_name: String,
    pub image_key: String,
}
