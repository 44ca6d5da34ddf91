use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a user profile, keyed by the identity provider's `sub`
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: String,
    pub neighborhood: Option<String>,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Address status notifications go to, when email notifications are on
    pub fn notification_email(&self) -> Option<&str> {
        if !self.notify_email {
            return None;
        }
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserProfile {
    pub user_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: String,
}

/// Absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub neighborhood: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_sms: Option<bool>,
}
