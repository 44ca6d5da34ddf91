use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::users::models::{UpdateUserProfile, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponseDto {
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

impl From<UserProfile> for UserProfileResponseDto {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            full_name: p.full_name,
            email: p.email,
            role: p.role,
            neighborhood: p.neighborhood,
            notify_email: p.notify_email,
            notify_sms: p.notify_sms,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Request DTO for updating the caller's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 128, message = "Full name must be 1-128 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[validate(email(message = "Email must be a valid address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[validate(length(max = 128, message = "Neighborhood must not exceed 128 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_email: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_sms: Option<bool>,
}

impl From<UpdateProfileDto> for UpdateUserProfile {
    fn from(dto: UpdateProfileDto) -> Self {
        Self {
            full_name: dto.full_name.map(|n| n.trim().to_string()),
            email: dto.email.map(|e| e.trim().to_string()),
            neighborhood: dto.neighborhood.map(|n| n.trim().to_string()),
            notify_email: dto.notify_email,
            notify_sms: dto.notify_sms,
        }
    }
}
