use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::models::{CreateUserProfile, UpdateUserProfile, UserProfile};
use crate::features::users::repositories::UserProfileRepository;

/// Service for user profiles stored alongside reports
pub struct UserProfileService {
    repository: Arc<dyn UserProfileRepository>,
}

impl UserProfileService {
    pub fn new(repository: Arc<dyn UserProfileRepository>) -> Self {
        Self { repository }
    }

    /// Current user's profile, created from token claims on first access
    pub async fn get_or_create(&self, user: &AuthenticatedUser) -> Result<UserProfile> {
        if let Some(profile) = self.repository.find(&user.sub).await? {
            return Ok(profile);
        }

        let profile = self
            .repository
            .insert_if_absent(&CreateUserProfile {
                user_id: user.sub.clone(),
                full_name: user.display_name(),
                email: user.email.clone(),
                role: user.primary_role().to_string(),
            })
            .await?;

        tracing::info!("Created profile for user: {}", user.sub);
        Ok(profile)
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        data: UpdateUserProfile,
    ) -> Result<UserProfile> {
        self.get_or_create(user).await?;

        self.repository
            .update(&user.sub, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for {} not found", user.sub)))
    }

    /// Profile of another user, if they ever signed in
    pub async fn find(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.repository.find(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{citizen_user, InMemoryUserProfileRepository};

    #[tokio::test]
    async fn test_profile_created_from_claims_once() {
        let repository = Arc::new(InMemoryUserProfileRepository::new());
        let service = UserProfileService::new(repository.clone());
        let user = citizen_user();

        let first = service.get_or_create(&user).await.unwrap();
        let second = service.get_or_create(&user).await.unwrap();

        assert_eq!(first.user_id, user.sub);
        assert_eq!(first.full_name, user.display_name());
        assert_eq!(first.role, "citizen");
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let repository = Arc::new(InMemoryUserProfileRepository::new());
        let service = UserProfileService::new(repository);
        let user = citizen_user();

        let updated = service
            .update(
                &user,
                UpdateUserProfile {
                    neighborhood: Some("Riverside".to_string()),
                    notify_email: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.neighborhood.as_deref(), Some("Riverside"));
        assert!(updated.notify_email);
        assert_eq!(updated.full_name, user.display_name());
        assert_eq!(updated.email, user.email);
    }
}
