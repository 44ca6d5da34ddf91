use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{CreateUserProfile, UpdateUserProfile, UserProfile};

#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Insert the profile unless one exists, returning the stored row either way
    async fn insert_if_absent(&self, data: &CreateUserProfile) -> Result<UserProfile>;

    async fn update(&self, user_id: &str, data: &UpdateUserProfile)
        -> Result<Option<UserProfile>>;
}

pub struct PgUserProfileRepository {
    pool: PgPool,
}

impl PgUserProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileRepository for PgUserProfileRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user profile: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn insert_if_absent(&self, data: &CreateUserProfile) -> Result<UserProfile> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, full_name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(&data.user_id)
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(&data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user profile: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(profile)
    }

    async fn update(
        &self,
        user_id: &str,
        data: &UpdateUserProfile,
    ) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                neighborhood = COALESCE($4, neighborhood),
                notify_email = COALESCE($5, notify_email),
                notify_sms = COALESCE($6, notify_sms),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(&data.neighborhood)
        .bind(data.notify_email)
        .bind(data.notify_sms)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user profile: {:?}", e);
            AppError::Database(e)
        })?;

        if profile.is_some() {
            tracing::info!("Updated profile for user: {}", user_id);
        }

        Ok(profile)
    }
}
