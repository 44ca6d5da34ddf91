use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications;
use crate::features::reports::models::{DuplicateSubmission, Report, ReportStatus};
use crate::features::reports::repositories::{ReportFilter, ReportRepository};
use crate::features::users::services::UserProfileService;
use crate::modules::storage::{PhotoKind, PhotoStorage};
use crate::shared::types::PaginationQuery;
use crate::shared::upload::PhotoUpload;

/// Service for report operations after submission
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
    storage: Arc<dyn PhotoStorage>,
    profiles: Arc<UserProfileService>,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        storage: Arc<dyn PhotoStorage>,
        profiles: Arc<UserProfileService>,
    ) -> Self {
        Self {
            reports,
            storage,
            profiles,
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Report> {
        self.reports
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    /// Reports the user submitted, newest first
    pub async fn list_for_user(&self, user: &AuthenticatedUser) -> Result<Vec<Report>> {
        self.reports.list_by_user(&user.sub).await
    }

    /// Report visible to its owner and to authorities
    pub async fn get_for_user(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Report> {
        let report = self.get_by_id(id).await?;
        if !report.is_owned_by(&user.sub) && !user.is_authority() {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }
        Ok(report)
    }

    /// Delete a report and, best effort, its photos
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let report = self.get_for_user(user, id).await?;

        if !self.reports.delete(id).await? {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        tracing::info!("Report {} deleted by {}", id, user.sub);

        let keys = std::iter::once(report.image_key.as_str())
            .chain(report.resolution_image_key.as_deref());
        for key in keys {
            if let Err(e) = self.storage.remove(key).await {
                tracing::warn!("Failed to remove photo {} of deleted report {}: {}", key, id, e);
            }
        }

        Ok(())
    }

    pub async fn list(
        &self,
        filter: &ReportFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        self.reports.list(filter, pagination).await
    }

    /// Change status, assign the acting authority and notify the submitter.
    /// Returns the updated report and whether a notification went out.
    pub async fn update_status(
        &self,
        authority: &AuthenticatedUser,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<(Report, bool)> {
        let report = self.get_by_id(id).await?;

        if status == ReportStatus::Resolved && report.resolution_image_key.is_none() {
            return Err(AppError::Validation(
                "A resolution photo is required before marking a report as resolved".to_string(),
            ));
        }

        let updated = self
            .reports
            .update_status(id, status, &authority.sub)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        let notified = self.notify_submitter(&updated).await;
        Ok((updated, notified))
    }

    async fn notify_submitter(&self, report: &Report) -> bool {
        let submitter = match self.profiles.find(&report.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    "Skipping notification for report {}: profile lookup failed: {}",
                    report.id,
                    e
                );
                return false;
            }
        };

        match notifications::status_notification(report, submitter.as_ref()) {
            Some(notification) => {
                notifications::dispatch(&notification);
                true
            }
            None => false,
        }
    }

    /// Store a photo proving the issue was fixed, replacing any previous one
    pub async fn set_resolution_photo(&self, id: Uuid, photo: PhotoUpload) -> Result<Report> {
        let report = self.get_by_id(id).await?;

        let stored = self
            .storage
            .store(
                PhotoKind::Resolution,
                &id.to_string(),
                photo.extension(),
                &photo.data,
                &photo.content_type,
            )
            .await?;

        let updated = self
            .reports
            .set_resolution_image(id, &stored.url, &stored.key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        if let Some(previous) = report.resolution_image_key {
            if let Err(e) = self.storage.remove(&previous).await {
                tracing::warn!("Failed to remove replaced resolution photo {}: {}", previous, e);
            }
        }

        tracing::info!("Resolution photo stored for report {}", id);
        Ok(updated)
    }

    pub async fn list_duplicates(&self, id: Uuid) -> Result<Vec<DuplicateSubmission>> {
        self.get_by_id(id).await?;
        self.reports.list_duplicates(id).await
    }
}
