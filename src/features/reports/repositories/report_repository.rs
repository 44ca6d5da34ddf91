use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    CreateDuplicateSubmission, CreateReport, DuplicateSubmission, Report, ReportSeverity,
    ReportStatus,
};
use crate::shared::types::PaginationQuery;

/// Optional filters for the authority report listing
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub severity: Option<ReportSeverity>,
}

/// Persistence boundary for reports and their duplicate records
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert(&self, data: &CreateReport) -> Result<Report>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Report>>;

    /// The report whose photo lives at `image_key`, if any
    async fn find_by_image_key(&self, image_key: &str) -> Result<Option<Report>>;

    /// True when a report or a duplicate record already consumed `image_key`
    async fn is_image_key_consumed(&self, image_key: &str) -> Result<bool>;

    /// Reports whose keyword array shares at least one entry with `keywords`,
    /// oldest first
    async fn find_sharing_keywords(&self, keywords: &[String]) -> Result<Vec<Report>>;

    /// Reports submitted by `user_id`, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Report>>;

    /// One page of reports, newest first, with the total matching `filter`
    async fn list(
        &self,
        filter: &ReportFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<Report>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        authority_id: &str,
    ) -> Result<Option<Report>>;

    async fn set_resolution_image(
        &self,
        id: Uuid,
        image_url: &str,
        image_key: &str,
    ) -> Result<Option<Report>>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Increment the report's corroboration counter and insert the duplicate
    /// record in one transaction. `None` when the report no longer exists.
    async fn record_duplicate(
        &self,
        data: &CreateDuplicateSubmission,
    ) -> Result<Option<(Report, DuplicateSubmission)>>;

    async fn list_duplicates(&self, report_id: Uuid) -> Result<Vec<DuplicateSubmission>>;

    /// Report counts per status, optionally restricted to one submitter
    async fn count_by_status(&self, user_id: Option<&str>) -> Result<Vec<(ReportStatus, i64)>>;

    /// Report counts per raw issue type, optionally restricted to one submitter
    async fn count_by_issue_type(&self, user_id: Option<&str>) -> Result<Vec<(String, i64)>>;
}

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reference number in format RPT-YYYY-NNNNNNN
    async fn generate_reference_number(&self) -> Result<String> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('report_reference_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get next sequence value: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(format!("RPT-{}-{:07}", Utc::now().format("%Y"), seq))
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// Like [`db_error`], but a unique violation on a draft photo key becomes a
/// conflict so a replayed submission cannot resolve twice
fn draft_insert_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            tracing::warn!("{}: draft already submitted ({})", context, db.message());
            AppError::Conflict("This draft has already been submitted".to_string())
        }
        e => db_error(context)(e),
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn insert(&self, data: &CreateReport) -> Result<Report> {
        let reference_number = self.generate_reference_number().await?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (
                id, reference_number, user_id, user_full_name, issue_type, severity,
                description, image_url, image_key, latitude, longitude, location_name,
                fingerprint_keywords, status, upvote_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'submitted', 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&reference_number)
        .bind(&data.user_id)
        .bind(&data.user_full_name)
        .bind(&data.issue_type)
        .bind(data.severity)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(&data.image_key)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(&data.location_name)
        .bind(&data.fingerprint_keywords)
        .fetch_one(&self.pool)
        .await
        .map_err(draft_insert_error("Failed to create report"))?;

        tracing::info!(
            "Created report: {} (ref: {}) for user: {}",
            report.id,
            report.reference_number,
            report.user_id
        );

        Ok(report)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get report"))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Report>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Report>(
            "SELECT * FROM reports WHERE id = ANY($1) ORDER BY created_at ASC, id ASC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to get reports by id"))
    }

    async fn find_by_image_key(&self, image_key: &str) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE image_key = $1")
            .bind(image_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get report by image key"))
    }

    async fn is_image_key_consumed(&self, image_key: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM reports WHERE image_key = $1)
                OR EXISTS (SELECT 1 FROM duplicate_submissions WHERE image_key = $1)
            "#,
        )
        .bind(image_key)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check draft image key"))
    }

    async fn find_sharing_keywords(&self, keywords: &[String]) -> Result<Vec<Report>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        // `&&` is array overlap, served by the GIN index on fingerprint_keywords
        sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE fingerprint_keywords && $1::text[]
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(keywords)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to query duplicate candidates"))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(
            "SELECT * FROM reports WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list user reports"))
    }

    async fn list(
        &self,
        filter: &ReportFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
              AND ($2::report_severity IS NULL OR severity = $2)
            "#,
        )
        .bind(filter.status)
        .bind(filter.severity)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count reports"))?;

        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
              AND ($2::report_severity IS NULL OR severity = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status)
        .bind(filter.severity)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list reports"))?;

        Ok((reports, total))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(
            "SELECT * FROM reports ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list recent reports"))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        authority_id: &str,
    ) -> Result<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET status = $2, authority_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(authority_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update report status"))?;

        if let Some(report) = &report {
            tracing::info!(
                "Report {} status changed to {} by {}",
                report.id,
                status,
                authority_id
            );
        }

        Ok(report)
    }

    async fn set_resolution_image(
        &self,
        id: Uuid,
        image_url: &str,
        image_key: &str,
    ) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET resolution_image_url = $2, resolution_image_key = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(image_url)
        .bind(image_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to set resolution image"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete report"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_duplicate(
        &self,
        data: &CreateDuplicateSubmission,
    ) -> Result<Option<(Report, DuplicateSubmission)>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET upvote_count = upvote_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(data.report_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to increment corroboration counter"))?;

        let Some(report) = report else {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back transaction"))?;
            return Ok(None);
        };

        let duplicate = sqlx::query_as::<_, DuplicateSubmission>(
            r#"
            INSERT INTO duplicate_submissions (id, report_id, user_id, user_full_name, image_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.report_id)
        .bind(&data.user_id)
        .bind(&data.user_full_name)
        .bind(&data.image_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(draft_insert_error("Failed to record duplicate submission"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit duplicate submission"))?;

        tracing::info!(
            "Merged submission from {} into report {} (upvotes: {})",
            data.user_id,
            report.id,
            report.upvote_count
        );

        Ok(Some((report, duplicate)))
    }

    async fn list_duplicates(&self, report_id: Uuid) -> Result<Vec<DuplicateSubmission>> {
        sqlx::query_as::<_, DuplicateSubmission>(
            "SELECT * FROM duplicate_submissions WHERE report_id = $1 ORDER BY created_at ASC",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list duplicate submissions"))
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> Result<Vec<(ReportStatus, i64)>> {
        sqlx::query_as::<_, (ReportStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM reports
            WHERE ($1::text IS NULL OR user_id = $1)
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count reports by status"))
    }

    async fn count_by_issue_type(&self, user_id: Option<&str>) -> Result<Vec<(String, i64)>> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT issue_type, COUNT(*) FROM reports
            WHERE ($1::text IS NULL OR user_id = $1)
            GROUP BY issue_type
            ORDER BY COUNT(*) DESC, issue_type ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count reports by issue type"))
    }
}
