use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::insights::dtos::InsightResponseDto;
use crate::features::reports::models::Report;
use crate::features::reports::repositories::ReportRepository;
use crate::modules::llm::{CompletionRequest, VisionModel};
use crate::shared::constants::INSIGHT_REPORT_LIMIT;
use crate::shared::llm::{default_true, parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_insight_prompt, PromptReport};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct InsightSummaryResponse {
    /// Answer to the question, in plain prose
    #[serde(default)]
    pub summary: String,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

crate::impl_llm_response!(InsightSummaryResponse);

fn prompt_report(report: &Report) -> PromptReport<'_> {
    PromptReport {
        reference_number: &report.reference_number,
        issue_type: &report.issue_type,
        severity: report.severity.as_str(),
        status: report.status.label(),
        description: &report.description,
        latitude: report.latitude,
        longitude: report.longitude,
        location_name: report.location_name.as_deref(),
        upvote_count: report.upvote_count,
        created_at: report.created_at.format("%Y-%m-%d").to_string(),
    }
}

/// Answers authority questions from the most recent reports
pub struct InsightService {
    reports: Arc<dyn ReportRepository>,
    model: Arc<dyn VisionModel>,
}

impl InsightService {
    pub fn new(reports: Arc<dyn ReportRepository>, model: Arc<dyn VisionModel>) -> Self {
        Self { reports, model }
    }

    pub async fn ask(&self, query: &str) -> Result<InsightResponseDto> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Query must not be empty".to_string()));
        }

        let reports = self.reports.list_recent(INSIGHT_REPORT_LIMIT).await?;
        let prompt_reports: Vec<PromptReport<'_>> = reports.iter().map(prompt_report).collect();

        let system = render_insight_prompt(
            query,
            &prompt_reports,
            &Utc::now().format("%Y-%m-%d").to_string(),
            &InsightSummaryResponse::json_schema_string(),
        )
        .map_err(|e| AppError::Internal(format!("Failed to render insight prompt: {}", e)))?;

        let text = self
            .model
            .complete(CompletionRequest::json(system, query))
            .await?;

        let response: InsightSummaryResponse = parse_with_fallback(&text);
        let summary = response.summary.trim();
        if !response.is_success() || summary.is_empty() {
            return Err(AppError::ExternalServiceError(
                "The model did not return a usable summary".to_string(),
            ));
        }

        tracing::info!(
            "Answered insight query over {} report(s)",
            prompt_reports.len()
        );

        Ok(InsightResponseDto {
            summary: summary.to_string(),
            reports_considered: prompt_reports.len(),
        })
    }
}
