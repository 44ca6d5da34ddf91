//! Prompt templates for the vision model.
//!
//! Templates live in `templates/prompts/` and use Jinja2 syntax. Each public
//! function here renders one system prompt with its typed inputs.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::context;
use serde::Serialize;

/// One report line rendered into the insights prompt
#[derive(Debug, Serialize)]
pub struct PromptReport<'a> {
    pub reference_number: &'a str,
    pub issue_type: &'a str,
    pub severity: &'a str,
    pub status: &'a str,
    pub description: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<&'a str>,
    pub upvote_count: i32,
    pub created_at: String,
}

/// Issue classification prompt (issue type, severity, description)
pub fn render_issue_analysis_prompt(
    latitude: f64,
    longitude: f64,
    json_schema: &str,
) -> Result<String, TemplateError> {
    render_template(
        "analysis/system.jinja",
        context! { latitude, longitude, json_schema },
    )
}

/// Duplicate-detection fingerprint prompt
pub fn render_fingerprint_prompt(json_schema: &str) -> Result<String, TemplateError> {
    render_template("fingerprint/system.jinja", context! { json_schema })
}

/// Location naming prompt used when reverse geocoding is unavailable
pub fn render_location_prompt(
    latitude: f64,
    longitude: f64,
    json_schema: &str,
) -> Result<String, TemplateError> {
    render_template(
        "location/system.jinja",
        context! { latitude, longitude, json_schema },
    )
}

/// Authority analytics prompt over a batch of reports
pub fn render_insight_prompt(
    query: &str,
    reports: &[PromptReport<'_>],
    current_date: &str,
    json_schema: &str,
) -> Result<String, TemplateError> {
    render_template(
        "insights/system.jinja",
        context! { query, reports, current_date, json_schema },
    )
}
