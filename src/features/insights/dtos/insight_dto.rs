use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InsightQueryDto {
    /// e.g. "Which issues in the north district are most urgent?"
    #[validate(length(min = 1, max = 2000, message = "Query must be 1-2000 characters"))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InsightResponseDto {
    pub summary: String,
    /// Number of recent reports the answer was based on
    pub reports_considered: usize,
}
