/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Citizen role - can submit reports, adjudicate duplicates and track their reports
pub const ROLE_CITIZEN: &str = "citizen";

/// Authority role - municipal staff who triage, update and resolve reports
pub const ROLE_AUTHORITY: &str = "authority";

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum accepted photo size (8MB)
pub const MAX_PHOTO_SIZE: usize = 8 * 1024 * 1024;

/// Image types the vision model and the object store accept
pub const ALLOWED_PHOTO_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// =============================================================================
// DASHBOARD / INSIGHTS
// =============================================================================

/// Number of reports shown in the citizen "recent activity" list
pub const RECENT_REPORTS_LIMIT: i64 = 5;

/// Upper bound of reports rendered into an insight prompt
pub const INSIGHT_REPORT_LIMIT: i64 = 100;
