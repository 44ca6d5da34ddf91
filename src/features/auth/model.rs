use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_AUTHORITY, ROLE_CITIZEN};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub account_id: String,
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_uid: Option<String>,
    pub roles: Vec<String>,
    /// Display name from the `name` claim, when the provider sends one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Municipal staff who triage and resolve reports
    pub fn is_authority(&self) -> bool {
        self.has_role(ROLE_AUTHORITY)
    }

    pub fn is_citizen(&self) -> bool {
        self.has_role(ROLE_CITIZEN)
    }

    /// Authorities can do everything a citizen can
    pub fn has_citizen_access(&self) -> bool {
        self.is_citizen() || self.is_authority()
    }

    /// Name stored on reports and duplicate records
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.as_deref())
            .unwrap_or("Anonymous Citizen")
            .to_string()
    }

    /// Role name persisted on the profile
    pub fn primary_role(&self) -> &'static str {
        if self.is_authority() {
            ROLE_AUTHORITY
        } else {
            ROLE_CITIZEN
        }
    }
}

/// Namespaced custom claim carrying application roles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}
