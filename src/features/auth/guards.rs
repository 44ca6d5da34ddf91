//! Role guards.
//!
//! - authority: municipal staff, can do everything a citizen can
//! - citizen: can submit reports and track their own

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn current_user(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Admits citizens and authorities.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireCitizen(user): RequireCitizen) { ... }
/// ```
pub struct RequireCitizen(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireCitizen
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;

        if !user.has_citizen_access() {
            return Err(AppError::Forbidden("Citizen access required".to_string()));
        }

        Ok(RequireCitizen(user.clone()))
    }
}

/// Admits authority users only.
pub struct RequireAuthority(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuthority
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;

        if !user.is_authority() {
            return Err(AppError::Forbidden("Authority access required".to_string()));
        }

        Ok(RequireAuthority(user.clone()))
    }
}
