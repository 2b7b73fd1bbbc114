//! Role guards for handlers.
//!
//! Booking transitions carry their own authority rules (see
//! `bookings::lifecycle`); these guards cover the plain admin and agent
//! surfaces.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Allows only users with the "admin" role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.is_admin() {
            return Err(AppError::Forbidden(format!(
                "Role '{}' is not authorized to access this route",
                user.role
            )));
        }

        Ok(RequireAdmin(user))
    }
}

/// Allows only users with the "agent" role.
pub struct RequireAgent(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAgent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.is_agent() {
            return Err(AppError::Forbidden(format!(
                "Role '{}' is not authorized to access this route",
                user.role
            )));
        }

        Ok(RequireAgent(user))
    }
}
