//! Authentication extractors
//!
//! Resolve the bearer token to a live user record. A missing or invalid
//! token is a 401; a resolved user whose account is not active is a 403.
//! The admin variant additionally rejects non-admin roles with a 403.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use redbutton_common::AppError;
use redbutton_core::User;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated user resolved from the session token
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The live user record backing the token
    pub user: User,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        // Validate the token
        let claims = app_state
            .jwt_service()
            .verify(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid session token");
                ApiError::InvalidAuthFormat
            })?;

        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!(error = %e, "Invalid user ID in token");
            ApiError::InvalidAuthFormat
        })?;

        // The token must still resolve to a live user record
        let user = app_state
            .service_context()
            .user_repo()
            .find_by_id(user_id)
            .await
            .map_err(|e| ApiError::App(AppError::Database(e.to_string())))?
            .ok_or(ApiError::InvalidAuthFormat)?;

        if !user.is_active() {
            return Err(ApiError::App(AppError::AccountNotActive));
        }

        Ok(AuthUser { user })
    }
}

/// Authenticated admin user
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: User,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { user } = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ApiError::App(AppError::AdminRequired));
        }

        Ok(AdminUser { user })
    }
}
