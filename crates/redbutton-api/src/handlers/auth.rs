//! Authentication handlers
//!
//! Login, registration, invites, the Google OAuth redirect flow, and the
//! current-user endpoint.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use redbutton_service::{
    AuthResponse, AuthService, CreateInviteRequest, GenerateInviteLinkRequest, InviteOutcome,
    InviteLinkResponse, InviteService, LoginRequest, MessageResponse, OAuthLoginRequest,
    RegisterRequest, VerifyInviteRequest, VerifyInviteResponse,
};

use crate::extractors::{AdminUser, AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Login with email and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.login(request).await?;
    Ok(Json(response))
}

/// Register a new user (open or invite-redemption)
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<AuthResponse>>> {
    let service = AuthService::new(state.service_context());
    let response = service.register(request).await?;
    Ok(Created(Json(response)))
}

/// Verify an invite token
///
/// POST /api/auth/verify-invite
pub async fn verify_invite(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyInviteRequest>,
) -> ApiResult<Json<VerifyInviteResponse>> {
    let service = InviteService::new(state.service_context());
    let response = service.verify_invite(&request.token).await?;
    Ok(Json(response))
}

/// Get the current user
///
/// GET /api/auth/me
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Value>> {
    let service = AuthService::new(state.service_context());
    let user = service.current_user(auth.user.id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Create or re-send an invitation (admin only)
///
/// POST /api/auth/invite
pub async fn create_invite(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateInviteRequest>,
) -> ApiResult<Created<Json<MessageResponse>>> {
    let service = InviteService::new(state.service_context());
    let outcome = service.create_invite(&admin.user, &request.email).await?;

    let message = match outcome {
        InviteOutcome::Sent => "Invitation sent successfully",
        InviteOutcome::Resent => "Invitation resent successfully",
    };
    Ok(Created(Json(MessageResponse::new(message))))
}

/// Generate an invite link with the shared admin secret (no session)
///
/// POST /api/auth/admin/generate-invite
pub async fn generate_invite_link(
    State(state): State<AppState>,
    Json(request): Json<GenerateInviteLinkRequest>,
) -> ApiResult<Json<InviteLinkResponse>> {
    let service = InviteService::new(state.service_context());
    let response = service.generate_invite_link(request).await?;
    Ok(Json(response))
}

/// Login or register via a provider-issued id token
///
/// POST /api/auth/oauth
pub async fn oauth_login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<OAuthLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.oauth_login(request).await?;
    Ok(Json(response))
}

/// Redirect the browser to the Google consent screen
///
/// GET /api/auth/google
pub async fn google_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.service_context().oauth().authorize_url())
}

/// Query parameters on the OAuth callback
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
}

/// Complete the Google OAuth flow and hand the session token to the client
/// via the redirect query string
///
/// GET /api/auth/google/callback
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Redirect {
    let client_url = state.config().client.url.clone();
    let failure = format!("{client_url}/login?error=authentication_failed");

    let Some(code) = query.code else {
        return Redirect::temporary(&failure);
    };

    let profile = match state.service_context().oauth().exchange_code(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "OAuth code exchange failed");
            return Redirect::temporary(&failure);
        }
    };

    let service = AuthService::new(state.service_context());
    match service.oauth_profile_login(profile).await {
        Ok(response) => Redirect::temporary(&format!(
            "{client_url}/auth/google/callback?token={}",
            response.token
        )),
        Err(e) => {
            tracing::warn!(error = %e, "OAuth login failed");
            Redirect::temporary(&failure)
        }
    }
}
