//! Invite service
//!
//! Admin-issued invitations: emailed invites with pending-invite reuse,
//! token verification, and shared-secret invite-link generation.

use chrono::{Duration, Utc};
use rand::RngCore;
use redbutton_common::AppError;
use redbutton_core::{Invite, InviteStatus, User, UserData, INVITE_EXPIRY_DAYS};
use tracing::{info, instrument, warn};

use crate::dto::{
    GenerateInviteLinkRequest, InviteLinkResponse, VerifyInviteData, VerifyInviteResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Whether an invite was freshly created or an existing one re-sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteOutcome {
    Sent,
    Resent,
}

/// Invite service
pub struct InviteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InviteService<'a> {
    /// Create a new InviteService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create (or rotate) an invitation for an email and dispatch the mail
    #[instrument(skip(self), fields(email = %email))]
    pub async fn create_invite(
        &self,
        admin: &User,
        email: &str,
    ) -> ServiceResult<InviteOutcome> {
        if self.ctx.user_repo().find_by_email(email).await?.is_some() {
            return Err(ServiceError::validation(
                "User with this email already exists",
            ));
        }

        let (invite, outcome) =
            if let Some(mut existing) = self.ctx.invite_repo().find_pending_by_email(email).await? {
                existing.rotate(generate_invite_token());
                self.ctx.invite_repo().update(&existing).await?;
                (existing, InviteOutcome::Resent)
            } else {
                let invite = Invite::new(email.to_string(), generate_invite_token(), admin.id);
                self.ctx.invite_repo().create(&invite).await?;
                (invite, InviteOutcome::Sent)
            };

        let invite_url = format!(
            "{}/accept-invite?token={}&email={}",
            self.ctx.config().client.url,
            invite.token,
            urlencoding::encode(email)
        );

        // Mail failure does not fail the invite; the link can be re-sent
        if let Err(e) = self.ctx.mailer().send_invite(email, &invite_url).await {
            warn!(error = %e, "Invitation email dispatch failed");
        }

        info!(invite_id = %invite.id, "Invitation created");

        Ok(outcome)
    }

    /// Verify an invite token and return the invited email
    #[instrument(skip(self, token))]
    pub async fn verify_invite(&self, token: &str) -> ServiceResult<VerifyInviteResponse> {
        // Invite-link tokens live on pre-created invited users
        if let Some(user) = self.ctx.user_repo().find_invited_by_token(token).await? {
            if user.invite_expired(Utc::now()) {
                return Err(ServiceError::validation("Invite token has expired"));
            }
            return Ok(VerifyInviteResponse {
                success: true,
                message: "Invite token is valid".to_string(),
                data: VerifyInviteData { email: user.email },
            });
        }

        // Emailed-invite tokens live on invite records
        let invite = self
            .ctx
            .invite_repo()
            .find_by_token(token)
            .await?
            .filter(|i| i.status == InviteStatus::Pending)
            .ok_or_else(|| {
                ServiceError::not_found("Invite", "invalid invite token or already used")
            })?;

        if invite.is_expired(Utc::now()) {
            return Err(ServiceError::validation("Invite token has expired"));
        }

        Ok(VerifyInviteResponse {
            success: true,
            message: "Invite token is valid".to_string(),
            data: VerifyInviteData {
                email: invite.email,
            },
        })
    }

    /// Generate an invite link guarded by the shared admin secret.
    ///
    /// Pre-creates (or refreshes) an `invited`-status user carrying the
    /// token, seeds their data, and returns web and desktop deep links
    /// without sending email.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn generate_invite_link(
        &self,
        request: GenerateInviteLinkRequest,
    ) -> ServiceResult<InviteLinkResponse> {
        if request.admin_secret != self.ctx.config().auth.admin_secret {
            return Err(ServiceError::App(AppError::AdminRequired));
        }

        if !request.email.contains('@') {
            return Err(ServiceError::validation("Invalid email address"));
        }

        let token = generate_invite_token();
        let expires = Utc::now() + Duration::days(INVITE_EXPIRY_DAYS);

        let user = match self.ctx.user_repo().find_by_email(&request.email).await? {
            Some(user) if user.is_active() => {
                return Err(ServiceError::validation("User already exists and is active"));
            }
            Some(mut user) => {
                user.invite_token = Some(token.clone());
                user.invite_expires = Some(expires);
                self.ctx.user_repo().update(&user).await?;
                user
            }
            None => {
                let user = User::invited(request.email.clone(), token.clone(), expires);
                self.ctx.user_repo().create(&user).await?;
                self.ctx
                    .user_data_repo()
                    .create_if_absent(user.id, &UserData::with_defaults())
                    .await?;
                user
            }
        };

        info!(user_id = %user.id, "Invite link generated");

        let client_url = &self.ctx.config().client.url;
        Ok(InviteLinkResponse {
            success: true,
            message: "Invite link generated successfully".to_string(),
            web_invite_url: format!("{client_url}/register?token={token}"),
            desktop_invite_url: format!("redbutton://register?token={token}"),
            invite_token: token,
            user_id: user.id,
        })
    }
}

/// 32 random bytes, hex-encoded
fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
