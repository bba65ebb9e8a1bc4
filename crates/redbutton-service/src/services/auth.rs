//! Authentication service
//!
//! Handles login, registration (open and invite-redemption), OAuth login,
//! and account-data initialization.

use chrono::Utc;
use redbutton_common::auth::{hash_password, verify_password};
use redbutton_common::AppError;
use redbutton_core::{InviteStatus, OAuthProfile, User, UserData};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{AuthResponse, LoginRequest, OAuthLoginRequest, RegisterRequest, UserView};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Login with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let user = self
            .ctx
            .user_repo()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: user not found");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        if !user.is_active() {
            warn!(user_id = %user.id, "Login failed: account not active");
            return Err(ServiceError::App(AppError::AccountNotActive));
        }

        // OAuth-only accounts have no password hash and cannot password-login
        let password_hash = user.password_hash.as_deref().ok_or_else(|| {
            warn!(user_id = %user.id, "Login failed: no password set");
            ServiceError::App(AppError::InvalidCredentials)
        })?;

        let is_valid = verify_password(&request.password, password_hash)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        if !is_valid {
            warn!(user_id = %user.id, "Login failed: invalid password");
            return Err(ServiceError::App(AppError::InvalidCredentials));
        }

        info!(user_id = %user.id, "User logged in");

        let token = self
            .ctx
            .jwt_service()
            .issue(&user)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        Ok(AuthResponse::new(token, &user))
    }

    /// Register a new user, either redeeming an invite token or openly
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        if request.password.len() < 8 {
            return Err(ServiceError::validation(
                "Password must be at least 8 characters",
            ));
        }

        if let Some(token) = &request.invite_token {
            self.register_with_invite(token, &request.password).await
        } else {
            let email = request
                .email
                .as_deref()
                .ok_or_else(|| ServiceError::validation("Email is required"))?;
            self.register_open(email, &request.password).await
        }
    }

    async fn register_with_invite(
        &self,
        token: &str,
        password: &str,
    ) -> ServiceResult<AuthResponse> {
        // Invite-link redemption: a pre-created user carries the token
        if let Some(mut user) = self.ctx.user_repo().find_invited_by_token(token).await? {
            if user.invite_expired(Utc::now()) {
                return Err(ServiceError::validation("Invite token has expired"));
            }

            let password_hash =
                hash_password(password).map_err(|e| ServiceError::internal(e.to_string()))?;
            user.activate_with_password(password_hash);
            self.ctx.user_repo().update(&user).await?;

            self.initialize_user_data(user.id).await?;

            info!(user_id = %user.id, "Invited user registered");

            let jwt = self
                .ctx
                .jwt_service()
                .issue(&user)
                .map_err(|e| ServiceError::internal(e.to_string()))?;
            return Ok(AuthResponse::new(jwt, &user));
        }

        // Emailed-invite redemption: the token lives on an invite record
        let mut invite = self
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

        let password_hash =
            hash_password(password).map_err(|e| ServiceError::internal(e.to_string()))?;

        let mut user = User::new(invite.email.clone());
        user.password_hash = Some(password_hash);
        self.ctx.user_repo().create(&user).await?;

        invite.status = InviteStatus::Accepted;
        self.ctx.invite_repo().update(&invite).await?;

        self.initialize_user_data(user.id).await?;

        info!(user_id = %user.id, "Emailed invite redeemed");

        let jwt = self
            .ctx
            .jwt_service()
            .issue(&user)
            .map_err(|e| ServiceError::internal(e.to_string()))?;
        Ok(AuthResponse::new(jwt, &user))
    }

    async fn register_open(&self, email: &str, password: &str) -> ServiceResult<AuthResponse> {
        let existing = self.ctx.user_repo().find_by_email(email).await?;

        let password_hash =
            hash_password(password).map_err(|e| ServiceError::internal(e.to_string()))?;

        let user = match existing {
            Some(user) if user.is_active() => {
                return Err(ServiceError::validation("User already exists and is active"));
            }
            Some(mut user) => {
                // A dormant (invited/inactive) record for this email is
                // claimed by the open registration
                user.activate_with_password(password_hash);
                self.ctx.user_repo().update(&user).await?;
                user
            }
            None => {
                let mut user = User::new(email.to_string());
                user.password_hash = Some(password_hash);
                self.ctx.user_repo().create(&user).await?;
                user
            }
        };

        self.initialize_user_data(user.id).await?;

        info!(user_id = %user.id, "User registered");

        let jwt = self
            .ctx
            .jwt_service()
            .issue(&user)
            .map_err(|e| ServiceError::internal(e.to_string()))?;
        Ok(AuthResponse::new(jwt, &user))
    }

    /// Login or register via a provider-issued id token
    #[instrument(skip(self, request), fields(provider = %request.provider))]
    pub async fn oauth_login(&self, request: OAuthLoginRequest) -> ServiceResult<AuthResponse> {
        if request.provider != "google" {
            return Err(ServiceError::validation("Unsupported provider"));
        }

        let profile = self.ctx.oauth().verify_id_token(&request.token).await?;
        self.oauth_profile_login(profile).await
    }

    /// Find-or-create a user from a verified OAuth profile and issue a token
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn oauth_profile_login(&self, profile: OAuthProfile) -> ServiceResult<AuthResponse> {
        let user = match self.ctx.user_repo().find_by_email(&profile.email).await? {
            Some(user) => {
                if !user.is_active() {
                    return Err(ServiceError::App(AppError::AccountNotActive));
                }
                user
            }
            None => {
                let mut user = User::new(profile.email.clone());
                user.name = profile.name.clone();
                user.picture = profile.picture.clone();
                user.google_id = Some(profile.subject.clone());
                self.ctx.user_repo().create(&user).await?;
                self.initialize_user_data(user.id).await?;

                info!(user_id = %user.id, "OAuth user created");
                user
            }
        };

        let jwt = self
            .ctx
            .jwt_service()
            .issue(&user)
            .map_err(|e| ServiceError::internal(e.to_string()))?;
        Ok(AuthResponse::new(jwt, &user))
    }

    /// Public view of the current user
    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: Uuid) -> ServiceResult<UserView> {
        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id.to_string()))?;

        Ok(UserView::from(&user))
    }

    /// Seed the user's data document with defaults, exactly once
    pub async fn initialize_user_data(&self, user_id: Uuid) -> ServiceResult<()> {
        self.ctx
            .user_data_repo()
            .create_if_absent(user_id, &UserData::with_defaults())
            .await?;
        Ok(())
    }
}
