//! User entity - an account in the wellbeing app

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Pre-created by an admin invite; activated on registration
    Invited,
    #[default]
    Active,
    Inactive,
    Blocked,
}

/// User entity
///
/// `password_hash` is absent for OAuth-only accounts. `invite_token` and
/// `invite_expires` are only set while the account is in `Invited` status
/// and are cleared on redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    /// Personal completion-provider API key, if the user supplied one
    pub api_key: Option<String>,
    pub invite_token: Option<String>,
    pub invite_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with the given email
    pub fn new(email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash: None,
            name: None,
            picture: None,
            google_id: None,
            role: UserRole::User,
            status: UserStatus::Active,
            api_key: None,
            invite_token: None,
            invite_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a pre-registered user in `Invited` status carrying an invite token
    pub fn invited(email: String, invite_token: String, invite_expires: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash: None,
            name: None,
            picture: None,
            google_id: None,
            role: UserRole::User,
            status: UserStatus::Invited,
            api_key: None,
            invite_token: Some(invite_token),
            invite_expires: Some(invite_expires),
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the invite token on this user has passed its expiry
    pub fn invite_expired(&self, now: DateTime<Utc>) -> bool {
        self.invite_expires.is_some_and(|expires| expires < now)
    }

    /// Redeem the invite: set the password hash, activate, and clear token fields
    pub fn activate_with_password(&mut self, password_hash: String) {
        self.password_hash = Some(password_hash);
        self.status = UserStatus::Active;
        self.invite_token = None;
        self.invite_expires = None;
        self.updated_at = Utc::now();
    }
}
