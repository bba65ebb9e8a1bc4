//! Database row models
//!
//! Rows are plain `FromRow` structs converted to/from domain entities at the
//! repository boundary. Role and status columns are stored as text.

use chrono::{DateTime, Utc};
use redbutton_core::{Invite, InviteStatus, User, UserRole, UserStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Row in the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub google_id: Option<String>,
    pub role: String,
    pub status: String,
    pub api_key: Option<String>,
    pub invite_token: Option<String>,
    pub invite_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn role_to_str(role: UserRole) -> &'static str {
    match role {
        UserRole::User => "user",
        UserRole::Admin => "admin",
    }
}

pub(crate) fn role_from_str(s: &str) -> UserRole {
    match s {
        "admin" => UserRole::Admin,
        _ => UserRole::User,
    }
}

pub(crate) fn status_to_str(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Invited => "invited",
        UserStatus::Active => "active",
        UserStatus::Inactive => "inactive",
        UserStatus::Blocked => "blocked",
    }
}

pub(crate) fn status_from_str(s: &str) -> UserStatus {
    match s {
        "invited" => UserStatus::Invited,
        "inactive" => UserStatus::Inactive,
        "blocked" => UserStatus::Blocked,
        _ => UserStatus::Active,
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            picture: row.picture,
            google_id: row.google_id,
            role: role_from_str(&row.role),
            status: status_from_str(&row.status),
            api_key: row.api_key,
            invite_token: row.invite_token,
            invite_expires: row.invite_expires,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row in the `invites` table
#[derive(Debug, Clone, FromRow)]
pub struct InviteRow {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn invite_status_to_str(status: InviteStatus) -> &'static str {
    match status {
        InviteStatus::Pending => "pending",
        InviteStatus::Accepted => "accepted",
        InviteStatus::Expired => "expired",
    }
}

pub(crate) fn invite_status_from_str(s: &str) -> InviteStatus {
    match s {
        "accepted" => InviteStatus::Accepted,
        "expired" => InviteStatus::Expired,
        _ => InviteStatus::Pending,
    }
}

impl From<InviteRow> for Invite {
    fn from(row: InviteRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            token: row.token,
            expires: row.expires,
            status: invite_status_from_str(&row.status),
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(role_from_str(role_to_str(UserRole::Admin)), UserRole::Admin);
        assert_eq!(role_from_str(role_to_str(UserRole::User)), UserRole::User);
        // Unknown values degrade to the default role
        assert_eq!(role_from_str("superuser"), UserRole::User);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            UserStatus::Invited,
            UserStatus::Active,
            UserStatus::Inactive,
            UserStatus::Blocked,
        ] {
            assert_eq!(status_from_str(status_to_str(status)), status);
        }
    }

    #[test]
    fn test_invite_status_round_trip() {
        for status in [
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Expired,
        ] {
            assert_eq!(
                invite_status_from_str(invite_status_to_str(status)),
                status
            );
        }
    }
}
