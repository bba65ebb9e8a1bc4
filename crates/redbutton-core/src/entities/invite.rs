//! Invite entity - admin-issued registration invitations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days an invite stays redeemable
pub const INVITE_EXPIRY_DAYS: i64 = 7;

/// Invite lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
}

/// Invitation record created by an admin and consumed by registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub status: InviteStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invite {
    /// Create a pending invite with the standard 7-day expiry
    pub fn new(email: String, token: String, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            token,
            expires: now + Duration::days(INVITE_EXPIRY_DAYS),
            status: InviteStatus::Pending,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }

    /// Replace the token and restart the expiry window (invite resend)
    pub fn rotate(&mut self, token: String) {
        self.token = token;
        self.expires = Utc::now() + Duration::days(INVITE_EXPIRY_DAYS);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_invite_is_pending() {
        let invite = Invite::new("a@b.com".to_string(), "tok".to_string(), Uuid::new_v4());
        assert_eq!(invite.status, InviteStatus::Pending);
        assert!(!invite.is_expired(Utc::now()));
    }

    #[test]
    fn test_expiry_window() {
        let invite = Invite::new("a@b.com".to_string(), "tok".to_string(), Uuid::new_v4());
        let later = Utc::now() + Duration::days(INVITE_EXPIRY_DAYS + 1);
        assert!(invite.is_expired(later));
    }

    #[test]
    fn test_rotate_replaces_token_and_expiry() {
        let mut invite = Invite::new("a@b.com".to_string(), "old".to_string(), Uuid::new_v4());
        let old_expires = invite.expires;
        invite.rotate("new".to_string());

        assert_eq!(invite.token, "new");
        assert!(invite.expires >= old_expires);
        assert_eq!(invite.status, InviteStatus::Pending);
    }
}
