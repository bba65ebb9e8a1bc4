//! Domain entities

mod defaults;
mod invite;
mod user;
mod user_data;

pub use defaults::{default_emotions, default_goals, default_settings};
pub use invite::{Invite, InviteStatus, INVITE_EXPIRY_DAYS};
pub use user::{User, UserRole, UserStatus};
pub use user_data::{
    ActionItem, CheckIn, Emotion, EmotionRecord, EntityKind, Goal, Initiative, JournalEntry,
    Settings, SubscriptionType, Theme, UserData,
};

use uuid::Uuid;

/// Generate a fresh opaque id for an embedded sub-record.
///
/// Uniqueness of sub-record ids within their parent array is guaranteed by
/// always generating new ids here, never by a store constraint.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_unique() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
