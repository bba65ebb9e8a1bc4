//! Domain errors - error types for the domain layer

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("User data not found for user: {0}")]
    UserDataNotFound(Uuid),

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Goal not found: {0}")]
    GoalNotFound(String),

    #[error("Initiative not found: {0}")]
    InitiativeNotFound(String),

    #[error("Emotion not found: {0}")]
    EmotionNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Invite has expired")]
    InviteExpired,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("User data already initialized")]
    UserDataAlreadyExists,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::UserDataNotFound(_) => "UNKNOWN_USER_DATA",
            Self::InviteNotFound => "UNKNOWN_INVITE",
            Self::GoalNotFound(_) => "UNKNOWN_GOAL",
            Self::InitiativeNotFound(_) => "UNKNOWN_INITIATIVE",
            Self::EmotionNotFound(_) => "UNKNOWN_EMOTION",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::InviteExpired => "INVITE_EXPIRED",

            // Conflict
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::UserDataAlreadyExists => "USER_DATA_ALREADY_EXISTS",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::UserDataNotFound(_)
                | Self::InviteNotFound
                | Self::GoalNotFound(_)
                | Self::InitiativeNotFound(_)
                | Self::EmotionNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmail
                | Self::WeakPassword(_)
                | Self::InviteExpired
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailAlreadyExists | Self::UserDataAlreadyExists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::UserNotFound(Uuid::nil());
        assert_eq!(err.code(), "UNKNOWN_USER");

        let err = DomainError::InviteExpired;
        assert_eq!(err.code(), "INVITE_EXPIRED");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::UserNotFound(Uuid::nil()).is_not_found());
        assert!(DomainError::GoalNotFound("g1".to_string()).is_not_found());
        assert!(!DomainError::EmailAlreadyExists.is_not_found());
    }

    #[test]
    fn test_is_validation() {
        assert!(DomainError::InviteExpired.is_validation());
        assert!(DomainError::WeakPassword("short".to_string()).is_validation());
        assert!(!DomainError::UserNotFound(Uuid::nil()).is_validation());
    }

    #[test]
    fn test_is_conflict() {
        assert!(DomainError::EmailAlreadyExists.is_conflict());
        assert!(!DomainError::InviteExpired.is_conflict());
    }
}
