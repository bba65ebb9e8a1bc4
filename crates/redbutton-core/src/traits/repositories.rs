//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Invite, User, UserData};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Find an `invited`-status user carrying this invite token
    async fn find_invited_by_token(&self, token: &str) -> RepoResult<Option<User>>;

    /// Create a new user
    async fn create(&self, user: &User) -> RepoResult<()>;

    /// Update an existing user
    async fn update(&self, user: &User) -> RepoResult<()>;
}

// ============================================================================
// Invite Repository
// ============================================================================

#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Find a pending invite for an email address
    async fn find_pending_by_email(&self, email: &str) -> RepoResult<Option<Invite>>;

    /// Find an invite by token
    async fn find_by_token(&self, token: &str) -> RepoResult<Option<Invite>>;

    /// Create a new invite
    async fn create(&self, invite: &Invite) -> RepoResult<()>;

    /// Update an existing invite
    async fn update(&self, invite: &Invite) -> RepoResult<()>;
}

// ============================================================================
// UserData Repository (document store)
// ============================================================================

/// Whole-document access to the per-user data store.
///
/// Writes are last-write-wins over the whole document; callers that need
/// read-modify-write semantics must tolerate concurrent overwrites.
#[async_trait]
pub trait UserDataRepository: Send + Sync {
    /// Load the document for a user
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Option<UserData>>;

    /// Find the owning user of a billing customer id, with their document
    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> RepoResult<Option<(Uuid, UserData)>>;

    /// Create the document for a user; a no-op if one already exists
    /// (account initialization must not duplicate the document)
    async fn create_if_absent(&self, user_id: Uuid, data: &UserData) -> RepoResult<()>;

    /// Replace the document for a user
    async fn update(&self, user_id: Uuid, data: &UserData) -> RepoResult<()>;
}
