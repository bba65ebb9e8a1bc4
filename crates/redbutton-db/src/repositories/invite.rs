//! PostgreSQL implementation of InviteRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use redbutton_core::error::DomainError;
use redbutton_core::traits::{InviteRepository, RepoResult};
use redbutton_core::Invite;

use crate::models::{invite_status_to_str, InviteRow};

use super::error::map_db_error;

const INVITE_COLUMNS: &str = "id, email, token, expires, status, created_by, created_at, updated_at";

/// PostgreSQL implementation of InviteRepository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    /// Create a new PgInviteRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    #[instrument(skip(self))]
    async fn find_pending_by_email(&self, email: &str) -> RepoResult<Option<Invite>> {
        let result = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE LOWER(email) = LOWER($1) AND status = 'pending'"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Invite::from))
    }

    #[instrument(skip(self, token))]
    async fn find_by_token(&self, token: &str) -> RepoResult<Option<Invite>> {
        let result = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Invite::from))
    }

    #[instrument(skip(self, invite), fields(invite_id = %invite.id))]
    async fn create(&self, invite: &Invite) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO invites (id, email, token, expires, status, created_by, created_at, updated_at)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(invite.id)
        .bind(&invite.email)
        .bind(&invite.token)
        .bind(invite.expires)
        .bind(invite_status_to_str(invite.status))
        .bind(invite.created_by)
        .bind(invite.created_at)
        .bind(invite.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, invite), fields(invite_id = %invite.id))]
    async fn update(&self, invite: &Invite) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE invites
            SET token = $2, expires = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(invite.id)
        .bind(&invite.token)
        .bind(invite.expires)
        .bind(invite_status_to_str(invite.status))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InviteNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgInviteRepository>();
    }
}
