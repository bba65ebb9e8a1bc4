//! PostgreSQL implementation of the user-data document store
//!
//! The whole UserData document lives in one JSONB column. Reads deserialize
//! the column; writes replace it (last-write-wins, as the document contract
//! states).

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use redbutton_core::error::DomainError;
use redbutton_core::traits::{RepoResult, UserDataRepository};
use redbutton_core::UserData;

use super::error::{map_db_error, user_data_not_found};

/// PostgreSQL implementation of UserDataRepository
#[derive(Clone)]
pub struct PgUserDataRepository {
    pool: PgPool,
}

impl PgUserDataRepository {
    /// Create a new PgUserDataRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_document(value: serde_json::Value) -> RepoResult<UserData> {
    serde_json::from_value(value)
        .map_err(|e| DomainError::InternalError(format!("Malformed user-data document: {e}")))
}

fn encode_document(data: &UserData) -> RepoResult<serde_json::Value> {
    serde_json::to_value(data)
        .map_err(|e| DomainError::InternalError(format!("Unserializable user-data document: {e}")))
}

#[async_trait]
impl UserDataRepository for PgUserDataRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Option<UserData>> {
        let result = sqlx::query_scalar::<_, serde_json::Value>(
            r"
            SELECT document FROM user_data WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(decode_document).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> RepoResult<Option<(Uuid, UserData)>> {
        let result = sqlx::query_as::<_, (Uuid, serde_json::Value)>(
            r"
            SELECT user_id, document
            FROM user_data
            WHERE document ->> 'billingCustomerId' = $1
            ",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result
            .map(|(user_id, value)| decode_document(value).map(|data| (user_id, data)))
            .transpose()
    }

    #[instrument(skip(self, data))]
    async fn create_if_absent(&self, user_id: Uuid, data: &UserData) -> RepoResult<()> {
        let document = encode_document(data)?;

        // ON CONFLICT DO NOTHING keeps account initialization idempotent:
        // exactly one document per user, the first write wins.
        sqlx::query(
            r"
            INSERT INTO user_data (user_id, document)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, data))]
    async fn update(&self, user_id: Uuid, data: &UserData) -> RepoResult<()> {
        let document = encode_document(data)?;

        let result = sqlx::query(
            r"
            UPDATE user_data
            SET document = $2, updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_data_not_found(user_id));
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
        assert_send_sync::<PgUserDataRepository>();
    }

    #[test]
    fn test_document_codec_round_trip() {
        let data = UserData::with_defaults();
        let value = encode_document(&data).unwrap();
        // The JSONB path used by find_by_billing_customer must match serde's output
        assert!(value.get("billingCustomerId").is_some() || data.billing_customer_id.is_none());
        let back = decode_document(value).unwrap();
        assert_eq!(back, data);
    }
}
