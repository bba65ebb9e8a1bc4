//! Database error mapping helpers

use redbutton_core::DomainError;
use uuid::Uuid;

/// Map a sqlx error to a domain error
pub(crate) fn map_db_error(err: sqlx::Error) -> DomainError {
    DomainError::DatabaseError(err.to_string())
}

/// Map a sqlx error, translating unique-constraint violations
pub(crate) fn map_unique_violation<F>(err: sqlx::Error, conflict: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return conflict();
        }
    }
    map_db_error(err)
}

pub(crate) fn user_not_found(id: Uuid) -> DomainError {
    DomainError::UserNotFound(id)
}

pub(crate) fn user_data_not_found(user_id: Uuid) -> DomainError {
    DomainError::UserDataNotFound(user_id)
}
