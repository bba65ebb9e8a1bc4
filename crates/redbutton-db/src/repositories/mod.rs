//! PostgreSQL repository implementations

mod error;
mod invite;
mod user;
mod user_data;

pub use invite::PgInviteRepository;
pub use user::PgUserRepository;
pub use user_data::PgUserDataRepository;
