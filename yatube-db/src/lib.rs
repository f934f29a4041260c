pub mod client;
pub mod memory;
mod record;
pub mod store;

use thiserror::Error;
use yatube_common::model::ModelValidationError;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("A row with the same unique key already exists")]
    UniqueViolation,
    #[error("A referenced row does not exist")]
    ForeignKeyViolation,
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            sqlx::Error::Database(error) if error.is_unique_violation() => Self::UniqueViolation,
            sqlx::Error::Database(error) if error.is_foreign_key_violation() => {
                Self::ForeignKeyViolation
            }
            _ => Self::Sqlx(value),
        }
    }
}
