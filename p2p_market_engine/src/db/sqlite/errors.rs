use thiserror::Error;

use crate::traits::OfferStoreError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("User #{0} is not registered")]
    UserNotFound(i64),
    #[error("Offer #{0} does not exist")]
    OfferNotFound(i64),
}

impl From<SqliteDatabaseError> for OfferStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::UserNotFound(id) => OfferStoreError::UserNotFound(id),
            SqliteDatabaseError::OfferNotFound(id) => OfferStoreError::OfferNotFound(id),
            e => OfferStoreError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for OfferStoreError {
    fn from(e: sqlx::Error) -> Self {
        OfferStoreError::DatabaseError(e.to_string())
    }
}
