use thiserror::Error;

use crate::{db_types::Cents, mo_api::errors::EngineError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("User account not found: {0}")]
    AccountNotFound(i64),
    #[error("Store not found: {0}")]
    StoreNotFound(i64),
    #[error("User #{user_id} cannot pay {required}. Available balance: {available}")]
    InsufficientBalance { user_id: i64, required: Cents, available: Cents },
    #[error("User #{0} balance would become negative")]
    NegativeBalance(i64),
}

/// A readable explanation of a unique constraint violation, based on the constraint that failed.
fn conflict_message(db_message: &str) -> String {
    if db_message.contains("memberships.") {
        "Already requested or a member".into()
    } else if db_message.contains("users.email") {
        "This email address is already registered".into()
    } else if db_message.contains("admins.email") {
        "An admin with this email address already exists".into()
    } else if db_message.contains("stores.owner_id") {
        "This user already owns a store".into()
    } else {
        "The record already exists".into()
    }
}

impl From<SqliteDatabaseError> for EngineError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DriverError(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                EngineError::Conflict(conflict_message(db_err.message()))
            },
            SqliteDatabaseError::DriverError(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                EngineError::NotFound("A referenced record".into())
            },
            SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut) |
            SqliteDatabaseError::DriverError(sqlx::Error::PoolClosed) => {
                EngineError::Unavailable("The database is not accepting connections".into())
            },
            SqliteDatabaseError::AccountNotFound(id) => EngineError::NotFound(format!("User #{id}")),
            SqliteDatabaseError::StoreNotFound(id) => EngineError::NotFound(format!("Store #{id}")),
            SqliteDatabaseError::InsufficientBalance { required, available, .. } => {
                EngineError::InsufficientBalance { required, available }
            },
            e @ SqliteDatabaseError::NegativeBalance(_) => EngineError::Validation(e.to_string()),
            e => EngineError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        SqliteDatabaseError::from(e).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conflict_messages() {
        assert_eq!(
            conflict_message("UNIQUE constraint failed: memberships.user_id, memberships.store_id"),
            "Already requested or a member"
        );
        assert_eq!(conflict_message("UNIQUE constraint failed: users.email"), "This email address is already registered");
        assert_eq!(conflict_message("UNIQUE constraint failed: stores.owner_id"), "This user already owns a store");
    }

    #[test]
    fn domain_errors_map_onto_the_engine_taxonomy() {
        let e: EngineError = SqliteDatabaseError::AccountNotFound(3).into();
        assert_eq!(e, EngineError::NotFound("User #3".into()));
        let e: EngineError = SqliteDatabaseError::InsufficientBalance {
            user_id: 1,
            required: Cents::from(30),
            available: Cents::from(10),
        }
        .into();
        assert!(matches!(e, EngineError::InsufficientBalance { .. }));
        let e: EngineError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(e, EngineError::Unavailable(_)));
        let e: EngineError = sqlx::Error::RowNotFound.into();
        assert!(matches!(e, EngineError::DatabaseError(_)));
    }

    #[test]
    fn internal_failures_are_not_blamed_on_the_client() {
        let e: EngineError = SqliteDatabaseError::QueryError("Order #4 vanished".into()).into();
        assert_eq!(e, EngineError::DatabaseError("Database query error: Order #4 vanished".into()));
        let e: EngineError = SqliteDatabaseError::StoreNotFound(9).into();
        assert_eq!(e, EngineError::NotFound("Store #9".into()));
        let e: EngineError = SqliteDatabaseError::NegativeBalance(2).into();
        assert_eq!(e, EngineError::Validation("User #2 balance would become negative".into()));
    }
}
