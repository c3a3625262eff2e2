//! Classification of `sqlx` failures into `StoreError`.

use crate::ports::StoreError;

/// SQLSTATE codes that mean the transaction was rolled back and may be retried.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Map a failure from any statement before commit.
pub(crate) fn store_error(context: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::UniqueViolation(format!("{}: {}", context, db_err))
        }
        sqlx::Error::Database(db_err)
            if matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ) =>
        {
            StoreError::Unavailable(format!("{}: {}", context, db_err))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{}: {}", context, err))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(context.to_string()),
        other => StoreError::Database(format!("{}: {}", context, other)),
    }
}

/// Map a failure from `COMMIT`.
///
/// A lost connection during commit leaves the outcome unknown; a database
/// error means the server rejected the commit and rolled back.
pub(crate) fn commit_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::Protocol(_) => {
            StoreError::CommitUncertain(format!("commit: {}", err))
        }
        other => store_error("commit", other),
    }
}
