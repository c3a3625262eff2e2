//! Single retry for idempotent reads.

use std::future::Future;

use crate::ports::StoreError;

/// Run a read, repeating it once if the first attempt failed transiently.
///
/// Only for operations with no side effects.
pub(crate) async fn retry_read<T, F, Fut>(
    operation: &'static str,
    mut read: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match read().await {
        Err(err) if err.is_transient() => {
            tracing::warn!(operation, error = %err, "transient store error, retrying once");
            read().await
        }
        result => result,
    }
}
