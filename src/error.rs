use thiserror::Error;

use crate::storage::StorageError;

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Failure of one pipeline stage
///
/// Upstream failures are absorbed into degraded results; what reaches the
/// orchestrator as an error is the store being unusable.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("alert {0} not found")]
    AlertNotFound(i64),

    #[error("alert {id} is {status}, only active alerts can be suppressed")]
    AlertNotActive { id: i64, status: String },
}
