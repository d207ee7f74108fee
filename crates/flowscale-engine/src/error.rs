//! Engine error types.

use thiserror::Error;

use flow_core::WorkloadParseError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while scaling a workload.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    WorkloadParse(#[from] WorkloadParseError),

    #[error("min-instances mode is not supported for worker pool workloads")]
    WorkerPoolMinInstances,

    #[error("compute plane error: {0}")]
    Compute(#[from] anyhow::Error),
}
