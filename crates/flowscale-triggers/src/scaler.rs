//! The scaler capability and its construction context.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use flow_core::{MetricTarget, PodIdentity};

/// Errors from constructing or reading a scaler.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("no scaler found for type: {0}")]
    UnknownType(String),

    #[error("invalid trigger metadata {key:?}: {message}")]
    InvalidMetadata { key: String, message: String },

    #[error("failed to resolve trigger auth: {0}")]
    Auth(#[from] flowscale_auth::AuthError),

    #[error("metric source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read metric value: {0}")]
    Read(String),
}

/// A metric's target specification as reported by a scaler.
///
/// Both target fields are optional at this boundary; [`TargetSpec::target`]
/// resolves them into a single variant with average-value precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub metric_name: String,
    pub target_value: Option<f64>,
    pub target_average_value: Option<f64>,
}

impl TargetSpec {
    pub fn target(&self) -> MetricTarget {
        MetricTarget::from_raw(self.target_value, self.target_average_value)
    }
}

/// Per-trigger construction context handed to scaler constructors.
#[derive(Debug, Clone)]
pub struct ScalerConfig {
    /// Fully qualified name of the workload this trigger belongs to.
    pub workload_name: String,
    pub trigger_name: String,
    pub trigger_type: String,
    /// Index of the trigger within its scaled object.
    pub trigger_index: usize,
    pub trigger_metadata: HashMap<String, String>,
    /// Resolved auth parameters, empty when the trigger carries no auth ref.
    pub auth_params: HashMap<String, String>,
    pub pod_identity: Option<PodIdentity>,
    /// Upper bound for any outbound HTTP call the scaler makes.
    pub global_http_timeout: Duration,
    /// The scaler feeds a metric pipeline rather than driving activation.
    pub as_metric_source: bool,
}

impl ScalerConfig {
    /// Required metadata value, or an `InvalidMetadata` error naming the key.
    pub fn require_metadata(&self, key: &str) -> Result<&str, TriggerError> {
        self.trigger_metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TriggerError::InvalidMetadata {
                key: key.to_string(),
                message: "must be set".to_string(),
            })
    }

    /// Optional metadata value parsed as `f64`.
    pub fn metadata_f64(&self, key: &str) -> Result<Option<f64>, TriggerError> {
        match self.trigger_metadata.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|e| TriggerError::InvalidMetadata {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }
}

/// One configured metric source.
///
/// Contract: only the first element of each returned list is used; scalers
/// returning more are logged and the remainder discarded. An empty spec
/// list means the trigger has no work to do this cycle.
#[async_trait]
pub trait Scaler: Send + Sync {
    /// Target specifications for the metrics this scaler produces.
    async fn metric_spec(&self) -> Vec<TargetSpec>;

    /// Current metric values plus whether the trigger is active.
    async fn metrics_and_activity(&self) -> Result<(Vec<f64>, bool), TriggerError>;

    /// Release resources held by the scaler. Called at cycle end.
    async fn close(&mut self) {}
}
