//! Logical scale request/response messages.
//!
//! The metric-provider stage assembles one `ScaleRequest` per cycle covering
//! every workload it collected metrics for; the scaler stage answers with a
//! per-workload status. Only the logical shape matters here — transports are
//! free to serialize it however they like.

use serde::{Deserialize, Serialize};

use crate::types::{MetricTarget, ScaleTargetRef, ScalingBehavior};

/// One cycle's aggregated metrics for all workloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleRequest {
    pub scaled_object_metrics: Vec<ScaledObjectMetrics>,
}

/// Metrics collected for a single scaled object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledObjectMetrics {
    pub scaled_object: ScaledObjectRef,
    pub metrics: Vec<MetricSample>,
}

/// The scaler-stage view of a scaled object: its target plus the settings
/// the reconciler needs to bound and stabilize recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledObjectRef {
    pub scale_target_ref: ScaleTargetRef,
    pub scaler_settings: ScalerSettings,
}

/// Replica bounds and scaling behavior for one workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerSettings {
    pub min_instances: i32,
    pub max_instances: i32,
    pub behavior: ScalingBehavior,
}

/// One trigger's metric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub trigger_id: String,
    pub trigger_type: String,
    pub value: f64,
    pub target: MetricTarget,
}

/// Per-workload scaling outcomes for a `ScaleRequest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleResponse {
    pub results: Vec<ScalingResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingResult {
    pub scale_target_name: String,
    pub status: ScalingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingStatus {
    Succeeded,
    Failed,
}
