//! Domain types for scaled objects, triggers, and scaling behavior.
//!
//! These types are the validated form of the configuration document and are
//! shared by the metric-provider stage (which builds scalers from them) and
//! the scaler stage (which applies the scaling behavior they carry).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Scaled objects ─────────────────────────────────────────────────

/// A workload plus its triggers, replica bounds, and scaling behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledObjectSpec {
    pub scale_target_ref: ScaleTargetRef,

    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replica_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replica_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedConfig>,

    /// Only valid at the top level of the configuration document; rejected
    /// here by validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval: Option<i32>,
}

/// Reference to the workload a scaled object controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleTargetRef {
    pub name: String,
}

/// One configured metric source attached to a workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSpec {
    /// Selects the scaler constructor; unknown types fail construction.
    #[serde(rename = "type")]
    pub trigger_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_ref: Option<AuthenticationRef>,
}

/// Reference to a named trigger authentication record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationRef {
    pub name: String,
}

/// Advanced per-workload scaling settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_pod_autoscaler_config: Option<HorizontalPodAutoscalerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalPodAutoscalerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<ScalingBehavior>,
}

impl ScaledObjectSpec {
    /// The behavior carried by this scaled object, if any was configured.
    pub fn behavior(&self) -> Option<&ScalingBehavior> {
        self.advanced
            .as_ref()?
            .horizontal_pod_autoscaler_config
            .as_ref()?
            .behavior
            .as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut Option<ScalingBehavior> {
        &mut self
            .advanced
            .get_or_insert_with(Default::default)
            .horizontal_pod_autoscaler_config
            .get_or_insert_with(Default::default)
            .behavior
    }
}

// ── Scaling behavior ───────────────────────────────────────────────

/// Direction-specific rules governing how fast a workload may change size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingBehavior {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_up: Option<ScalingRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down: Option<ScalingRules>,
}

/// Stabilization window plus rate-limit policies for one scaling direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingRules {
    #[serde(default)]
    pub stabilization_window_seconds: i32,

    #[serde(default)]
    pub policies: Vec<ScalingPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_policy: Option<SelectPolicy>,
}

impl ScalingRules {
    /// The select policy, defaulting to `Max` when unspecified.
    pub fn select(&self) -> SelectPolicy {
        self.select_policy.unwrap_or(SelectPolicy::Max)
    }
}

/// A rate-limit clause: at most `value` percent or instances per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicy {
    #[serde(rename = "type")]
    pub kind: PolicyKind,
    pub value: i32,
    pub period_seconds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    Percent,
    Instances,
}

/// How multiple policies in the same direction combine.
///
/// `Max` always means "most permissive" regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectPolicy {
    Max,
    Min,
    Disabled,
}

// ── Metric targets ─────────────────────────────────────────────────

/// The target a metric value is compared against.
///
/// `Value` compares the raw metric against the target scaled by the current
/// instance count; `AverageValue` treats the metric as an aggregate and the
/// target as a per-instance share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricTarget {
    TargetValue(f64),
    TargetAverageValue(f64),
}

impl MetricTarget {
    /// Resolve a raw target pair into a single variant.
    ///
    /// `AverageValue` wins when both are supplied; an absent field is
    /// encoded as zero on the chosen variant.
    pub fn from_raw(value: Option<f64>, average_value: Option<f64>) -> Self {
        match average_value {
            Some(avg) => MetricTarget::TargetAverageValue(avg),
            None => MetricTarget::TargetValue(value.unwrap_or(0.0)),
        }
    }
}

// ── Trigger authentication ─────────────────────────────────────────

/// A named authentication record referenced by triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerAuthentication {
    pub metadata: ObjectMeta,
    pub spec: TriggerAuthenticationSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAuthenticationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_identity: Option<PodIdentity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_manager: Option<SecretManagerAuth>,
}

/// Ambient identity attached to outbound metric-source calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodIdentity {
    pub provider: String,
}

/// Secret-store backed auth parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretManagerAuth {
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
}

/// One secret to resolve into a named auth parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Auth parameter key the secret value is bound to.
    pub parameter: String,
    /// Secret identifier in the secret store.
    pub id: String,
    /// Secret version; empty selects the latest.
    #[serde(default)]
    pub version: String,
}
