//! The configuration document.
//!
//! Top-level deserialization is strict: unknown fields at the document or
//! spec level are rejected so typos fail at startup rather than silently
//! disabling a workload.

use serde::{Deserialize, Serialize};

use flow_core::{ObjectMeta, ScaledObjectSpec, TriggerAuthentication};

/// The fixed `apiVersion` of the configuration document.
pub const API_VERSION: &str = "flowscale.dev/v1alpha1";

/// The fixed `kind` of the configuration document.
pub const KIND: &str = "FlowScaleConfig";

/// The parsed configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FlowConfig {
    pub api_version: String,
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,

    pub spec: FlowConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FlowConfigSpec {
    /// Polling interval in seconds; omission means on-demand only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval: Option<u32>,

    #[serde(default)]
    pub scaled_objects: Vec<ScaledObjectEntry>,

    #[serde(default)]
    pub trigger_authentications: Vec<TriggerAuthentication>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledObjectEntry {
    pub spec: ScaledObjectSpec,
}
