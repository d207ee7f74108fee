//! REST compute plane.
//!
//! Talks to the managed compute control plane over its REST surface. Every
//! update is a read-modify-write with an `updateMask` query parameter
//! restricting the patch to a single scaling field; the control plane's own
//! optimistic concurrency handles conflicting writers.

use std::time::SystemTime;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use flow_core::{WorkloadKind, WorkloadRef};

use crate::compute::ComputePlane;

const SERVICE_MANUAL_INSTANCES_MASK: &str = "scaling.manualInstanceCount";
const SERVICE_MIN_INSTANCES_MASK: &str = "template.scaling.minInstanceCount";
const POOL_MANUAL_INSTANCES_MASK: &str = "scaling.manualInstanceCount";

/// The scaling-relevant subset of a workload resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkloadResource {
    #[serde(default)]
    scaling: Option<WorkloadScaling>,
    #[serde(default)]
    template: Option<RevisionTemplate>,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkloadScaling {
    #[serde(default)]
    scaling_mode: Option<String>,
    #[serde(default)]
    manual_instance_count: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionTemplate {
    #[serde(default)]
    scaling: Option<RevisionScaling>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionScaling {
    #[serde(default)]
    min_instance_count: Option<i32>,
}

/// Compute plane backed by the control plane's REST API.
pub struct RestComputePlane {
    client: reqwest::Client,
    base_url: String,
}

impl RestComputePlane {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .context("failed to build control-plane HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn workload_url(&self, workload: &WorkloadRef) -> String {
        format!("{}/v1/{}", self.base_url, workload)
    }

    async fn get_workload(&self, workload: &WorkloadRef) -> anyhow::Result<WorkloadResource> {
        let response = self
            .client
            .get(self.workload_url(workload))
            .send()
            .await
            .with_context(|| format!("failed to fetch {workload}"))?
            .error_for_status()
            .with_context(|| format!("fetching {workload} failed"))?;
        Ok(response.json().await?)
    }

    async fn patch_workload(
        &self,
        workload: &WorkloadRef,
        update_mask: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<()> {
        debug!(workload = %workload, mask = update_mask, "patching workload scaling");
        self.client
            .patch(self.workload_url(workload))
            .query(&[("updateMask", update_mask)])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to update {workload}"))?
            .error_for_status()
            .with_context(|| format!("updating {workload} failed"))?;
        Ok(())
    }
}

#[async_trait]
impl ComputePlane for RestComputePlane {
    /// The platform reports no scaling block for workloads that have never
    /// been scaled; that reads as zero instances.
    async fn instance_count(&self, workload: &WorkloadRef) -> anyhow::Result<i32> {
        let resource = self.get_workload(workload).await?;

        if let Some(scaling) = &resource.scaling {
            let manual = scaling.scaling_mode.as_deref() == Some("MANUAL")
                || workload.kind == WorkloadKind::WorkerPool;
            if manual {
                return Ok(scaling.manual_instance_count.unwrap_or(0));
            }
        }

        if workload.kind == WorkloadKind::Service {
            if let Some(scaling) = resource.template.and_then(|t| t.scaling) {
                return Ok(scaling.min_instance_count.unwrap_or(0));
            }
        }

        Ok(0)
    }

    async fn last_deployment_time(&self, workload: &WorkloadRef) -> anyhow::Result<SystemTime> {
        let resource = self.get_workload(workload).await?;
        Ok(resource
            .update_time
            .map(SystemTime::from)
            .unwrap_or(SystemTime::UNIX_EPOCH))
    }

    async fn update_service_min_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        let body = json!({
            "template": { "scaling": { "minInstanceCount": instances } }
        });
        self.patch_workload(workload, SERVICE_MIN_INSTANCES_MASK, body)
            .await
    }

    async fn update_service_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        let body = json!({
            "scaling": { "manualInstanceCount": instances }
        });
        self.patch_workload(workload, SERVICE_MANUAL_INSTANCES_MASK, body)
            .await
    }

    async fn update_worker_pool_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        let body = json!({
            "scaling": { "manualInstanceCount": instances }
        });
        self.patch_workload(workload, POOL_MANUAL_INSTANCES_MASK, body)
            .await
    }
}
