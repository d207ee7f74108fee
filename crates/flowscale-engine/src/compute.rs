//! Compute control-plane abstraction.
//!
//! The reconciler talks to the managed compute platform through this narrow
//! trait. The real platform client is deliberately thin: read the workload's
//! scaling state, patch exactly one scaling field. [`InMemoryComputePlane`]
//! backs tests and the daemon's dry-run mode.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::info;

use flow_core::{WorkloadKind, WorkloadRef};

/// Thin interface to the compute control plane.
///
/// Implementations are shared and must be safe for concurrent use. A
/// workload the platform has never scaled reports zero instances.
#[async_trait]
pub trait ComputePlane: Send + Sync {
    /// Current instance count of the workload.
    async fn instance_count(&self, workload: &WorkloadRef) -> anyhow::Result<i32>;

    /// When the workload was last deployed; the epoch when never.
    async fn last_deployment_time(&self, workload: &WorkloadRef) -> anyhow::Result<SystemTime>;

    /// Patch a service's autoscaling floor (revision-template min instances).
    async fn update_service_min_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()>;

    /// Patch a service's manual instance count.
    async fn update_service_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()>;

    /// Patch a worker pool's manual instance count.
    async fn update_worker_pool_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
struct WorkloadState {
    instances: i32,
    min_instances: i32,
    last_deployed: Option<SystemTime>,
}

/// In-memory compute plane for tests and dry runs.
///
/// Updates are applied to a process-local map and logged; reads of unknown
/// workloads report zero instances, matching the platform's behavior for
/// workloads that have never been scaled.
#[derive(Debug, Default)]
pub struct InMemoryComputePlane {
    workloads: Mutex<HashMap<String, WorkloadState>>,
    fail_updates: Mutex<bool>,
}

impl InMemoryComputePlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a workload with an instance count.
    pub fn with_workload(self, workload: &WorkloadRef, instances: i32) -> Self {
        self.set_instances(workload, instances);
        self
    }

    pub fn set_instances(&self, workload: &WorkloadRef, instances: i32) {
        let mut workloads = self.workloads.lock().unwrap();
        let state = workloads.entry(workload.to_string()).or_default();
        state.instances = instances;
        state.last_deployed = Some(SystemTime::now());
    }

    pub fn instances(&self, workload: &WorkloadRef) -> i32 {
        let workloads = self.workloads.lock().unwrap();
        workloads
            .get(&workload.to_string())
            .map(|s| s.instances)
            .unwrap_or(0)
    }

    pub fn min_instances(&self, workload: &WorkloadRef) -> i32 {
        let workloads = self.workloads.lock().unwrap();
        workloads
            .get(&workload.to_string())
            .map(|s| s.min_instances)
            .unwrap_or(0)
    }

    /// Make every subsequent update fail. Used to exercise error paths.
    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }

    fn update(
        &self,
        workload: &WorkloadRef,
        field: &str,
        apply: impl FnOnce(&mut WorkloadState),
    ) -> anyhow::Result<()> {
        if *self.fail_updates.lock().unwrap() {
            anyhow::bail!("injected update failure for {workload}");
        }
        let mut workloads = self.workloads.lock().unwrap();
        let state = workloads.entry(workload.to_string()).or_default();
        apply(state);
        state.last_deployed = Some(SystemTime::now());
        info!(workload = %workload, field, "applied instance update");
        Ok(())
    }
}

#[async_trait]
impl ComputePlane for InMemoryComputePlane {
    async fn instance_count(&self, workload: &WorkloadRef) -> anyhow::Result<i32> {
        Ok(self.instances(workload))
    }

    async fn last_deployment_time(&self, workload: &WorkloadRef) -> anyhow::Result<SystemTime> {
        let workloads = self.workloads.lock().unwrap();
        Ok(workloads
            .get(&workload.to_string())
            .and_then(|s| s.last_deployed)
            .unwrap_or(SystemTime::UNIX_EPOCH))
    }

    async fn update_service_min_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        debug_assert_eq!(workload.kind, WorkloadKind::Service);
        self.update(workload, "template.scaling.minInstanceCount", |state| {
            state.min_instances = instances;
            state.instances = instances;
        })
    }

    async fn update_service_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        debug_assert_eq!(workload.kind, WorkloadKind::Service);
        self.update(workload, "scaling.manualInstanceCount", |state| {
            state.instances = instances;
        })
    }

    async fn update_worker_pool_manual_instances(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> anyhow::Result<()> {
        debug_assert_eq!(workload.kind, WorkloadKind::WorkerPool);
        self.update(workload, "scaling.manualInstanceCount", |state| {
            state.instances = instances;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> WorkloadRef {
        WorkloadRef::parse("projects/acme/locations/us-central1/services/api").unwrap()
    }

    #[tokio::test]
    async fn unknown_workload_reports_zero_instances() {
        let plane = InMemoryComputePlane::new();
        assert_eq!(plane.instance_count(&service()).await.unwrap(), 0);
        assert_eq!(
            plane.last_deployment_time(&service()).await.unwrap(),
            SystemTime::UNIX_EPOCH
        );
    }

    #[tokio::test]
    async fn manual_update_changes_instance_count() {
        let plane = InMemoryComputePlane::new().with_workload(&service(), 5);
        plane
            .update_service_manual_instances(&service(), 9)
            .await
            .unwrap();
        assert_eq!(plane.instance_count(&service()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn min_instances_update_tracks_floor() {
        let plane = InMemoryComputePlane::new();
        plane
            .update_service_min_instances(&service(), 3)
            .await
            .unwrap();
        assert_eq!(plane.min_instances(&service()), 3);
        assert_eq!(plane.instance_count(&service()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let plane = InMemoryComputePlane::new();
        plane.fail_updates(true);
        assert!(plane
            .update_service_manual_instances(&service(), 2)
            .await
            .is_err());
        assert_eq!(plane.instance_count(&service()).await.unwrap(), 0);
    }
}
