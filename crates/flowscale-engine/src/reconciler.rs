//! Per-workload reconciliation.
//!
//! For one scaled object's metrics: compute the unbounded recommendation
//! (the maximum across contributing triggers), stabilize it, clamp it to the
//! configured replica bounds, and issue the matching control-plane update.
//! The stabilizer is marked only after an update actually went through.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use flow_core::{
    MetricTarget, ScaledObjectMetrics, ScalingStatus, WorkloadKind, WorkloadRef,
};

use crate::compute::ComputePlane;
use crate::error::{EngineError, EngineResult};
use crate::metrics::ScalingMetrics;
use crate::recommend::{target_average_value_recommendation, target_value_recommendation};
use crate::stabilizer::ScalingStabilizer;

/// Reconciles workloads against the compute control plane.
///
/// Holds the per-workload stabilizer map — the only state that survives
/// across cycles. Stabilizers are created lazily at first observation.
pub struct Reconciler {
    compute: Arc<dyn ComputePlane>,
    metrics: Option<Arc<ScalingMetrics>>,
    /// Scale services by patching the autoscaling floor instead of the
    /// manual instance count. Not supported for worker pools.
    use_min_instances: bool,
    stabilizers: HashMap<String, ScalingStabilizer>,
}

impl Reconciler {
    pub fn new(compute: Arc<dyn ComputePlane>, use_min_instances: bool) -> Self {
        Self {
            compute,
            metrics: None,
            use_min_instances,
            stabilizers: HashMap::new(),
        }
    }

    /// Emit scaling gauges into the given registry.
    pub fn with_metrics(mut self, metrics: Arc<ScalingMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Scale one workload from its collected metrics.
    ///
    /// A workload with no valid trigger reports `Failed` without touching
    /// the control plane; an empty metric list scales the workload to zero.
    pub async fn scale(&mut self, entry: &ScaledObjectMetrics) -> EngineResult<ScalingStatus> {
        let now = Instant::now();
        let workload_name = &entry.scaled_object.scale_target_ref.name;
        let workload = WorkloadRef::parse(workload_name)?;

        if workload.kind == WorkloadKind::WorkerPool && self.use_min_instances {
            return Err(EngineError::WorkerPoolMinInstances);
        }

        let current = self.compute.instance_count(&workload).await?;
        let last_deployed = self.compute.last_deployment_time(&workload).await?;
        info!(workload = %workload_name, current, "read current instance count");
        debug!(workload = %workload_name, ?last_deployed, "last deployment time");

        if entry.metrics.is_empty() {
            info!(workload = %workload_name, "no metrics configured; scaling down to zero");
            self.update_instance_count(&workload, 0).await?;
            return Ok(ScalingStatus::Succeeded);
        }

        let mut unbounded = 0;
        let mut has_valid_trigger = false;
        for metric in &entry.metrics {
            let recommendation = match metric.target {
                MetricTarget::TargetAverageValue(target) if target > 0.0 => {
                    target_average_value_recommendation(metric.value, target, current)
                }
                MetricTarget::TargetValue(target) if target > 0.0 => {
                    target_value_recommendation(metric.value, target, current)
                }
                _ => {
                    warn!(
                        workload = %workload_name,
                        trigger_id = %metric.trigger_id,
                        "trigger target is zero; skipping trigger"
                    );
                    continue;
                }
            };
            info!(
                workload = %workload_name,
                trigger_id = %metric.trigger_id,
                recommendation,
                "trigger recommendation"
            );

            if let Some(metrics) = &self.metrics {
                metrics.record_trigger(workload_name, &metric.trigger_id, metric.value, metric.target);
            }

            unbounded = unbounded.max(recommendation);
            has_valid_trigger = true;
        }

        if !has_valid_trigger {
            warn!(workload = %workload_name, "no valid triggers found; skipping workload");
            return Ok(ScalingStatus::Failed);
        }

        let settings = &entry.scaled_object.scaler_settings;
        let stabilizer = self
            .stabilizers
            .entry(workload_name.clone())
            .or_insert_with(|| ScalingStabilizer::new(current, now));

        let stabilized = stabilizer.stabilized_recommendation(
            &settings.behavior,
            now,
            current,
            unbounded,
            workload_name,
        );

        let bounded = stabilized.min(settings.max_instances).max(settings.min_instances);
        if bounded != stabilized {
            info!(
                workload = %workload_name,
                min = settings.min_instances,
                max = settings.max_instances,
                "recommendation was clamped to the replica bounds"
            );
        }

        info!(workload = %workload_name, instances = bounded, "bounded recommendation");
        if bounded != current {
            self.update_instance_count(&workload, bounded).await?;
            if let Some(stabilizer) = self.stabilizers.get_mut(workload_name) {
                stabilizer.mark_scale_event(&settings.behavior, now, current, bounded);
            }
        } else {
            info!(workload = %workload_name, "recommendation is unchanged");
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_instance_counts(workload_name, unbounded, bounded);
        }

        Ok(ScalingStatus::Succeeded)
    }

    async fn update_instance_count(
        &self,
        workload: &WorkloadRef,
        instances: i32,
    ) -> EngineResult<()> {
        match (workload.kind, self.use_min_instances) {
            (WorkloadKind::Service, true) => {
                self.compute
                    .update_service_min_instances(workload, instances)
                    .await?
            }
            (WorkloadKind::Service, false) => {
                self.compute
                    .update_service_manual_instances(workload, instances)
                    .await?
            }
            (WorkloadKind::WorkerPool, _) => {
                self.compute
                    .update_worker_pool_manual_instances(workload, instances)
                    .await?
            }
        }
        info!(workload = %workload, instances, "sent instance update");
        Ok(())
    }
}
