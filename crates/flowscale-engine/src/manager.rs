//! Batch scaling entry point.
//!
//! `ScalersManager` is the scaler stage's interface to the outside: it takes
//! one aggregate scale request and reconciles every entry, isolating
//! per-workload failures so one bad entry never fails the batch.

use std::sync::Arc;

use tracing::warn;

use flow_core::{ScaleRequest, ScaleResponse, ScalingResult, ScalingStatus};

use crate::compute::ComputePlane;
use crate::metrics::ScalingMetrics;
use crate::reconciler::Reconciler;

pub struct ScalersManager {
    reconciler: Reconciler,
}

impl ScalersManager {
    pub fn new(compute: Arc<dyn ComputePlane>, use_min_instances: bool) -> Self {
        Self {
            reconciler: Reconciler::new(compute, use_min_instances),
        }
    }

    pub fn with_metrics(compute: Arc<dyn ComputePlane>, use_min_instances: bool, metrics: Arc<ScalingMetrics>) -> Self {
        Self {
            reconciler: Reconciler::new(compute, use_min_instances).with_metrics(metrics),
        }
    }

    /// Scale every entry of the request, in request order.
    ///
    /// Always returns one result per entry; errors are logged and reported
    /// as a `Failed` result for that target only.
    pub async fn scale(&mut self, request: &ScaleRequest) -> ScaleResponse {
        let mut results = Vec::with_capacity(request.scaled_object_metrics.len());

        for entry in &request.scaled_object_metrics {
            let scale_target_name = entry.scaled_object.scale_target_ref.name.clone();
            let status = match self.reconciler.scale(entry).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(workload = %scale_target_name, error = %e, "failed to scale workload");
                    ScalingStatus::Failed
                }
            };
            results.push(ScalingResult {
                scale_target_name,
                status,
            });
        }

        ScaleResponse { results }
    }
}
