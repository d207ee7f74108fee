//! Cycle orchestration.
//!
//! One `refresh_metrics` call is one cycle: walk the configured scaled
//! objects in order, build scalers, collect state, and send the aggregate
//! request. Per-workload failures are logged and skipped so one broken
//! workload cannot starve the others; only a failed scale request fails
//! the cycle itself.

use std::sync::Arc;

use tracing::{error, info};

use flow_core::{ScaleRequest, ScaledObjectMetrics, ScalingStatus};
use flowscale_config::FlowConfig;
use flowscale_triggers::BuilderFactory;

use crate::client::ScaleClient;
use crate::state::StateProvider;
use crate::translate::{to_metric_samples, to_scaled_object_ref};

pub struct Orchestrator {
    scale_client: Arc<dyn ScaleClient>,
    config: Arc<FlowConfig>,
    builder_factory: BuilderFactory,
    state_provider: StateProvider,
}

impl Orchestrator {
    pub fn new(
        scale_client: Arc<dyn ScaleClient>,
        config: Arc<FlowConfig>,
        builder_factory: BuilderFactory,
        state_provider: StateProvider,
    ) -> Self {
        Self {
            scale_client,
            config,
            builder_factory,
            state_provider,
        }
    }

    /// Fetch metrics for all scaled objects and send them in a single
    /// request to the scaler stage.
    pub async fn refresh_metrics(&self) -> anyhow::Result<()> {
        info!("starting metric collection cycle");

        let trigger_auths = &self.config.spec.trigger_authentications;
        let mut scaled_object_metrics = Vec::new();

        for entry in &self.config.spec.scaled_objects {
            let spec = &entry.spec;
            let workload = &spec.scale_target_ref.name;

            let builders = match self
                .builder_factory
                .make_builders(spec, trigger_auths, true)
                .await
            {
                Ok(builders) => builders,
                Err(e) => {
                    error!(workload = %workload, error = %e, "unable to refresh metrics");
                    continue;
                }
            };

            let state = match self.state_provider.scaled_object_state(spec, builders).await {
                Ok(state) => state,
                Err(e) => {
                    error!(workload = %workload, error = %e, "unable to refresh metrics");
                    continue;
                }
            };

            scaled_object_metrics.push(ScaledObjectMetrics {
                scaled_object: to_scaled_object_ref(spec),
                metrics: to_metric_samples(&state),
            });
        }

        if scaled_object_metrics.is_empty() {
            info!("no objects to scale; skipping scale request");
            return Ok(());
        }

        let request = ScaleRequest {
            scaled_object_metrics,
        };
        info!(workloads = request.scaled_object_metrics.len(), "sending scale request");

        let response = self.scale_client.scale(request).await.map_err(|e| {
            error!(error = %e, "failed to send scale request");
            e
        })?;

        for result in &response.results {
            if result.status == ScalingStatus::Failed {
                error!(workload = %result.scale_target_name, "scaling reported failure");
            }
        }
        info!(results = response.results.len(), "received scale response");
        Ok(())
    }
}
