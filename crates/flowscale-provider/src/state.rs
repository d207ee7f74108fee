//! Scaled-object state collection.
//!
//! Fans out over a workload's scalers concurrently, one task per scaler,
//! and aggregates the readings without regard to completion order. Failed
//! scalers are logged with their trigger index and skipped; the workload
//! fails only when nothing could be read at all. Every scaler is closed
//! before its task finishes, whichever path it took.

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

use flow_core::{MetricTarget, ScaledObjectSpec};
use flowscale_triggers::{ScalerBuilder, TriggerError};

/// One trigger's collected reading.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerReading {
    pub trigger_id: String,
    pub trigger_type: String,
    pub value: f64,
    pub target: MetricTarget,
}

/// A scaled object's state according to all of its scalers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaledObjectState {
    pub readings: Vec<TriggerReading>,
    /// Whether any scaler reported its trigger as active.
    pub is_active: bool,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no metrics could be collected for the scaled object")]
    NoMetrics,
}

/// Per-scaler task result, tagged with the originating trigger index.
struct ScalerState {
    trigger_index: usize,
    reading: Option<TriggerReading>,
    is_active: bool,
    error: Option<TriggerError>,
}

/// Collects metrics and activity for scaled objects.
#[derive(Debug, Default)]
pub struct StateProvider;

impl StateProvider {
    pub fn new() -> Self {
        Self
    }

    /// Read every scaler of the scaled object concurrently.
    pub async fn scaled_object_state(
        &self,
        scaled_object: &ScaledObjectSpec,
        builders: Vec<ScalerBuilder>,
    ) -> Result<ScaledObjectState, StateError> {
        let workload = scaled_object.scale_target_ref.name.clone();

        let mut tasks = JoinSet::new();
        for builder in builders {
            // The trigger type travels with the reading; it is looked up by
            // trigger index in the scaled object's own trigger list.
            let trigger_type = scaled_object
                .triggers
                .get(builder.config.trigger_index)
                .map(|t| t.trigger_type.clone())
                .unwrap_or_else(|| builder.config.trigger_type.clone());
            tasks.spawn(read_scaler(builder, trigger_type));
        }

        let mut state = ScaledObjectState::default();
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(workload = %workload, error = %e, "scaler task panicked");
                    continue;
                }
            };

            if let Some(e) = result.error {
                error!(
                    workload = %workload,
                    trigger_index = result.trigger_index,
                    error = %e,
                    "error reading metrics"
                );
            } else if let Some(reading) = result.reading {
                state.readings.push(reading);
            }
            if result.is_active {
                state.is_active = true;
            }
        }
        if state.readings.is_empty() {
            return Err(StateError::NoMetrics);
        }
        Ok(state)
    }
}

async fn read_scaler(mut builder: ScalerBuilder, trigger_type: String) -> ScalerState {
    let trigger_index = builder.config.trigger_index;
    let trigger_id = if builder.config.trigger_name.is_empty() {
        trigger_type.clone()
    } else {
        builder.config.trigger_name.clone()
    };

    let specs = builder.scaler.metric_spec().await;
    if specs.is_empty() {
        // Nothing to do for this trigger this cycle.
        builder.scaler.close().await;
        return ScalerState {
            trigger_index,
            reading: None,
            is_active: false,
            error: None,
        };
    }
    if specs.len() > 1 {
        info!(
            trigger_index,
            "scaler returned multiple metric specs but only one is expected"
        );
    }
    let spec = &specs[0];

    let result = builder.scaler.metrics_and_activity().await;
    builder.scaler.close().await;

    match result {
        Err(e) => ScalerState {
            trigger_index,
            reading: None,
            is_active: false,
            error: Some(e),
        },
        Ok((values, is_active)) => {
            if values.is_empty() {
                return ScalerState {
                    trigger_index,
                    reading: None,
                    is_active,
                    error: Some(TriggerError::Read(
                        "scaler returned no metric values".to_string(),
                    )),
                };
            }
            if values.len() > 1 {
                info!(
                    trigger_index,
                    "scaler returned multiple metrics but only one is expected"
                );
            }

            ScalerState {
                trigger_index,
                reading: Some(TriggerReading {
                    trigger_id,
                    trigger_type,
                    value: values[0],
                    target: spec.target(),
                }),
                is_active,
                error: None,
            }
        }
    }
}
