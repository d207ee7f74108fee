//! Translation between configuration types and scale-request messages.

use flow_core::{MetricSample, ScaledObjectRef, ScaledObjectSpec, ScalerSettings};

use crate::state::ScaledObjectState;

/// Build the scaler-stage view of a scaled object.
///
/// Replica bounds fall back to their documented defaults when the config
/// layer has not filled them in.
pub fn to_scaled_object_ref(spec: &ScaledObjectSpec) -> ScaledObjectRef {
    ScaledObjectRef {
        scale_target_ref: spec.scale_target_ref.clone(),
        scaler_settings: ScalerSettings {
            min_instances: spec.min_replica_count.unwrap_or(0),
            max_instances: spec.max_replica_count.unwrap_or(100),
            behavior: spec.behavior().cloned().unwrap_or_default(),
        },
    }
}

/// Convert collected readings into scale-request metric samples.
pub fn to_metric_samples(state: &ScaledObjectState) -> Vec<MetricSample> {
    state
        .readings
        .iter()
        .map(|reading| MetricSample {
            trigger_id: reading.trigger_id.clone(),
            trigger_type: reading.trigger_type.clone(),
            value: reading.value,
            target: reading.target,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TriggerReading;
    use flow_core::{
        AdvancedConfig, HorizontalPodAutoscalerConfig, MetricTarget, ScaleTargetRef,
        ScalingBehavior, ScalingRules,
    };

    fn spec_with_bounds(min: Option<i32>, max: Option<i32>) -> ScaledObjectSpec {
        ScaledObjectSpec {
            scale_target_ref: ScaleTargetRef {
                name: "projects/p/locations/l/services/api".to_string(),
            },
            triggers: vec![],
            min_replica_count: min,
            max_replica_count: max,
            advanced: None,
            polling_interval: None,
        }
    }

    #[test]
    fn carries_replica_bounds_and_behavior() {
        let mut spec = spec_with_bounds(Some(2), Some(50));
        spec.advanced = Some(AdvancedConfig {
            horizontal_pod_autoscaler_config: Some(HorizontalPodAutoscalerConfig {
                behavior: Some(ScalingBehavior {
                    scale_up: Some(ScalingRules {
                        stabilization_window_seconds: 60,
                        policies: vec![],
                        select_policy: None,
                    }),
                    scale_down: None,
                }),
            }),
        });

        let scale_ref = to_scaled_object_ref(&spec);
        assert_eq!(scale_ref.scaler_settings.min_instances, 2);
        assert_eq!(scale_ref.scaler_settings.max_instances, 50);
        assert_eq!(
            scale_ref
                .scaler_settings
                .behavior
                .scale_up
                .as_ref()
                .unwrap()
                .stabilization_window_seconds,
            60
        );
    }

    #[test]
    fn missing_bounds_fall_back_to_defaults() {
        let scale_ref = to_scaled_object_ref(&spec_with_bounds(None, None));
        assert_eq!(scale_ref.scaler_settings.min_instances, 0);
        assert_eq!(scale_ref.scaler_settings.max_instances, 100);
        assert_eq!(scale_ref.scaler_settings.behavior, ScalingBehavior::default());
    }

    #[test]
    fn samples_preserve_reading_fields() {
        let state = ScaledObjectState {
            readings: vec![TriggerReading {
                trigger_id: "queue".to_string(),
                trigger_type: "metrics-api".to_string(),
                value: 123.0,
                target: MetricTarget::TargetAverageValue(10.0),
            }],
            is_active: true,
        };

        let samples = to_metric_samples(&state);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].trigger_id, "queue");
        assert_eq!(samples[0].trigger_type, "metrics-api");
        assert_eq!(samples[0].value, 123.0);
        assert_eq!(samples[0].target, MetricTarget::TargetAverageValue(10.0));
    }
}
