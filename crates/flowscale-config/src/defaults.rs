//! Configuration defaulting.
//!
//! Runs after validation so downstream stages always see concrete replica
//! bounds and a fully populated scaling behavior for both directions.

use flow_core::{PolicyKind, ScalingBehavior, ScalingPolicy, ScalingRules, SelectPolicy};

use crate::document::FlowConfig;

const DEFAULT_MIN_INSTANCES: i32 = 0;
const DEFAULT_MAX_INSTANCES: i32 = 100;
const DEFAULT_SCALE_DOWN_STABILIZATION_SECONDS: i32 = 300;

/// Fill in absent replica bounds and scaling behavior.
pub fn apply_defaults(mut config: FlowConfig) -> FlowConfig {
    for entry in &mut config.spec.scaled_objects {
        let spec = &mut entry.spec;
        spec.min_replica_count.get_or_insert(DEFAULT_MIN_INSTANCES);
        spec.max_replica_count.get_or_insert(DEFAULT_MAX_INSTANCES);

        let behavior = spec.behavior_mut();
        let behavior = behavior.get_or_insert_with(ScalingBehavior::default);
        apply_behavior_defaults(behavior);
    }
    config
}

/// Fill in absent scaling directions.
///
/// A direction supplied without a select policy keeps its window and
/// policies but still receives the direction's default select policy.
pub fn apply_behavior_defaults(behavior: &mut ScalingBehavior) {
    let scale_down = behavior.scale_down.get_or_insert_with(|| ScalingRules {
        stabilization_window_seconds: DEFAULT_SCALE_DOWN_STABILIZATION_SECONDS,
        policies: vec![ScalingPolicy {
            kind: PolicyKind::Percent,
            value: 100,
            period_seconds: 15,
        }],
        select_policy: None,
    });
    scale_down.select_policy.get_or_insert(SelectPolicy::Min);

    let scale_up = behavior.scale_up.get_or_insert_with(|| ScalingRules {
        stabilization_window_seconds: 0,
        policies: vec![
            ScalingPolicy {
                kind: PolicyKind::Percent,
                value: 100,
                period_seconds: 15,
            },
            ScalingPolicy {
                kind: PolicyKind::Instances,
                value: 4,
                period_seconds: 15,
            },
        ],
        select_policy: None,
    });
    scale_up.select_policy.get_or_insert(SelectPolicy::Max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FlowConfigSpec, ScaledObjectEntry};
    use flow_core::{ScaleTargetRef, ScaledObjectSpec};

    fn test_config(spec: ScaledObjectSpec) -> FlowConfig {
        FlowConfig {
            api_version: crate::document::API_VERSION.to_string(),
            kind: crate::document::KIND.to_string(),
            metadata: None,
            spec: FlowConfigSpec {
                polling_interval: None,
                scaled_objects: vec![ScaledObjectEntry { spec }],
                trigger_authentications: vec![],
            },
        }
    }

    fn bare_spec() -> ScaledObjectSpec {
        ScaledObjectSpec {
            scale_target_ref: ScaleTargetRef {
                name: "projects/p/locations/l/services/api".to_string(),
            },
            triggers: vec![],
            min_replica_count: None,
            max_replica_count: None,
            advanced: None,
            polling_interval: None,
        }
    }

    #[test]
    fn fills_replica_bounds() {
        let config = apply_defaults(test_config(bare_spec()));
        let spec = &config.spec.scaled_objects[0].spec;
        assert_eq!(spec.min_replica_count, Some(0));
        assert_eq!(spec.max_replica_count, Some(100));
    }

    #[test]
    fn keeps_explicit_replica_bounds() {
        let mut spec = bare_spec();
        spec.min_replica_count = Some(2);
        spec.max_replica_count = Some(50);
        let config = apply_defaults(test_config(spec));
        let spec = &config.spec.scaled_objects[0].spec;
        assert_eq!(spec.min_replica_count, Some(2));
        assert_eq!(spec.max_replica_count, Some(50));
    }

    #[test]
    fn fills_both_scaling_directions() {
        let config = apply_defaults(test_config(bare_spec()));
        let behavior = config.spec.scaled_objects[0].spec.behavior().unwrap();

        let down = behavior.scale_down.as_ref().unwrap();
        assert_eq!(down.stabilization_window_seconds, 300);
        assert_eq!(down.select(), SelectPolicy::Min);
        assert_eq!(down.policies.len(), 1);
        assert_eq!(down.policies[0].kind, PolicyKind::Percent);
        assert_eq!(down.policies[0].value, 100);
        assert_eq!(down.policies[0].period_seconds, 15);

        let up = behavior.scale_up.as_ref().unwrap();
        assert_eq!(up.stabilization_window_seconds, 0);
        assert_eq!(up.select(), SelectPolicy::Max);
        assert_eq!(up.policies.len(), 2);
        assert_eq!(up.policies[1].kind, PolicyKind::Instances);
        assert_eq!(up.policies[1].value, 4);
    }

    #[test]
    fn supplied_direction_keeps_rules_but_gets_select_default() {
        let mut behavior = ScalingBehavior {
            scale_up: None,
            scale_down: Some(ScalingRules {
                stabilization_window_seconds: 60,
                policies: vec![],
                select_policy: None,
            }),
        };
        apply_behavior_defaults(&mut behavior);

        let down = behavior.scale_down.as_ref().unwrap();
        assert_eq!(down.stabilization_window_seconds, 60);
        assert!(down.policies.is_empty());
        assert_eq!(down.select(), SelectPolicy::Min);

        // The absent direction still receives full defaults.
        let up = behavior.scale_up.as_ref().unwrap();
        assert_eq!(up.policies.len(), 2);
        assert_eq!(up.select(), SelectPolicy::Max);
    }

    #[test]
    fn explicit_select_policy_is_kept() {
        let mut behavior = ScalingBehavior {
            scale_up: None,
            scale_down: Some(ScalingRules {
                stabilization_window_seconds: 0,
                policies: vec![],
                select_policy: Some(SelectPolicy::Disabled),
            }),
        };
        apply_behavior_defaults(&mut behavior);
        assert_eq!(
            behavior.scale_down.as_ref().unwrap().select(),
            SelectPolicy::Disabled
        );
    }
}
