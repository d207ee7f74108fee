//! Configuration validation.
//!
//! Every rule reports the offending field path so operators can fix the
//! document without reading source code. Validation runs before defaulting.

use std::collections::HashSet;

use flow_core::{TriggerAuthentication, WorkloadRef};

use crate::document::{FlowConfig, ScaledObjectEntry, API_VERSION, KIND};
use crate::provider::ConfigError;

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Check that a parsed [`FlowConfig`] is valid.
pub fn validate_config(config: &FlowConfig) -> Result<(), ConfigError> {
    if config.api_version != API_VERSION {
        return Err(invalid("apiVersion", &format!("must be {API_VERSION:?}")));
    }
    if config.kind != KIND {
        return Err(invalid("kind", &format!("must be {KIND:?}")));
    }

    if config.spec.scaled_objects.is_empty() {
        return Err(invalid(
            "spec.scaledObjects",
            "must have at least one scaled object",
        ));
    }

    let mut auth_names = HashSet::new();
    for (i, ta) in config.spec.trigger_authentications.iter().enumerate() {
        validate_trigger_authentication(ta, i)?;
        if !auth_names.insert(ta.metadata.name.clone()) {
            return Err(invalid(
                &format!("triggerAuthentications[{i}].metadata.name"),
                "must be unique",
            ));
        }
    }

    for (i, so) in config.spec.scaled_objects.iter().enumerate() {
        validate_scaled_object(so, &auth_names, i)?;
    }

    Ok(())
}

fn validate_trigger_authentication(
    ta: &TriggerAuthentication,
    index: usize,
) -> Result<(), ConfigError> {
    if ta.metadata.name.is_empty() {
        return Err(invalid(
            &format!("triggerAuthentications[{index}].metadata.name"),
            "must be set",
        ));
    }

    if ta.spec.pod_identity.is_none() && ta.spec.secret_manager.is_none() {
        return Err(invalid(
            &format!("triggerAuthentications[{index}].spec"),
            "must be set",
        ));
    }

    if let Some(pod_identity) = &ta.spec.pod_identity {
        if pod_identity.provider.is_empty() {
            return Err(invalid(
                &format!("triggerAuthentications[{index}].spec.podIdentity.provider"),
                "must be set",
            ));
        }
    }
    Ok(())
}

fn validate_scaled_object(
    so: &ScaledObjectEntry,
    auth_names: &HashSet<String>,
    index: usize,
) -> Result<(), ConfigError> {
    let name = &so.spec.scale_target_ref.name;
    if name.is_empty() {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.scaleTargetRef.name"),
            "must be set",
        ));
    }
    if let Err(e) = WorkloadRef::parse(name) {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.scaleTargetRef.name"),
            &e.to_string(),
        ));
    }

    if so.spec.polling_interval.is_some() {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.pollingInterval"),
            "must only be specified at the top level of the configuration",
        ));
    }

    if so.spec.triggers.is_empty() {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.triggers"),
            "must have at least one trigger",
        ));
    }

    let min = so.spec.min_replica_count.unwrap_or(0);
    let max = so.spec.max_replica_count.unwrap_or(i32::MAX);
    if min < 0 {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.minReplicaCount"),
            "must not be negative",
        ));
    }
    if min > max {
        return Err(invalid(
            &format!("scaledObjects[{index}].spec.minReplicaCount"),
            "must not exceed maxReplicaCount",
        ));
    }

    for (j, trigger) in so.spec.triggers.iter().enumerate() {
        if trigger.trigger_type.is_empty() {
            return Err(invalid(
                &format!("scaledObjects[{index}].spec.triggers[{j}].type"),
                "must be set",
            ));
        }

        if let Some(auth_ref) = &trigger.authentication_ref {
            if !auth_ref.name.is_empty() && !auth_names.contains(&auth_ref.name) {
                return Err(invalid(
                    &format!("scaledObjects[{index}].spec.triggers[{j}].authenticationRef.name"),
                    &format!("trigger authentication {:?} not found", auth_ref.name),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{
        AuthenticationRef, ObjectMeta, PodIdentity, ScaleTargetRef, ScaledObjectSpec, TriggerSpec,
        TriggerAuthenticationSpec,
    };

    fn test_trigger(trigger_type: &str) -> TriggerSpec {
        TriggerSpec {
            trigger_type: trigger_type.to_string(),
            name: String::new(),
            metadata: Default::default(),
            authentication_ref: None,
        }
    }

    fn test_scaled_object(target: &str) -> ScaledObjectEntry {
        ScaledObjectEntry {
            spec: ScaledObjectSpec {
                scale_target_ref: ScaleTargetRef {
                    name: target.to_string(),
                },
                triggers: vec![test_trigger("cron")],
                min_replica_count: None,
                max_replica_count: None,
                advanced: None,
                polling_interval: None,
            },
        }
    }

    fn test_config() -> FlowConfig {
        FlowConfig {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: None,
            spec: crate::document::FlowConfigSpec {
                polling_interval: Some(30),
                scaled_objects: vec![test_scaled_object(
                    "projects/acme/locations/us-central1/services/api",
                )],
                trigger_authentications: vec![],
            },
        }
    }

    fn assert_invalid_path(config: &FlowConfig, path: &str) {
        match validate_config(config) {
            Err(ConfigError::Invalid { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Invalid at {path}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        validate_config(&test_config()).unwrap();
    }

    #[test]
    fn wrong_api_version_fails() {
        let mut config = test_config();
        config.api_version = "v1".to_string();
        assert_invalid_path(&config, "apiVersion");
    }

    #[test]
    fn empty_scaled_objects_fails() {
        let mut config = test_config();
        config.spec.scaled_objects.clear();
        assert_invalid_path(&config, "spec.scaledObjects");
    }

    #[test]
    fn empty_target_name_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.scale_target_ref.name = String::new();
        assert_invalid_path(&config, "scaledObjects[0].spec.scaleTargetRef.name");
    }

    #[test]
    fn malformed_target_name_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.scale_target_ref.name = "just-a-name".to_string();
        assert_invalid_path(&config, "scaledObjects[0].spec.scaleTargetRef.name");
    }

    #[test]
    fn per_object_polling_interval_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.polling_interval = Some(10);
        assert_invalid_path(&config, "scaledObjects[0].spec.pollingInterval");
    }

    #[test]
    fn no_triggers_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.triggers.clear();
        assert_invalid_path(&config, "scaledObjects[0].spec.triggers");
    }

    #[test]
    fn empty_trigger_type_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.triggers[0].trigger_type = String::new();
        assert_invalid_path(&config, "scaledObjects[0].spec.triggers[0].type");
    }

    #[test]
    fn min_above_max_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.min_replica_count = Some(10);
        config.spec.scaled_objects[0].spec.max_replica_count = Some(5);
        assert_invalid_path(&config, "scaledObjects[0].spec.minReplicaCount");
    }

    #[test]
    fn dangling_auth_ref_fails() {
        let mut config = test_config();
        config.spec.scaled_objects[0].spec.triggers[0].authentication_ref =
            Some(AuthenticationRef {
                name: "missing".to_string(),
            });
        assert_invalid_path(
            &config,
            "scaledObjects[0].spec.triggers[0].authenticationRef.name",
        );
    }

    #[test]
    fn duplicate_auth_names_fail() {
        let auth = TriggerAuthentication {
            metadata: ObjectMeta {
                name: "dup".to_string(),
            },
            spec: TriggerAuthenticationSpec {
                pod_identity: Some(PodIdentity {
                    provider: "gcp".to_string(),
                }),
                secret_manager: None,
            },
        };
        let mut config = test_config();
        config.spec.trigger_authentications = vec![auth.clone(), auth];
        assert_invalid_path(&config, "triggerAuthentications[1].metadata.name");
    }

    #[test]
    fn auth_without_any_spec_fails() {
        let mut config = test_config();
        config.spec.trigger_authentications = vec![TriggerAuthentication {
            metadata: ObjectMeta {
                name: "empty".to_string(),
            },
            spec: TriggerAuthenticationSpec::default(),
        }];
        assert_invalid_path(&config, "triggerAuthentications[0].spec");
    }

    #[test]
    fn pod_identity_without_provider_fails() {
        let mut config = test_config();
        config.spec.trigger_authentications = vec![TriggerAuthentication {
            metadata: ObjectMeta {
                name: "pi".to_string(),
            },
            spec: TriggerAuthenticationSpec {
                pod_identity: Some(PodIdentity {
                    provider: String::new(),
                }),
                secret_manager: None,
            },
        }];
        assert_invalid_path(&config, "triggerAuthentications[0].spec.podIdentity.provider");
    }
}
