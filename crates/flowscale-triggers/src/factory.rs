//! Scaler construction.
//!
//! Builds one scaler per trigger of a scaled object, resolving auth
//! references first and dispatching on the trigger type. Failures are
//! per-trigger: a workload with one broken trigger still gets builders for
//! the rest, and only a workload with no usable triggers at all fails.

use std::time::Duration;

use thiserror::Error;
use tracing::error;

use flow_core::{ScaledObjectSpec, TriggerAuthentication, TriggerSpec};
use flowscale_auth::{AuthResolver, ResolvedAuth};

use crate::cron::CronScaler;
use crate::metrics_api::MetricsApiScaler;
use crate::scaler::{Scaler, ScalerConfig, TriggerError};

/// Error from building a scaled object's scalers.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("failed to create any scalers for scaled object")]
    NoScalers,
}

/// A constructed scaler together with the context it was built from.
pub struct ScalerBuilder {
    pub scaler: Box<dyn Scaler>,
    pub config: ScalerConfig,
}

/// Builds scalers for the triggers of a scaled object.
pub struct BuilderFactory {
    auth_resolver: AuthResolver,
    global_http_timeout: Duration,
}

impl BuilderFactory {
    pub fn new(auth_resolver: AuthResolver, global_http_timeout: Duration) -> Self {
        Self {
            auth_resolver,
            global_http_timeout,
        }
    }

    /// Build one scaler per trigger.
    ///
    /// Per-trigger failures are logged with the trigger index and skipped;
    /// the call fails only when no trigger could be built.
    pub async fn make_builders(
        &self,
        scaled_object: &ScaledObjectSpec,
        trigger_auths: &[TriggerAuthentication],
        as_metric_source: bool,
    ) -> Result<Vec<ScalerBuilder>, FactoryError> {
        let workload = &scaled_object.scale_target_ref.name;
        let mut builders = Vec::with_capacity(scaled_object.triggers.len());

        for (i, trigger) in scaled_object.triggers.iter().enumerate() {
            match self
                .build_one(workload, trigger, i, trigger_auths, as_metric_source)
                .await
            {
                Ok(builder) => builders.push(builder),
                Err(e) => {
                    error!(
                        workload = %workload,
                        trigger_index = i,
                        error = %e,
                        "failure while building scaler"
                    );
                }
            }
        }

        if builders.is_empty() {
            return Err(FactoryError::NoScalers);
        }
        Ok(builders)
    }

    async fn build_one(
        &self,
        workload: &str,
        trigger: &TriggerSpec,
        index: usize,
        trigger_auths: &[TriggerAuthentication],
        as_metric_source: bool,
    ) -> Result<ScalerBuilder, TriggerError> {
        let auth = match &trigger.authentication_ref {
            Some(auth_ref) => self.auth_resolver.resolve(trigger_auths, &auth_ref.name).await?,
            None => ResolvedAuth::default(),
        };

        let config = ScalerConfig {
            workload_name: workload.to_string(),
            trigger_name: trigger.name.clone(),
            trigger_type: trigger.trigger_type.clone(),
            trigger_index: index,
            trigger_metadata: trigger.metadata.clone(),
            auth_params: auth.params,
            pod_identity: auth.pod_identity,
            global_http_timeout: self.global_http_timeout,
            as_metric_source,
        };

        let scaler = build_scaler(&trigger.trigger_type, &config)?;
        Ok(ScalerBuilder { scaler, config })
    }
}

/// Dispatch a trigger type to its scaler constructor.
fn build_scaler(
    trigger_type: &str,
    config: &ScalerConfig,
) -> Result<Box<dyn Scaler>, TriggerError> {
    match trigger_type {
        "cron" => Ok(Box::new(CronScaler::new(config)?)),
        "metrics-api" => Ok(Box::new(MetricsApiScaler::new(config)?)),
        other => Err(TriggerError::UnknownType(other.to_string())),
    }
}
