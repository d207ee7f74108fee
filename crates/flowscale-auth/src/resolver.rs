//! Trigger authentication resolution.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use flow_core::{PodIdentity, TriggerAuthentication};

use crate::secrets::{SecretError, SecretStore};

/// Errors from resolving a trigger authentication reference.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no matching trigger authentication for ref {name:?}")]
    NotFound { name: String },

    #[error("failed to resolve secret {id:?}: {source}")]
    SecretFetch {
        id: String,
        #[source]
        source: SecretError,
    },
}

/// Resolved auth parameters for one trigger.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAuth {
    /// Secret-backed parameters, keyed by the configured parameter name.
    pub params: HashMap<String, String>,
    /// Ambient identity, passed through verbatim.
    pub pod_identity: Option<PodIdentity>,
}

/// Resolves named authentication references against a secret store.
///
/// No retries are attempted; callers re-resolve on the next cycle.
pub struct AuthResolver {
    store: Arc<dyn SecretStore>,
}

impl AuthResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Resolve the trigger authentication with the given name.
    ///
    /// All secrets of the matched record are fetched; any single failure
    /// fails the whole resolution so no partial parameter map escapes.
    pub async fn resolve(
        &self,
        trigger_auths: &[TriggerAuthentication],
        name: &str,
    ) -> Result<ResolvedAuth, AuthError> {
        let auth = trigger_auths
            .iter()
            .find(|ta| ta.metadata.name == name)
            .ok_or_else(|| AuthError::NotFound {
                name: name.to_string(),
            })?;

        let mut params = HashMap::new();
        if let Some(secret_manager) = &auth.spec.secret_manager {
            for secret in &secret_manager.secrets {
                let value = self
                    .store
                    .read_secret(&secret.id, &secret.version)
                    .await
                    .map_err(|source| AuthError::SecretFetch {
                        id: secret.id.clone(),
                        source,
                    })?;
                params.insert(secret.parameter.clone(), value);
            }
        }

        Ok(ResolvedAuth {
            params,
            pod_identity: auth.spec.pod_identity.clone(),
        })
    }
}
