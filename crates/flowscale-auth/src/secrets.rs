//! Secret store access.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a secret store.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret id must be provided")]
    MissingId,

    #[error("secret not found: {id}/{version}")]
    NotFound { id: String, version: String },

    #[error("secret store error: {0}")]
    Store(String),
}

/// Narrow read-only interface to a secret store.
///
/// An empty `version` selects the latest version of the secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn read_secret(&self, id: &str, version: &str) -> Result<String, SecretError>;
}

/// In-memory secret store for tests and local runs.
#[derive(Debug, Default)]
pub struct StubSecretStore {
    secrets: HashMap<String, String>,
    error: Option<String>,
}

impl StubSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret value under `id`/`version`.
    pub fn with_secret(mut self, id: &str, version: &str, value: &str) -> Self {
        self.secrets.insert(key(id, version), value.to_string());
        self
    }

    /// Make every lookup fail with the given store error.
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }
}

#[async_trait]
impl SecretStore for StubSecretStore {
    async fn read_secret(&self, id: &str, version: &str) -> Result<String, SecretError> {
        if id.is_empty() {
            return Err(SecretError::MissingId);
        }
        if let Some(message) = &self.error {
            return Err(SecretError::Store(message.clone()));
        }

        let version = if version.is_empty() { "latest" } else { version };
        self.secrets
            .get(&key(id, version))
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                id: id.to_string(),
                version: version.to_string(),
            })
    }
}

fn key(id: &str, version: &str) -> String {
    format!("{id}/{version}")
}

/// Secret store backed by process environment variables.
///
/// The secret id names the environment variable; versions are not
/// supported and only `latest` (or empty) is accepted.
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn read_secret(&self, id: &str, version: &str) -> Result<String, SecretError> {
        if id.is_empty() {
            return Err(SecretError::MissingId);
        }
        if !version.is_empty() && version != "latest" {
            return Err(SecretError::Store(format!(
                "environment secrets are unversioned; got version {version:?}"
            )));
        }
        std::env::var(id).map_err(|_| SecretError::NotFound {
            id: id.to_string(),
            version: "latest".to_string(),
        })
    }
}
