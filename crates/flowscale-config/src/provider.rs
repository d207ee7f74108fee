//! Configuration provider.
//!
//! Fetches the raw document through a [`ParameterStore`], parses it, and
//! runs validation and defaulting. Any error here is fatal at startup.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::defaults::apply_defaults;
use crate::document::FlowConfig;
use crate::validate::validate_config;

/// Errors from loading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to fetch config {handle:?}: {message}")]
    Fetch { handle: String, message: String },

    #[error("failed to parse config document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config at {path}: {message}")]
    Invalid { path: String, message: String },
}

/// Source of raw configuration documents, keyed by an opaque handle.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn fetch(&self, handle: &str) -> Result<Vec<u8>, ConfigError>;
}

/// Loads, validates, and defaults configuration documents.
pub struct ConfigProvider {
    store: Box<dyn ParameterStore>,
}

impl ConfigProvider {
    pub fn new(store: Box<dyn ParameterStore>) -> Self {
        Self { store }
    }

    /// Load the document behind `handle` into a validated [`FlowConfig`].
    pub async fn load(&self, handle: &str) -> Result<FlowConfig, ConfigError> {
        let raw = self.store.fetch(handle).await?;
        info!(config = %handle, bytes = raw.len(), "retrieved configuration document");

        let config: FlowConfig = serde_yaml::from_slice(&raw)?;
        validate_config(&config)?;
        Ok(apply_defaults(config))
    }
}

/// Parameter store reading documents from the local filesystem.
///
/// The handle is interpreted as a path, optionally relative to a base
/// directory.
#[derive(Debug, Default)]
pub struct FileStore {
    base: Option<PathBuf>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base: Some(base) }
    }
}

#[async_trait]
impl ParameterStore for FileStore {
    async fn fetch(&self, handle: &str) -> Result<Vec<u8>, ConfigError> {
        let path = match &self.base {
            Some(base) => base.join(handle),
            None => PathBuf::from(handle),
        };
        tokio::fs::read(&path)
            .await
            .map_err(|e| ConfigError::Fetch {
                handle: handle.to_string(),
                message: e.to_string(),
            })
    }
}

/// In-memory parameter store for tests.
#[derive(Debug, Default)]
pub struct StubParameterStore {
    documents: HashMap<String, Vec<u8>>,
}

impl StubParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, handle: &str, body: &str) -> Self {
        self.documents
            .insert(handle.to_string(), body.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl ParameterStore for StubParameterStore {
    async fn fetch(&self, handle: &str) -> Result<Vec<u8>, ConfigError> {
        self.documents
            .get(handle)
            .cloned()
            .ok_or_else(|| ConfigError::Fetch {
                handle: handle.to_string(),
                message: "document not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
apiVersion: flowscale.dev/v1alpha1
kind: FlowScaleConfig
spec:
  pollingInterval: 30
  scaledObjects:
    - spec:
        scaleTargetRef:
          name: projects/acme/locations/us-central1/services/api
        triggers:
          - type: cron
            metadata:
              start: "08:00"
              end: "20:00"
              desiredInstances: "3"
"#;

    fn provider_with(handle: &str, body: &str) -> ConfigProvider {
        ConfigProvider::new(Box::new(
            StubParameterStore::new().with_document(handle, body),
        ))
    }

    #[tokio::test]
    async fn loads_and_defaults_valid_document() {
        let provider = provider_with("cfg", VALID);
        let config = provider.load("cfg").await.unwrap();

        assert_eq!(config.spec.polling_interval, Some(30));
        let spec = &config.spec.scaled_objects[0].spec;
        assert_eq!(spec.max_replica_count, Some(100));
        assert!(spec.behavior().unwrap().scale_down.is_some());
        assert!(spec.behavior().unwrap().scale_up.is_some());
    }

    #[tokio::test]
    async fn missing_document_is_a_fetch_error() {
        let provider = provider_with("cfg", VALID);
        assert!(matches!(
            provider.load("other").await,
            Err(ConfigError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_parse_error() {
        let provider = provider_with("cfg", "spec: [not: closed");
        assert!(matches!(
            provider.load("cfg").await,
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn invalid_document_is_rejected() {
        let body = r#"
apiVersion: flowscale.dev/v1alpha1
kind: FlowScaleConfig
spec:
  scaledObjects:
    - spec:
        scaleTargetRef:
          name: projects/acme/locations/us-central1/services/api
        triggers: []
"#;
        let provider = provider_with("cfg", body);
        assert!(matches!(
            provider.load("cfg").await,
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn file_store_reads_from_disk() {
        let dir = std::env::temp_dir().join("flowscale-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(&path, VALID).unwrap();

        let provider = ConfigProvider::new(Box::new(FileStore::new()));
        let config = provider.load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.spec.scaled_objects.len(), 1);
    }
}
