//! flowscale-config — configuration document handling.
//!
//! Parses the YAML configuration document into [`FlowConfig`], validates it
//! strictly, and applies defaults so downstream stages always see complete
//! replica bounds and scaling behavior. The document itself is fetched
//! through the [`ParameterStore`] trait, keeping the daemon independent of
//! where its configuration is hosted.

pub mod defaults;
pub mod document;
pub mod provider;
pub mod validate;

pub use document::{FlowConfig, FlowConfigSpec, ScaledObjectEntry, API_VERSION, KIND};
pub use provider::{ConfigError, ConfigProvider, FileStore, ParameterStore, StubParameterStore};
pub use validate::validate_config;
