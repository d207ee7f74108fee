//! flowscale-auth — trigger authentication resolution.
//!
//! Turns a named `TriggerAuthentication` reference into the resolved
//! key→value auth parameters a scaler needs, fetching secret-backed
//! parameters through the [`SecretStore`] trait. Resolution is
//! all-or-nothing: a single failed secret fails the whole reference.

pub mod resolver;
pub mod secrets;

pub use resolver::{AuthError, AuthResolver, ResolvedAuth};
pub use secrets::{EnvSecretStore, SecretError, SecretStore, StubSecretStore};
