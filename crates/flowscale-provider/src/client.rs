//! Scaler-stage client interface.

use async_trait::async_trait;

use flow_core::{ScaleRequest, ScaleResponse};

/// Sends aggregate scale requests to the scaler stage.
///
/// The default wiring is in-process, but the interface allows the scaler
/// stage to live behind any transport that preserves the message shape.
#[async_trait]
pub trait ScaleClient: Send + Sync {
    async fn scale(&self, request: ScaleRequest) -> anyhow::Result<ScaleResponse>;
}
