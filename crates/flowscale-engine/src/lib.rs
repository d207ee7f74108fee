//! flowscale-engine — the scaler stage.
//!
//! Takes the aggregate scale request assembled by the metric-provider stage
//! and, per workload: computes an unbounded instance recommendation from the
//! trigger readings, stabilizes and rate-limits it against the workload's
//! scaling behavior, clamps it to the configured replica bounds, and issues
//! an idempotent update through the [`ComputePlane`] abstraction.
//!
//! Stabilizer state is the only process-wide mutable state; it is keyed by
//! workload name, created lazily at first observation, and lives for the
//! process lifetime.

pub mod compute;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod recommend;
pub mod reconciler;
pub mod rest;
pub mod stabilizer;

pub use compute::{ComputePlane, InMemoryComputePlane};
pub use error::{EngineError, EngineResult};
pub use manager::ScalersManager;
pub use metrics::ScalingMetrics;
pub use reconciler::Reconciler;
pub use rest::RestComputePlane;
pub use stabilizer::ScalingStabilizer;
