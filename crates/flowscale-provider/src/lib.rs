//! flowscale-provider — the metric-provider stage.
//!
//! Per polling cycle, the [`Orchestrator`] walks the configured scaled
//! objects, builds their scalers, collects metric readings concurrently via
//! the [`StateProvider`], and sends one aggregate [`ScaleRequest`] to the
//! scaler stage through the [`ScaleClient`] trait. The [`CycleDriver`] runs
//! cycles on the configured interval; cycles never overlap and a tick that
//! arrives while a cycle is still running is dropped.
//!
//! [`ScaleRequest`]: flow_core::ScaleRequest

pub mod client;
pub mod driver;
pub mod orchestrator;
pub mod state;
pub mod translate;

pub use client::ScaleClient;
pub use driver::CycleDriver;
pub use orchestrator::Orchestrator;
pub use state::{ScaledObjectState, StateError, StateProvider, TriggerReading};
