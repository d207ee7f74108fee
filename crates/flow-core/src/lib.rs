//! Shared types used across FlowScale crates.
//!
//! `flow-core` holds the domain model common to both halves of the control
//! loop: workload identities, trigger and scaling-behavior specifications,
//! and the logical scale request/response messages exchanged between the
//! metric-provider stage and the scaler stage.

pub mod scale;
pub mod types;
pub mod workload;

pub use scale::*;
pub use types::*;
pub use workload::{WorkloadKind, WorkloadParseError, WorkloadRef};
