//! flowscale-triggers — metric-source scalers.
//!
//! A *scaler* is the adapter between one configured trigger and its external
//! metric source. Scalers are built fresh each polling cycle by the
//! [`BuilderFactory`], read once, and closed when the cycle completes.
//!
//! The core treats scalers as black boxes behind the [`Scaler`] trait; the
//! factory dispatches on the trigger `type` string and rejects unknown
//! types. One failed trigger does not prevent the remaining triggers of a
//! workload from being built.

pub mod cron;
pub mod factory;
pub mod metrics_api;
pub mod scaler;

pub use factory::{BuilderFactory, FactoryError, ScalerBuilder};
pub use scaler::{Scaler, ScalerConfig, TargetSpec, TriggerError};
