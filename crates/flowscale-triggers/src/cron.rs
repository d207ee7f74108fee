//! Time-schedule scaler.
//!
//! Drives a workload to a fixed instance count during a daily wall-clock
//! window. Inside the window the reported metric value is the desired
//! instance count and the trigger is active; outside it the value is zero.
//! The target is `AverageValue(1)` so the recommendation equals the value.

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveTime, Utc};

use crate::scaler::{Scaler, ScalerConfig, TargetSpec, TriggerError};

pub struct CronScaler {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
    desired_instances: f64,
    metric_name: String,
}

impl CronScaler {
    /// Metadata: `start`/`end` (daily `HH:MM`), `desiredInstances`, and an
    /// optional `utcOffset` such as `+02:00`.
    pub fn new(config: &ScalerConfig) -> Result<Self, TriggerError> {
        let start = parse_time(config, "start")?;
        let end = parse_time(config, "end")?;
        if start == end {
            return Err(TriggerError::InvalidMetadata {
                key: "end".to_string(),
                message: "window must not be empty".to_string(),
            });
        }

        let desired = config.require_metadata("desiredInstances")?;
        let desired_instances =
            desired
                .parse::<f64>()
                .map_err(|e| TriggerError::InvalidMetadata {
                    key: "desiredInstances".to_string(),
                    message: e.to_string(),
                })?;
        if desired_instances < 0.0 {
            return Err(TriggerError::InvalidMetadata {
                key: "desiredInstances".to_string(),
                message: "must not be negative".to_string(),
            });
        }

        let offset = match config.trigger_metadata.get("utcOffset") {
            None => FixedOffset::east_opt(0).unwrap(),
            Some(raw) => raw
                .parse::<FixedOffset>()
                .map_err(|e| TriggerError::InvalidMetadata {
                    key: "utcOffset".to_string(),
                    message: e.to_string(),
                })?,
        };

        Ok(Self {
            start,
            end,
            offset,
            desired_instances,
            metric_name: format!("cron-{}", config.trigger_index),
        })
    }

    fn in_window(&self, now: NaiveTime) -> bool {
        if self.start < self.end {
            self.start <= now && now < self.end
        } else {
            // Window wraps over midnight.
            now >= self.start || now < self.end
        }
    }
}

fn parse_time(config: &ScalerConfig, key: &str) -> Result<NaiveTime, TriggerError> {
    let raw = config.require_metadata(key)?;
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| TriggerError::InvalidMetadata {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl Scaler for CronScaler {
    async fn metric_spec(&self) -> Vec<TargetSpec> {
        vec![TargetSpec {
            metric_name: self.metric_name.clone(),
            target_value: None,
            target_average_value: Some(1.0),
        }]
    }

    async fn metrics_and_activity(&self) -> Result<(Vec<f64>, bool), TriggerError> {
        let now = Utc::now().with_timezone(&self.offset).time();
        let active = self.in_window(now);
        let value = if active { self.desired_instances } else { 0.0 };
        Ok((vec![value], active))
    }
}
