//! Scaling metrics registry.
//!
//! Records per-workload scaling gauges and renders them in the Prometheus
//! text exposition format for scraping. Recording never fails; a metrics
//! problem must not affect scaling.

use std::collections::BTreeMap;
use std::sync::Mutex;

const RECOMMENDED_INSTANCE_COUNT: &str = "flowscale_recommended_instance_count";
const REQUESTED_INSTANCE_COUNT: &str = "flowscale_requested_instance_count";
const METRIC_VALUE: &str = "flowscale_metric_value";
const TARGET_VALUE: &str = "flowscale_target_value";
const TARGET_AVERAGE_VALUE: &str = "flowscale_target_average_value";

/// Process-wide gauge registry for scaling observability.
#[derive(Debug, Default)]
pub struct ScalingMetrics {
    // metric name → label string → value, ordered for stable rendering.
    gauges: Mutex<BTreeMap<&'static str, BTreeMap<String, f64>>>,
}

impl ScalingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the unbounded and requested instance counts for a workload.
    pub fn record_instance_counts(&self, workload: &str, recommended: i32, requested: i32) {
        self.set(
            RECOMMENDED_INSTANCE_COUNT,
            workload_labels(workload),
            f64::from(recommended),
        );
        self.set(
            REQUESTED_INSTANCE_COUNT,
            workload_labels(workload),
            f64::from(requested),
        );
    }

    /// Record one trigger's metric value and its target.
    pub fn record_trigger(
        &self,
        workload: &str,
        trigger_id: &str,
        value: f64,
        target: flow_core::MetricTarget,
    ) {
        let labels = trigger_labels(workload, trigger_id);
        self.set(METRIC_VALUE, labels.clone(), value);
        match target {
            flow_core::MetricTarget::TargetValue(t) => self.set(TARGET_VALUE, labels, t),
            flow_core::MetricTarget::TargetAverageValue(t) => {
                self.set(TARGET_AVERAGE_VALUE, labels, t)
            }
        }
    }

    fn set(&self, name: &'static str, labels: String, value: f64) {
        let mut gauges = self.gauges.lock().unwrap();
        gauges.entry(name).or_default().insert(labels, value);
    }

    /// Render all recorded gauges in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let gauges = self.gauges.lock().unwrap();
        let mut out = String::new();
        for (name, series) in gauges.iter() {
            out.push_str(&format!("# TYPE {name} gauge\n"));
            for (labels, value) in series {
                out.push_str(&format!("{name}{{{labels}}} {value}\n"));
            }
        }
        out
    }
}

fn workload_labels(workload: &str) -> String {
    format!("workload=\"{workload}\"")
}

fn trigger_labels(workload: &str, trigger_id: &str) -> String {
    format!("workload=\"{workload}\",trigger_id=\"{trigger_id}\"")
}
