//! Unbounded instance-count recommendations.
//!
//! Two target semantics exist: a *target value* compares the metric against
//! the per-workload target scaled by the current instance count, while a
//! *target average value* treats the metric as an aggregate and the target
//! as a per-instance share. Both return the current instance count when the
//! target is zero, matching declarative horizontal-scaling controllers.

/// Recommendation for target-value semantics: `ceil(max(n, 1) · value / target)`.
pub fn target_value_recommendation(value: f64, target: f64, current_instances: i32) -> i32 {
    if target == 0.0 {
        return current_instances;
    }
    (f64::from(current_instances.max(1)) * value / target).ceil() as i32
}

/// Recommendation for average-value semantics: `ceil(value / target)`.
pub fn target_average_value_recommendation(value: f64, target: f64, current_instances: i32) -> i32 {
    if target == 0.0 {
        return current_instances;
    }
    (value / target).ceil() as i32
}
