//! Scaling stabilization and rate limiting.
//!
//! The stabilizer prevents thrashing by bounding each recommendation against
//! two kinds of history:
//!
//! - a *recommendation history*, appended on every query, over which the
//!   direction's stabilization window folds: a scale-up may not exceed the
//!   lowest recommendation seen inside the window, a scale-down may not go
//!   below the highest;
//! - a *scale-event history*, appended only after an update was actually
//!   issued, over which the rate-limit policies fold: each policy permits at
//!   most `value` percent or instances of change per period, measured from
//!   the instance count at the start of the period.
//!
//! ```text
//! stabilize(behavior, now, current, unbounded):
//!   current == 0 && unbounded > 0      → unbounded      (scale-up from zero)
//!   unbounded > current                → scale-up bound
//!   unbounded < current                → scale-down bound
//!   otherwise                          → current
//! ```
//!
//! Entries participate in a window or period iff strictly newer than its
//! cutoff; retention is bounded by the longest window or policy period, so
//! shrinking a window drops entries while growing one may still see older
//! retained entries.

use std::time::{Duration, Instant};

use tracing::debug;

use flow_core::{PolicyKind, ScalingBehavior, ScalingPolicy, ScalingRules, SelectPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct Recommendation {
    at: Instant,
    instances: i32,
}

#[derive(Debug, Clone, Copy)]
struct ScaleEvent {
    at: Instant,
    prev_instances: i32,
}

/// Per-workload stabilization state.
#[derive(Debug)]
pub struct ScalingStabilizer {
    recommendations: Vec<Recommendation>,
    scale_events: Vec<ScaleEvent>,
}

impl ScalingStabilizer {
    /// Create stabilizer state seeded with the workload's current instance
    /// count, so a freshly observed workload holds its size for the length
    /// of a configured stabilization window.
    pub fn new(current_instances: i32, now: Instant) -> Self {
        Self {
            recommendations: vec![Recommendation {
                at: now,
                instances: current_instances,
            }],
            scale_events: Vec::new(),
        }
    }

    /// Bound `unbounded` by the behavior's stabilization windows and rate
    /// policies. Records the unbounded recommendation in the history; the
    /// caller separately marks an event iff it issues an update.
    pub fn stabilized_recommendation(
        &mut self,
        behavior: &ScalingBehavior,
        now: Instant,
        current_instances: i32,
        unbounded: i32,
        workload: &str,
    ) -> i32 {
        self.evict(behavior, now);

        if current_instances == 0 && unbounded > 0 {
            debug!(
                workload = %workload,
                recommendation = unbounded,
                "scale-up from zero bypasses stabilization"
            );
            self.record(now, unbounded);
            return unbounded;
        }

        let result = if unbounded > current_instances {
            self.direction_bound(
                behavior.scale_up.as_ref(),
                Direction::Up,
                now,
                current_instances,
                unbounded,
            )
        } else if unbounded < current_instances {
            self.direction_bound(
                behavior.scale_down.as_ref(),
                Direction::Down,
                now,
                current_instances,
                unbounded,
            )
        } else {
            current_instances
        };

        self.record(now, unbounded);

        if result != unbounded {
            debug!(
                workload = %workload,
                unbounded,
                stabilized = result,
                "recommendation was stabilized"
            );
        }
        result
    }

    /// Record that an update from `prev` to `new` instances was issued.
    pub fn mark_scale_event(
        &mut self,
        behavior: &ScalingBehavior,
        now: Instant,
        prev_instances: i32,
        new_instances: i32,
    ) {
        self.evict(behavior, now);
        debug!(prev = prev_instances, new = new_instances, "recorded scale event");
        self.scale_events.push(ScaleEvent {
            at: now,
            prev_instances,
        });
    }

    fn record(&mut self, now: Instant, unbounded: i32) {
        self.recommendations.push(Recommendation {
            at: now,
            instances: unbounded,
        });
    }

    fn direction_bound(
        &self,
        rules: Option<&ScalingRules>,
        direction: Direction,
        now: Instant,
        current: i32,
        unbounded: i32,
    ) -> i32 {
        let empty = ScalingRules::default();
        let rules = rules.unwrap_or(&empty);

        if rules.select() == SelectPolicy::Disabled {
            return current;
        }

        // Stabilization window: fold the unbounded recommendation with the
        // least aggressive recommendation inside the window.
        let mut window_bound = unbounded;
        if rules.stabilization_window_seconds > 0 {
            let window = seconds(rules.stabilization_window_seconds);
            for rec in &self.recommendations {
                if strictly_within(rec.at, now, window) {
                    window_bound = fold(direction, window_bound, rec.instances);
                }
            }
        }
        // The result never crosses `current` against the requested direction.
        let stabilized = match direction {
            Direction::Up => window_bound.max(current),
            Direction::Down => window_bound.min(current),
        };

        let Some(rate_bound) = self.rate_limit_bound(rules, direction, now, current) else {
            return stabilized;
        };
        match direction {
            Direction::Up => stabilized.min(rate_bound.max(current)),
            Direction::Down => stabilized.max(rate_bound.min(current)),
        }
    }

    /// The most extreme instance count the direction's policies permit, or
    /// `None` when the direction carries no policies.
    fn rate_limit_bound(
        &self,
        rules: &ScalingRules,
        direction: Direction,
        now: Instant,
        current: i32,
    ) -> Option<i32> {
        let mut combined: Option<i32> = None;

        for policy in &rules.policies {
            let period = seconds(policy.period_seconds);

            // Each policy permits `value` of change per period, measured
            // against the instance count at the period start; with no event
            // in the period the current count is the base.
            let mut candidate = policy_limit(policy, direction, current);
            for event in &self.scale_events {
                if strictly_within(event.at, now, period) {
                    let limit = policy_limit(policy, direction, event.prev_instances);
                    candidate = fold(direction, candidate, limit);
                }
            }

            combined = Some(match combined {
                None => candidate,
                // Max always selects the most permissive bound.
                Some(acc) => match (rules.select(), direction) {
                    (SelectPolicy::Max, Direction::Up) | (SelectPolicy::Min, Direction::Down) => {
                        acc.max(candidate)
                    }
                    (SelectPolicy::Min, Direction::Up) | (SelectPolicy::Max, Direction::Down) => {
                        acc.min(candidate)
                    }
                    (SelectPolicy::Disabled, _) => acc,
                },
            });
        }

        combined
    }

    /// Drop entries older than anything the behavior can still look at.
    fn evict(&mut self, behavior: &ScalingBehavior, now: Instant) {
        let retention = seconds(retention_seconds(behavior));
        let Some(cutoff) = now.checked_sub(retention) else {
            return;
        };
        self.recommendations.retain(|r| r.at > cutoff);
        self.scale_events.retain(|e| e.at > cutoff);
    }
}

/// The least aggressive of two values in the given direction.
fn fold(direction: Direction, acc: i32, value: i32) -> i32 {
    match direction {
        Direction::Up => acc.min(value),
        Direction::Down => acc.max(value),
    }
}

fn policy_limit(policy: &ScalingPolicy, direction: Direction, base: i32) -> i32 {
    let rate = f64::from(policy.value) / 100.0;
    match (policy.kind, direction) {
        (PolicyKind::Percent, Direction::Up) => (f64::from(base) * (1.0 + rate)).ceil() as i32,
        (PolicyKind::Percent, Direction::Down) => (f64::from(base) * (1.0 - rate)).floor() as i32,
        (PolicyKind::Instances, Direction::Up) => base + policy.value,
        (PolicyKind::Instances, Direction::Down) => base - policy.value,
    }
}

fn seconds(value: i32) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}

fn strictly_within(at: Instant, now: Instant, lookback: Duration) -> bool {
    match now.checked_sub(lookback) {
        Some(cutoff) => at > cutoff,
        // The lookback reaches past the start of monotonic time.
        None => true,
    }
}

/// Longest lookback the behavior can require.
fn retention_seconds(behavior: &ScalingBehavior) -> i32 {
    let mut longest = 0;
    for rules in [behavior.scale_up.as_ref(), behavior.scale_down.as_ref()]
        .into_iter()
        .flatten()
    {
        longest = longest.max(rules.stabilization_window_seconds);
        for policy in &rules.policies {
            longest = longest.max(policy.period_seconds);
        }
    }
    longest
}
