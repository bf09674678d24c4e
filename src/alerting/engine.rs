// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Stateful rule evaluation and alert history
//!
//! Each rule walks `Idle -> Observing -> Triggered -> Cooling -> Idle`:
//!
//! ```text
//!   Idle ──true──▶ Observing ──held ≥ grace──▶ Triggered ──emit──▶ Cooling
//!    ▲                │ false                                          │
//!    └────────────────┴─────────────── cooldown elapsed ◀──────────────┘
//! ```
//!
//! `Triggered` is transient: the event is emitted and the rule enters
//! `Cooling` within the same evaluation.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{AlertEvent, AlertKind, AlertRule, Severity};
use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Idle,
    Observing { since: Instant },
    Cooling { until: Instant },
}

struct RuleTracker {
    rule: AlertRule,
    state: RuleState,
}

impl RuleTracker {
    /// Advance the state machine; returns how long the breach held if the rule fires
    fn step(&mut self, now: Instant, value: Option<f64>) -> Option<Duration> {
        let condition = value.map_or(false, |v| self.rule.holds(v));

        let since = match self.state {
            RuleState::Cooling { until } if now < until => return None,
            RuleState::Observing { since } if condition => since,
            _ if condition => now,
            _ => {
                self.state = RuleState::Idle;
                return None;
            }
        };

        let held = now.saturating_duration_since(since);
        if held >= self.rule.grace_period() {
            let until = now.checked_add(self.rule.cooldown()).unwrap_or(now);
            self.state = RuleState::Cooling { until };
            return Some(held);
        }

        if self.rule.grace_period_logs {
            if let Some(v) = value {
                warn!(
                    "{} at {:.1} (within {:.0}s grace): {}",
                    self.rule.metric, v, self.rule.grace_period_s, self.rule
                );
            }
        }
        self.state = RuleState::Observing { since };
        None
    }
}

/// Evaluates rules against fresh values and keeps a bounded alert history
pub struct AlertEngine {
    trackers: Vec<RuleTracker>,
    history: VecDeque<AlertEvent>,
    history_capacity: usize,
    degraded_after: u32,
    failures: HashMap<String, u32>,
}

impl AlertEngine {
    pub fn new(history_capacity: usize, degraded_after: u32) -> Self {
        Self {
            trackers: Vec::new(),
            history: VecDeque::with_capacity(history_capacity.min(1024)),
            history_capacity: history_capacity.max(1),
            degraded_after: degraded_after.max(1),
            failures: HashMap::new(),
        }
    }

    pub fn add_rule(&mut self, rule: AlertRule) {
        debug!("Added rule: {}", rule);
        self.trackers.push(RuleTracker {
            rule,
            state: RuleState::Idle,
        });
    }

    pub fn rules(&self) -> impl Iterator<Item = &AlertRule> {
        self.trackers.iter().map(|t| &t.rule)
    }

    /// Current state of every rule, in registration order
    pub fn states(&self) -> Vec<(AlertRule, RuleState)> {
        self.trackers.iter().map(|t| (t.rule.clone(), t.state)).collect()
    }

    /// Evaluate every rule against this tick's values
    ///
    /// A metric absent from `fresh` (missing sample or text value) counts as
    /// a false condition.
    pub fn evaluate(&mut self, now: Instant, fresh: &HashMap<String, f64>) -> Vec<AlertEvent> {
        let mut fired = Vec::new();

        for tracker in self.trackers.iter_mut() {
            let value = fresh.get(&tracker.rule.metric).copied();
            if let Some(held) = tracker.step(now, value) {
                let observed = value.unwrap_or(f64::NAN);
                let rule = tracker.rule.clone();
                let message = format!(
                    "{} at {:.1} {} {} (held {:.1}s)",
                    rule.metric,
                    observed,
                    rule.comparator,
                    rule.threshold,
                    held.as_secs_f64()
                );
                fired.push(AlertEvent {
                    id: Uuid::new_v4(),
                    kind: AlertKind::Threshold,
                    metric: rule.metric.clone(),
                    severity: rule.severity,
                    triggered_at: Utc::now(),
                    observed_value: Some(observed),
                    message,
                    rule: Some(rule),
                });
            }
        }

        for event in &fired {
            self.remember(event.clone());
        }
        fired
    }

    /// Note a successful poll; re-arms degraded detection for the metric
    pub fn record_success(&mut self, metric: &str) {
        if let Some(count) = self.failures.remove(metric) {
            if count >= self.degraded_after {
                info!("{} recovered after {} failed polls", metric, count);
            }
        }
    }

    /// Note a failed poll; returns a `SourceDegraded` event exactly once per failure streak
    pub fn record_failure(&mut self, metric: &str, err: &SourceError) -> Option<AlertEvent> {
        let count = self.failures.entry(metric.to_string()).or_insert(0);
        *count = count.saturating_add(1);

        if *count != self.degraded_after {
            return None;
        }

        let event = AlertEvent {
            id: Uuid::new_v4(),
            kind: AlertKind::SourceDegraded,
            metric: metric.to_string(),
            rule: None,
            severity: Severity::Warning,
            triggered_at: Utc::now(),
            observed_value: None,
            message: format!("{} failed {} consecutive polls: {}", metric, count, err),
        };
        self.remember(event.clone());
        Some(event)
    }

    pub fn consecutive_failures(&self, metric: &str) -> u32 {
        self.failures.get(metric).copied().unwrap_or(0)
    }

    fn remember(&mut self, event: AlertEvent) {
        if self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// Up to `n` most recent events, newest first
    pub fn recent(&self, n: usize) -> Vec<AlertEvent> {
        self.history.iter().rev().take(n).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
