// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Threshold rule definitions

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::error::ConfigError;

/// Comparison applied as `value <op> threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What happens besides delivery when a rule fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    #[default]
    Notify,
    /// Stop the sampler after the current tick (thermal emergency stop)
    Stop,
}

/// A threshold rule on one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub metric: String,
    pub comparator: Comparator,
    pub threshold: f64,

    /// Seconds the condition must hold before an alert is emitted
    #[serde(default)]
    pub grace_period_s: f64,

    /// Seconds after an alert during which the rule stays silent
    #[serde(default)]
    pub cooldown_s: f64,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub action: AlertAction,

    /// Log a warning on every breach observed during the grace period
    #[serde(default)]
    pub grace_period_logs: bool,
}

impl AlertRule {
    pub fn new(metric: &str, comparator: Comparator, threshold: f64) -> Self {
        Self {
            metric: metric.to_string(),
            comparator,
            threshold,
            grace_period_s: 0.0,
            cooldown_s: 0.0,
            severity: Severity::default(),
            action: AlertAction::Notify,
            grace_period_logs: false,
        }
    }

    pub fn with_grace(mut self, secs: f64) -> Self {
        self.grace_period_s = secs;
        self
    }

    pub fn with_cooldown(mut self, secs: f64) -> Self {
        self.cooldown_s = secs;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_action(mut self, action: AlertAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_grace_logging(mut self, enabled: bool) -> Self {
        self.grace_period_logs = enabled;
        self
    }

    pub fn grace_period(&self) -> Duration {
        bounded_secs(self.grace_period_s)
    }

    pub fn cooldown(&self) -> Duration {
        bounded_secs(self.cooldown_s)
    }

    pub fn holds(&self, value: f64) -> bool {
        self.comparator.holds(value, self.threshold)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metric.trim().is_empty() {
            return Err(ConfigError::invalid("rule metric name is empty"));
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::invalid(format!("rule '{}': threshold must be finite", self)));
        }
        for (field, secs) in [("grace_period_s", self.grace_period_s), ("cooldown_s", self.cooldown_s)] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "rule '{}': {} must be a non-negative number",
                    self, field
                )));
            }
            if secs > MAX_RULE_SECS {
                return Err(ConfigError::invalid(format!(
                    "rule '{}': {} must be at most {} seconds",
                    self, field, MAX_RULE_SECS
                )));
            }
        }
        Ok(())
    }
}

/// Longest accepted grace period or cooldown: one year
pub const MAX_RULE_SECS: f64 = 365.0 * 24.0 * 3600.0;

/// Seconds to a `Duration`, clamped to `[0, MAX_RULE_SECS]`; NaN counts as zero
fn bounded_secs(secs: f64) -> Duration {
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.clamp(0.0, MAX_RULE_SECS))
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.metric, self.comparator, self.threshold)
    }
}
