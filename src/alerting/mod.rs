// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Alerting module - threshold rules, grace/cooldown state machine and sinks

mod engine;
mod rule;
mod sink;

pub use engine::{AlertEngine, RuleState};
pub use rule::{AlertAction, AlertRule, Comparator};
pub use sink::{AlertSink, ChannelSink, FnSink, LogSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

/// Why an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A rule's condition held past its grace period
    Threshold,
    /// A source failed too many polls in a row
    SourceDegraded,
}

/// Alert event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub kind: AlertKind,
    pub metric: String,
    /// Rule that fired; `None` for source health alerts
    pub rule: Option<AlertRule>,
    pub severity: Severity,
    pub triggered_at: DateTime<Utc>,
    pub observed_value: Option<f64>,
    pub message: String,
}

impl AlertEvent {
    /// Whether the firing rule asks the sampler to stop
    pub fn requests_stop(&self) -> bool {
        self.rule
            .as_ref()
            .map_or(false, |r| r.action == AlertAction::Stop)
    }
}
