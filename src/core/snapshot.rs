// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Read-only views of sampler state handed to consumers

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerting::AlertEvent;
use crate::series::SeriesSummary;
use crate::sources::Sample;

/// Text shown for a metric without a current sample
pub const NO_DATA: &str = "no data";

/// Why the sampler loop ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Stop signal from the handle (or the handle was dropped)
    Requested,
    /// A rule with the `stop` action fired
    Alert { metric: String, message: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => f.write_str("stop requested"),
            StopReason::Alert { metric, message } => {
                write!(f, "emergency stop on {}: {}", metric, message)
            }
        }
    }
}

/// One metric's state at snapshot time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Sample recorded on the latest tick; `None` if that poll failed
    pub latest: Option<Sample>,
    pub consecutive_failures: u32,
    /// Most recent samples, oldest first
    pub history: Vec<Sample>,
    /// Summary over `history` (numeric samples only)
    pub summary: SeriesSummary,
}

impl MetricSnapshot {
    pub fn is_missing(&self) -> bool {
        self.latest.is_none()
    }

    /// Value for display; missing data is never shown as a stale number
    pub fn display_value(&self) -> String {
        match &self.latest {
            Some(sample) => sample.value.to_string(),
            None => NO_DATA.to_string(),
        }
    }
}

/// Point-in-time copy of everything a consumer may read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    /// Ticks completed when the snapshot was taken
    pub tick: u64,
    pub metrics: BTreeMap<String, MetricSnapshot>,
    /// Alert history, newest first
    pub alerts: Vec<AlertEvent>,
    pub stop_reason: Option<StopReason>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            taken_at: Utc::now(),
            tick: 0,
            metrics: BTreeMap::new(),
            alerts: Vec::new(),
            stop_reason: None,
        }
    }
}

impl Snapshot {
    pub fn latest(&self, metric: &str) -> Option<&Sample> {
        self.metrics.get(metric).and_then(|m| m.latest.as_ref())
    }

    pub fn value(&self, metric: &str) -> Option<f64> {
        self.latest(metric).and_then(Sample::as_f64)
    }

    /// Latest sample for every metric that has one
    pub fn latest_samples(&self) -> BTreeMap<&str, &Sample> {
        self.metrics
            .iter()
            .filter_map(|(name, m)| m.latest.as_ref().map(|s| (name.as_str(), s)))
            .collect()
    }

    pub fn display(&self, metric: &str) -> String {
        self.metrics
            .get(metric)
            .map(MetricSnapshot::display_value)
            .unwrap_or_else(|| NO_DATA.to_string())
    }

    /// Up to `n` most recent alerts, newest first
    pub fn recent_alerts(&self, n: usize) -> Vec<AlertEvent> {
        self.alerts.iter().take(n).cloned().collect()
    }
}
