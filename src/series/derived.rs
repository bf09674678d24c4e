// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Metrics computed from other series after each tick

use serde::{Deserialize, Serialize};

use super::stats;
use super::RingBuffer;

/// How a derived series is computed from its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedKind {
    /// Rolling average over the window
    Mean,
    /// Standard deviation over the window
    Jitter,
    /// Change per second between the last two samples
    Rate,
    /// Least-squares slope per sample over the window
    Trend,
}

impl DerivedKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            DerivedKind::Mean => "mean",
            DerivedKind::Jitter => "jitter",
            DerivedKind::Rate => "rate",
            DerivedKind::Trend => "trend",
        }
    }

    /// Fewest numeric samples the kind needs to produce a value
    pub fn min_window(&self) -> usize {
        match self {
            DerivedKind::Mean => 1,
            DerivedKind::Jitter | DerivedKind::Rate | DerivedKind::Trend => 2,
        }
    }
}

/// A derived series definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    /// Metric the value is computed from
    pub source: String,
    pub kind: DerivedKind,
    /// Number of most recent source samples considered
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    10
}

impl DerivedMetric {
    pub fn new(source: &str, kind: DerivedKind, window: usize) -> Self {
        Self {
            source: source.to_string(),
            kind,
            window,
        }
    }

    /// Name of the produced series, e.g. `cpu_usage.jitter`
    pub fn name(&self) -> String {
        format!("{}.{}", self.source, self.kind.suffix())
    }

    pub fn compute(&self, series: &RingBuffer) -> Option<f64> {
        match self.kind {
            DerivedKind::Mean => stats::mean(&series.recent_values(self.window)),
            DerivedKind::Jitter => {
                let values = series.recent_values(self.window);
                if values.len() < 2 {
                    return None;
                }
                stats::std_dev(&values)
            }
            DerivedKind::Trend => stats::slope(&series.recent_values(self.window)),
            DerivedKind::Rate => {
                let numeric: Vec<_> = series
                    .recent(self.window.max(2))
                    .filter_map(|s| s.as_f64().map(|v| (s.timestamp, v)))
                    .collect();
                let [.., (t0, v0), (t1, v1)] = numeric.as_slice() else {
                    return None;
                };
                let dt = (*t1 - *t0).num_milliseconds() as f64 / 1000.0;
                if dt <= 0.0 {
                    return None;
                }
                Some((v1 - v0) / dt)
            }
        }
    }
}
