// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Source traits and common types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SourceError;

/// A polled value, numeric or free-form text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{:.2}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One recorded observation of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metric: String,
    /// Per-series sequence number; strictly increasing within a series
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub value: Value,
}

impl Sample {
    pub fn new(metric: &str, seq: u64, value: Value) -> Self {
        Self::at(metric, seq, Utc::now(), value)
    }

    pub fn at(metric: &str, seq: u64, timestamp: DateTime<Utc>, value: Value) -> Self {
        Self {
            metric: metric.to_string(),
            seq,
            timestamp,
            value,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

/// Trait for everything the sampler can poll
///
/// An adapter is bound to a single metric name. Implementations must release
/// any handle (socket, child process) before `poll` returns.
#[async_trait]
pub trait MetricSource: Send {
    /// Metric this adapter produces
    fn metric(&self) -> &str;

    /// Short name of the backing source, used in logs
    fn kind(&self) -> &'static str;

    /// Take one reading
    async fn poll(&mut self) -> Result<Value, SourceError>;
}
