// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Deterministic sources for unit tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MetricSource, Value};
use crate::error::SourceError;

/// Replays a fixed script; `None` entries fail. The last entry repeats forever.
pub struct ScriptedSource {
    metric: String,
    script: VecDeque<Option<f64>>,
    last: Option<f64>,
}

impl ScriptedSource {
    pub fn new(metric: &str, script: Vec<Option<f64>>) -> Self {
        Self {
            metric: metric.to_string(),
            script: script.into(),
            last: None,
        }
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "scripted" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
            .map(Value::Number)
            .ok_or_else(|| SourceError::unavailable(&self.metric, "scripted failure"))
    }
}

/// Source whose next reading is set by the test through a shared cell
pub struct ControlledSource {
    metric: String,
    value: Arc<Mutex<Option<f64>>>,
}

impl ControlledSource {
    pub fn new(metric: &str, initial: Option<f64>) -> (Self, Arc<Mutex<Option<f64>>>) {
        let value = Arc::new(Mutex::new(initial));
        let source = Self {
            metric: metric.to_string(),
            value: value.clone(),
        };
        (source, value)
    }
}

#[async_trait]
impl MetricSource for ControlledSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "controlled" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        (*self.value.lock())
            .map(Value::Number)
            .ok_or_else(|| SourceError::unavailable(&self.metric, "controlled failure"))
    }
}
