// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Host sources - CPU, memory, load and process statistics via sysinfo

use async_trait::async_trait;
use sysinfo::System;

use super::blocking::BlockingResource;
use super::{MetricSource, Value};
use crate::error::SourceError;

/// Global CPU utilisation in percent
pub struct CpuUsageSource {
    metric: String,
    sys: BlockingResource<System>,
}

impl CpuUsageSource {
    pub fn new(metric: &str) -> Self {
        let mut sys = System::new();
        // Usage is computed between two refreshes; prime the first one.
        sys.refresh_cpu();
        Self {
            metric: metric.to_string(),
            sys: BlockingResource::new(sys),
        }
    }
}

#[async_trait]
impl MetricSource for CpuUsageSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "cpu_usage" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let usage = self
            .sys
            .run(&self.metric, |sys| {
                sys.refresh_cpu();
                (!sys.cpus().is_empty()).then(|| sys.global_cpu_info().cpu_usage() as f64)
            })
            .await?;
        usage
            .map(Value::Number)
            .ok_or_else(|| SourceError::unavailable(&self.metric, "no CPUs reported"))
    }
}

/// Which memory pool a [`MemorySource`] reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    Ram,
    Swap,
}

/// Used memory in percent of total
pub struct MemorySource {
    metric: String,
    kind: MemoryKind,
    sys: BlockingResource<System>,
}

impl MemorySource {
    pub fn new(metric: &str, kind: MemoryKind) -> Self {
        Self {
            metric: metric.to_string(),
            kind,
            sys: BlockingResource::new(System::new()),
        }
    }
}

#[async_trait]
impl MetricSource for MemorySource {
    fn metric(&self) -> &str { &self.metric }

    fn kind(&self) -> &'static str {
        match self.kind {
            MemoryKind::Ram => "memory_usage",
            MemoryKind::Swap => "swap_usage",
        }
    }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let kind = self.kind;
        let (used, total) = self
            .sys
            .run(&self.metric, move |sys| {
                sys.refresh_memory();
                match kind {
                    MemoryKind::Ram => (sys.used_memory(), sys.total_memory()),
                    MemoryKind::Swap => (sys.used_swap(), sys.total_swap()),
                }
            })
            .await?;

        if total == 0 {
            return Err(SourceError::unavailable(&self.metric, "total reported as zero"));
        }
        Ok(Value::Number(used as f64 / total as f64 * 100.0))
    }
}

/// One-minute load average
pub struct LoadAverageSource {
    metric: String,
}

impl LoadAverageSource {
    pub fn new(metric: &str) -> Self {
        Self { metric: metric.to_string() }
    }
}

#[async_trait]
impl MetricSource for LoadAverageSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "load_average" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let load = System::load_average();
        if !load.one.is_finite() {
            return Err(SourceError::unavailable(&self.metric, "load average not supported"));
        }
        Ok(Value::Number(load.one))
    }
}

/// Number of running processes
pub struct ProcessCountSource {
    metric: String,
    sys: BlockingResource<System>,
}

impl ProcessCountSource {
    pub fn new(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            sys: BlockingResource::new(System::new()),
        }
    }
}

#[async_trait]
impl MetricSource for ProcessCountSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "process_count" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let count = self
            .sys
            .run(&self.metric, |sys| {
                sys.refresh_processes();
                sys.processes().len()
            })
            .await?;
        Ok(Value::Number(count as f64))
    }
}
