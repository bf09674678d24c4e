// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Thermal sources - CPU temperature sensors and a load-based estimate

use async_trait::async_trait;
use sysinfo::{Components, System};

use super::blocking::BlockingResource;
use super::{MetricSource, Value};
use crate::error::SourceError;

/// Idle baseline of the load-based estimate, °C
pub const ESTIMATE_BASE_CELSIUS: f64 = 30.0;

/// °C added per percent of CPU load
pub const ESTIMATE_CELSIUS_PER_PERCENT: f64 = 0.35;

/// Hottest CPU-like hardware sensor
///
/// Only components whose label mentions cpu, core, package or tctl are
/// considered.
pub struct CpuTempSource {
    metric: String,
    components: BlockingResource<Components>,
}

impl CpuTempSource {
    pub fn new(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            components: BlockingResource::new(Components::new_with_refreshed_list()),
        }
    }
}

fn is_cpu_label(label: &str) -> bool {
    let label = label.to_lowercase();
    ["cpu", "core", "package", "tctl"]
        .iter()
        .any(|needle| label.contains(needle))
}

#[async_trait]
impl MetricSource for CpuTempSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "cpu_temp" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let hottest = self
            .components
            .run(&self.metric, |components| {
                components.refresh();
                components
                    .iter()
                    .filter(|c| is_cpu_label(c.label()))
                    .map(|c| c.temperature() as f64)
                    .filter(|t| t.is_finite() && *t > 0.0)
                    .reduce(f64::max)
            })
            .await?;

        hottest
            .map(Value::Number)
            .ok_or_else(|| SourceError::unavailable(&self.metric, "no CPU temperature sensor"))
    }
}

/// CPU temperature estimated from load, for hosts without sensors
///
/// Tops out at 65°C under full load.
pub struct CpuTempEstimate {
    metric: String,
    sys: BlockingResource<System>,
}

impl CpuTempEstimate {
    pub fn new(metric: &str) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        Self {
            metric: metric.to_string(),
            sys: BlockingResource::new(sys),
        }
    }

    pub fn estimate(cpu_usage_percent: f64) -> f64 {
        ESTIMATE_BASE_CELSIUS + cpu_usage_percent.clamp(0.0, 100.0) * ESTIMATE_CELSIUS_PER_PERCENT
    }
}

#[async_trait]
impl MetricSource for CpuTempEstimate {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "cpu_temp_estimate" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let usage = self
            .sys
            .run(&self.metric, |sys| {
                sys.refresh_cpu();
                sys.global_cpu_info().cpu_usage() as f64
            })
            .await?;
        Ok(Value::Number(Self::estimate(usage)))
    }
}
