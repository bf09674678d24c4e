// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Source module - adapters the sampler polls

mod blocking;
mod command;
mod fallback;
mod network;
mod simulator;
mod system;
mod thermal;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use command::CommandSource;
pub use fallback::FallbackSource;
pub use network::{Direction, NetworkRateSource};
pub use simulator::SimulatedSource;
pub use system::{CpuUsageSource, LoadAverageSource, MemoryKind, MemorySource, ProcessCountSource};
pub use thermal::{CpuTempEstimate, CpuTempSource};
pub use traits::{MetricSource, Sample, Value};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which built-in adapter backs a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    CpuUsage,
    MemoryUsage,
    SwapUsage,
    LoadAverage,
    ProcessCount,
    CpuTemp,
    CpuTempEstimate,
    NetRxRate,
    NetTxRate,
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Simulated {
        #[serde(default)]
        base: f64,
        #[serde(default)]
        amplitude: f64,
        #[serde(default = "default_period")]
        period_polls: u32,
        #[serde(default)]
        noise: f64,
        #[serde(default)]
        failure_rate: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

fn default_period() -> u32 {
    60
}

impl SourceSpec {
    pub fn validate(&self, metric: &str) -> Result<(), ConfigError> {
        match self {
            SourceSpec::Command { program, .. } if program.trim().is_empty() => Err(
                ConfigError::invalid(format!("adapter '{}': command program is empty", metric)),
            ),
            SourceSpec::Simulated { base, amplitude, noise, failure_rate, period_polls, .. } => {
                if !(base.is_finite() && amplitude.is_finite()) {
                    return Err(ConfigError::invalid(format!(
                        "adapter '{}': simulated base/amplitude must be finite",
                        metric
                    )));
                }
                if !noise.is_finite() || *noise < 0.0 {
                    return Err(ConfigError::invalid(format!(
                        "adapter '{}': simulated noise must be >= 0",
                        metric
                    )));
                }
                if !(0.0..=1.0).contains(failure_rate) {
                    return Err(ConfigError::invalid(format!(
                        "adapter '{}': failure_rate must be within [0, 1]",
                        metric
                    )));
                }
                if *period_polls == 0 {
                    return Err(ConfigError::invalid(format!(
                        "adapter '{}': period_polls must be > 0",
                        metric
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Instantiate the adapter for `metric`
    pub fn build(&self, metric: &str) -> Box<dyn MetricSource> {
        match self {
            SourceSpec::CpuUsage => Box::new(CpuUsageSource::new(metric)),
            SourceSpec::MemoryUsage => Box::new(MemorySource::new(metric, MemoryKind::Ram)),
            SourceSpec::SwapUsage => Box::new(MemorySource::new(metric, MemoryKind::Swap)),
            SourceSpec::LoadAverage => Box::new(LoadAverageSource::new(metric)),
            SourceSpec::ProcessCount => Box::new(ProcessCountSource::new(metric)),
            SourceSpec::CpuTemp => Box::new(CpuTempSource::new(metric)),
            SourceSpec::CpuTempEstimate => Box::new(CpuTempEstimate::new(metric)),
            SourceSpec::NetRxRate => Box::new(NetworkRateSource::new(metric, Direction::Rx)),
            SourceSpec::NetTxRate => Box::new(NetworkRateSource::new(metric, Direction::Tx)),
            SourceSpec::Command { program, args } => {
                Box::new(CommandSource::new(metric, program, args))
            }
            SourceSpec::Simulated { base, amplitude, period_polls, noise, failure_rate, seed } => {
                let mut sim = SimulatedSource::new(metric, *base, *amplitude)
                    .with_period(*period_polls)
                    .with_noise(*noise)
                    .with_failure_rate(*failure_rate);
                if let Some(seed) = seed {
                    sim = sim.with_seed(*seed);
                }
                Box::new(sim)
            }
        }
    }
}

/// Binds a metric name to its source and optional fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub metric: String,
    pub source: SourceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<SourceSpec>,
}

impl AdapterConfig {
    pub fn new(metric: &str, source: SourceSpec) -> Self {
        Self {
            metric: metric.to_string(),
            source,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: SourceSpec) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metric.trim().is_empty() {
            return Err(ConfigError::invalid("adapter metric name is empty"));
        }
        self.source.validate(&self.metric)?;
        if let Some(fallback) = &self.fallback {
            fallback.validate(&self.metric)?;
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn MetricSource> {
        let primary = self.source.build(&self.metric);
        match &self.fallback {
            Some(fallback) => Box::new(FallbackSource::new(primary, fallback.build(&self.metric))),
            None => primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_from_toml() {
        let adapter: AdapterConfig = toml::from_str(
            r#"
            metric = "cpu_temp"
            source = { kind = "cpu_temp" }
            fallback = { kind = "cpu_temp_estimate" }
            "#,
        )
        .unwrap();
        assert_eq!(adapter.source, SourceSpec::CpuTemp);
        assert_eq!(adapter.fallback, Some(SourceSpec::CpuTempEstimate));
        assert_eq!(adapter.build().kind(), "fallback");
    }

    #[test]
    fn test_command_from_toml() {
        let adapter: AdapterConfig = toml::from_str(
            r#"
            metric = "gateway_ping"
            source = { kind = "command", program = "ping", args = ["-c", "1", "10.0.0.1"] }
            "#,
        )
        .unwrap();
        assert!(adapter.validate().is_ok());
        assert_eq!(adapter.build().metric(), "gateway_ping");
    }

    #[test]
    fn test_validation_rejects_bad_specs() {
        let empty = AdapterConfig::new(
            "x",
            SourceSpec::Command { program: " ".into(), args: vec![] },
        );
        assert!(empty.validate().is_err());

        let flaky = AdapterConfig::new(
            "x",
            SourceSpec::Simulated {
                base: 0.0,
                amplitude: 1.0,
                period_polls: 10,
                noise: 0.0,
                failure_rate: 1.5,
                seed: None,
            },
        );
        assert!(flaky.validate().is_err());

        assert!(AdapterConfig::new("", SourceSpec::CpuUsage).validate().is_err());
    }
}
