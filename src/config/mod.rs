// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::alerting::{AlertRule, Comparator, Severity};
use crate::error::ConfigError;
use crate::export::ExportConfig;
use crate::series::{DerivedKind, DerivedMetric};
use crate::sources::{AdapterConfig, SourceSpec};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Replace the configured adapters with simulated ones
    pub demo_mode: bool,

    /// Sampler loop configuration
    pub sampler: SamplerConfig,

    /// Metric sources, one per metric name
    pub adapters: Vec<AdapterConfig>,

    /// Series computed from other series after each tick
    pub derived: Vec<DerivedMetric>,

    /// Threshold rules
    pub rules: Vec<AlertRule>,

    /// Report and export configuration
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Vigil".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            demo_mode: false,
            sampler: SamplerConfig::default(),
            adapters: vec![
                AdapterConfig::new("cpu_usage", SourceSpec::CpuUsage),
                AdapterConfig::new("memory_usage", SourceSpec::MemoryUsage),
                AdapterConfig::new("load_average", SourceSpec::LoadAverage),
                AdapterConfig::new("cpu_temp", SourceSpec::CpuTemp)
                    .with_fallback(SourceSpec::CpuTempEstimate),
                AdapterConfig::new("net_rx_rate", SourceSpec::NetRxRate),
                AdapterConfig::new("net_tx_rate", SourceSpec::NetTxRate),
            ],
            derived: vec![
                DerivedMetric::new("cpu_usage", DerivedKind::Mean, 10),
                DerivedMetric::new("net_rx_rate", DerivedKind::Jitter, 20),
                DerivedMetric::new("net_rx_rate", DerivedKind::Trend, 50),
            ],
            rules: vec![
                AlertRule::new("cpu_temp", Comparator::Gt, 85.0)
                    .with_grace(30.0)
                    .with_cooldown(60.0)
                    .with_severity(Severity::Critical)
                    .with_grace_logging(true),
                AlertRule::new("cpu_usage.mean", Comparator::Gt, 95.0)
                    .with_grace(10.0)
                    .with_cooldown(60.0),
                AlertRule::new("memory_usage", Comparator::Gt, 90.0)
                    .with_grace(5.0)
                    .with_cooldown(60.0),
            ],
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("vigil"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Simulated adapters used in demo mode
    ///
    /// `cpu_temp` swings across the default 85°C rule and `flaky_probe`
    /// drops out often enough to exercise degraded-source alerts.
    pub fn demo_adapters() -> Vec<AdapterConfig> {
        let sim = |base: f64, amplitude: f64, noise: f64, failure_rate: f64| SourceSpec::Simulated {
            base,
            amplitude,
            period_polls: 120,
            noise,
            failure_rate,
            seed: None,
        };

        vec![
            AdapterConfig::new("cpu_usage", sim(55.0, 40.0, 5.0, 0.0)),
            AdapterConfig::new("memory_usage", sim(60.0, 10.0, 1.0, 0.0)),
            AdapterConfig::new("load_average", sim(2.0, 1.5, 0.2, 0.0)),
            AdapterConfig::new("cpu_temp", sim(72.0, 18.0, 1.5, 0.05)),
            AdapterConfig::new("net_rx_rate", sim(400.0, 300.0, 50.0, 0.0)),
            AdapterConfig::new("net_tx_rate", sim(80.0, 60.0, 10.0, 0.0)),
            AdapterConfig::new("flaky_probe", sim(10.0, 2.0, 0.5, 0.6)),
        ]
    }

    /// Check the whole configuration before the sampler starts
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.sampler.validate()?;

        let mut known: HashSet<String> = HashSet::new();
        for adapter in &self.adapters {
            adapter.validate()?;
            if !known.insert(adapter.metric.clone()) {
                return Err(ConfigError::invalid(format!(
                    "metric '{}' has more than one adapter",
                    adapter.metric
                )));
            }
        }

        for derived in &self.derived {
            validate_derived(derived, &known)?;
            known.insert(derived.name());
        }

        for rule in &self.rules {
            rule.validate()?;
            if !known.contains(&rule.metric) {
                return Err(ConfigError::invalid(format!(
                    "rule '{}' refers to unknown metric '{}'",
                    rule, rule.metric
                )));
            }
        }

        Ok(())
    }
}

/// Derived series must read from an already-known metric and not shadow one
pub(crate) fn validate_derived(
    derived: &DerivedMetric,
    known: &HashSet<String>,
) -> std::result::Result<(), ConfigError> {
    if !known.contains(&derived.source) {
        return Err(ConfigError::invalid(format!(
            "derived '{}' reads unknown metric '{}'",
            derived.name(),
            derived.source
        )));
    }
    if known.contains(&derived.name()) {
        return Err(ConfigError::invalid(format!(
            "derived '{}' is defined twice",
            derived.name()
        )));
    }
    if derived.window < derived.kind.min_window() {
        return Err(ConfigError::invalid(format!(
            "derived '{}' needs a window of at least {}",
            derived.name(),
            derived.kind.min_window()
        )));
    }
    Ok(())
}

/// Sampler loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Time between tick starts in milliseconds
    pub tick_interval_ms: u64,

    /// Samples kept per metric
    pub buffer_capacity: usize,

    /// Upper bound on a single adapter poll in milliseconds
    pub poll_timeout_ms: u64,

    /// Consecutive failed polls before a source is reported degraded
    pub degraded_after: u32,

    /// Alert events kept in history
    pub alert_history: usize,

    /// Samples per metric copied into each published snapshot
    pub snapshot_history: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            buffer_capacity: 1000,
            poll_timeout_ms: 2000,
            degraded_after: 3,
            alert_history: 100,
            snapshot_history: 120,
        }
    }
}

impl SamplerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let checks = [
            ("tick_interval_ms", self.tick_interval_ms == 0),
            ("buffer_capacity", self.buffer_capacity == 0),
            ("poll_timeout_ms", self.poll_timeout_ms == 0),
            ("degraded_after", self.degraded_after == 0),
            ("alert_history", self.alert_history == 0),
        ];
        for (field, is_zero) in checks {
            if is_zero {
                return Err(ConfigError::invalid(format!("sampler.{} must be > 0", field)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.sampler, config.sampler);
        assert_eq!(parsed.adapters, config.adapters);
        assert_eq!(parsed.derived, config.derived);
        assert_eq!(parsed.rules, config.rules);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sampler]
            tick_interval_ms = 250

            [[adapters]]
            metric = "cpu_temp"
            source = { kind = "cpu_temp" }
            fallback = { kind = "cpu_temp_estimate" }

            [[rules]]
            metric = "cpu_temp"
            comparator = ">"
            threshold = 85
            "#,
        )
        .unwrap();

        assert_eq!(config.sampler.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.sampler.buffer_capacity, 1000);
        assert_eq!(config.adapters.len(), 1);
        // derived defaults reference metrics this file does not define
        assert!(config.validate().is_err());

        let config = Config { derived: vec![], ..config };
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_configs_fail_fast() {
        let mut config = Config::default();
        config.sampler.buffer_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.adapters.push(AdapterConfig::new("cpu_usage", SourceSpec::CpuUsage));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("more than one")));

        let mut config = Config::default();
        config.rules.push(AlertRule::new("gpu_temp", Comparator::Gt, 80.0));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.derived.push(DerivedMetric::new("cpu_usage", DerivedKind::Jitter, 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_demo_adapters_are_valid() {
        let config = Config {
            adapters: Config::demo_adapters(),
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(loaded.sampler, created.sampler);
        assert_eq!(loaded.rules, created.rules);
    }
}
