// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Vigil - Periodic Metric Sampler and Threshold Alerting
//!
//! Polls pluggable metric sources on a fixed cadence, keeps a bounded
//! history per metric, and raises alerts when thresholds hold past a
//! grace period:
//! - Built-in adapters for CPU, memory, load, temperature and network rates
//! - Shell-command and simulated sources, with per-metric fallbacks
//! - Derived series (rolling mean, jitter, rate, trend)
//! - Grace period and cooldown per rule, with optional emergency stop
//! - Shared `Arc` snapshots for status displays and exports
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Sampler task                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌──────────┐   ┌─────────┐   ┌─────────┐  │
//! │  │ Sources │ → │  Series  │ → │ Alerting│ → │  Sinks  │  │
//! │  │ (poll)  │   │ (ring +  │   │ (rules) │   │         │  │
//! │  │         │   │ derived) │   │         │   │         │  │
//! │  └─────────┘   └──────────┘   └─────────┘   └─────────┘  │
//! │        ↓             ↓              ↓                    │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │             Snapshot (watch channel)               │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!                 ↓                         ↓
//!          status / UI readers       report + exports
//! ```

pub mod alerting;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod series;
pub mod sources;

// Re-exports for convenience
pub use alerting::{AlertEvent, AlertRule, AlertSink, Comparator, Severity};
pub use config::Config;
pub use crate::core::{Sampler, SamplerHandle, Snapshot, StopReason};
pub use error::{BufferError, ConfigError, SourceError};
pub use sources::{MetricSource, Sample, Value};

/// Vigil version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vigil name
pub const NAME: &str = "Vigil";
