// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Error taxonomy for sources, buffers and configuration

use std::time::Duration;
use thiserror::Error;

/// A single poll of a metric source failed
///
/// Always recoverable: the sampler skips the metric for the current tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source for '{metric}' unavailable: {reason}")]
    Unavailable { metric: String, reason: String },

    #[error("source for '{metric}' timed out after {timeout:?}")]
    Timeout { metric: String, timeout: Duration },

    #[error("source for '{metric}' returned unparseable output: {output}")]
    Parse { metric: String, output: String },
}

impl SourceError {
    /// Create an unavailable error
    pub fn unavailable<M: Into<String>, R: Into<String>>(metric: M, reason: R) -> Self {
        SourceError::Unavailable {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    /// Metric the failing source is bound to
    pub fn metric(&self) -> &str {
        match self {
            SourceError::Unavailable { metric, .. }
            | SourceError::Timeout { metric, .. }
            | SourceError::Parse { metric, .. } => metric,
        }
    }
}

/// Ring buffer integrity violation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("series '{metric}' corrupted: seq {got} pushed after seq {last}")]
    Corruption { metric: String, last: u64, got: u64 },
}

/// Startup configuration problem; fatal before the loop starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid-config error
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        ConfigError::Invalid(msg.into())
    }
}
