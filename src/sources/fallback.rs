// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Primary-then-fallback source combinator

use async_trait::async_trait;
use tracing::debug;

use super::{MetricSource, Value};
use crate::error::SourceError;

/// Polls `primary`; if it fails, polls `fallback` instead
///
/// When both fail the primary's error is reported.
pub struct FallbackSource {
    primary: Box<dyn MetricSource>,
    fallback: Box<dyn MetricSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn MetricSource>, fallback: Box<dyn MetricSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl MetricSource for FallbackSource {
    fn metric(&self) -> &str { self.primary.metric() }
    fn kind(&self) -> &'static str { "fallback" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let primary_err = match self.primary.poll().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        debug!(
            "{} ({}) failed, using {}: {}",
            self.primary.metric(),
            self.primary.kind(),
            self.fallback.kind(),
            primary_err
        );

        match self.fallback.poll().await {
            Ok(value) => Ok(value),
            Err(fallback_err) => {
                debug!("fallback for {} also failed: {}", self.primary.metric(), fallback_err);
                Err(primary_err)
            }
        }
    }
}
