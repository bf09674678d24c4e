// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Network throughput sources

use std::time::Instant;

use async_trait::async_trait;
use sysinfo::Networks;

use super::blocking::BlockingResource;
use super::{MetricSource, Value};
use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rx,
    Tx,
}

/// Throughput across all interfaces in KB/s since the previous poll
pub struct NetworkRateSource {
    metric: String,
    direction: Direction,
    networks: BlockingResource<Networks>,
    last_refresh: Instant,
}

impl NetworkRateSource {
    pub fn new(metric: &str, direction: Direction) -> Self {
        Self {
            metric: metric.to_string(),
            direction,
            networks: BlockingResource::new(Networks::new_with_refreshed_list()),
            last_refresh: Instant::now(),
        }
    }
}

pub(crate) fn kb_per_sec(bytes: u64, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs <= 0.0 {
        return None;
    }
    Some(bytes as f64 / 1024.0 / elapsed_secs)
}

#[async_trait]
impl MetricSource for NetworkRateSource {
    fn metric(&self) -> &str { &self.metric }

    fn kind(&self) -> &'static str {
        match self.direction {
            Direction::Rx => "net_rx_rate",
            Direction::Tx => "net_tx_rate",
        }
    }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let direction = self.direction;
        let bytes = self
            .networks
            .run(&self.metric, move |networks| {
                networks.refresh();
                (!networks.is_empty()).then(|| {
                    networks
                        .iter()
                        .map(|(_, data)| match direction {
                            Direction::Rx => data.received(),
                            Direction::Tx => data.transmitted(),
                        })
                        .sum::<u64>()
                })
            })
            .await?;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refresh).as_secs_f64();
        self.last_refresh = now;

        let bytes = bytes
            .ok_or_else(|| SourceError::unavailable(&self.metric, "no network interfaces"))?;

        kb_per_sec(bytes, elapsed)
            .map(Value::Number)
            .ok_or_else(|| SourceError::unavailable(&self.metric, "polled twice in the same instant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kb_per_sec() {
        assert_eq!(kb_per_sec(2048, 2.0), Some(1.0));
        assert_eq!(kb_per_sec(2048, 0.0), None);
    }
}
