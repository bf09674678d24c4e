// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Simulated source for demo mode and testing

use std::f64::consts::PI;

use async_trait::async_trait;
use rand::prelude::*;
use rand_distr::Normal;

use super::{MetricSource, Value};
use crate::error::SourceError;

/// Sine wave plus Gaussian noise, with an optional random failure rate
pub struct SimulatedSource {
    metric: String,
    base: f64,
    amplitude: f64,
    period_polls: u32,
    noise: Option<Normal<f64>>,
    failure_rate: f64,
    rng: StdRng,
    polls: u64,
}

impl SimulatedSource {
    pub fn new(metric: &str, base: f64, amplitude: f64) -> Self {
        Self {
            metric: metric.to_string(),
            base,
            amplitude,
            period_polls: 60,
            noise: None,
            failure_rate: 0.0,
            rng: StdRng::from_entropy(),
            polls: 0,
        }
    }

    pub fn with_period(mut self, period_polls: u32) -> Self {
        self.period_polls = period_polls.max(1);
        self
    }

    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise = Normal::new(0.0, std_dev).ok().filter(|_| std_dev > 0.0);
        self
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn generate(&mut self) -> f64 {
        let phase = 2.0 * PI * (self.polls % self.period_polls as u64) as f64 / self.period_polls as f64;
        let noise = self.noise.map(|n| n.sample(&mut self.rng)).unwrap_or(0.0);
        self.base + self.amplitude * phase.sin() + noise
    }
}

#[async_trait]
impl MetricSource for SimulatedSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "simulated" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        self.polls += 1;
        if self.failure_rate > 0.0 && self.rng.gen::<f64>() < self.failure_rate {
            return Err(SourceError::unavailable(&self.metric, "simulated dropout"));
        }
        Ok(Value::Number(self.generate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noiseless_wave_stays_in_band() {
        let mut source = SimulatedSource::new("wave", 50.0, 10.0).with_period(8);
        for _ in 0..32 {
            let v = source.poll().await.unwrap().as_f64().unwrap();
            assert!((40.0 - 1e-9..=60.0 + 1e-9).contains(&v));
        }
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let mut a = SimulatedSource::new("a", 0.0, 1.0).with_noise(2.0).with_seed(7);
        let mut b = SimulatedSource::new("a", 0.0, 1.0).with_noise(2.0).with_seed(7);
        for _ in 0..10 {
            assert_eq!(a.poll().await.unwrap(), b.poll().await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_failure_rate_one_always_fails() {
        let mut source = SimulatedSource::new("flaky", 0.0, 0.0).with_failure_rate(1.0);
        for _ in 0..5 {
            assert!(source.poll().await.is_err());
        }
    }
}
