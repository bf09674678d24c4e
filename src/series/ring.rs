// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Fixed-capacity sample history

use std::collections::VecDeque;

use crate::error::BufferError;
use crate::sources::Sample;

/// Bounded, insertion-ordered store of samples for one metric
///
/// When full, the oldest sample is dropped to make room.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    metric: String,
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl RingBuffer {
    /// Capacity must be non-zero; the config layer rejects zero before we get here.
    pub fn new(metric: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            metric: metric.to_string(),
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: Sample) -> Result<(), BufferError> {
        if let Some(last) = self.samples.back() {
            if sample.seq <= last.seq {
                return Err(BufferError::Corruption {
                    metric: self.metric.clone(),
                    last: last.seq,
                    got: sample.seq,
                });
            }
        }

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Copy of the series, oldest first
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// Numeric values of the last `n` samples, oldest first. Text samples are skipped.
    pub fn recent_values(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples
            .iter()
            .skip(skip)
            .filter_map(Sample::as_f64)
            .collect()
    }

    /// Last `n` samples, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Sample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
