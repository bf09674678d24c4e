// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Series module - bounded metric history and derived statistics

mod derived;
mod ring;
pub mod stats;

pub use derived::{DerivedKind, DerivedMetric};
pub use ring::RingBuffer;
pub use stats::SeriesSummary;
