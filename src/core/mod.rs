// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Core module - the sampler loop and the views it publishes

mod handle;
mod sampler;
mod snapshot;

pub use handle::SamplerHandle;
pub use sampler::Sampler;
pub use snapshot::{MetricSnapshot, Snapshot, StopReason, NO_DATA};
