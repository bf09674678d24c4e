// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Runs synchronous sysinfo refreshes off the async worker threads

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SourceError;

/// A sysinfo handle refreshed on tokio's blocking pool
///
/// A poll abandoned by the sampler's timeout leaves its refresh running;
/// the next poll queues behind it on the lock instead of stalling the runtime.
pub(crate) struct BlockingResource<R> {
    inner: Arc<Mutex<R>>,
}

impl<R: Send + 'static> BlockingResource<R> {
    pub fn new(resource: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resource)),
        }
    }

    pub async fn run<T, F>(&self, metric: &str, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&mut inner.lock()))
            .await
            .map_err(|e| SourceError::unavailable(metric, format!("refresh task failed: {}", e)))
    }
}
