// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Alert sinks - where emitted events are delivered

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::{AlertEvent, Severity};

/// Receives every emitted alert, on the sampler task
///
/// Implementations must not block for long; hand work off to a channel if
/// delivery is slow.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, event: &AlertEvent);
}

/// Writes alerts to the tracing log at a level matching their severity
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&self, event: &AlertEvent) {
        match event.severity {
            Severity::Critical => error!("🚨 [{:?}] {}", event.kind, event.message),
            Severity::Warning => warn!("⚠️ [{:?}] {}", event.kind, event.message),
            Severity::Info => info!("[{:?}] {}", event.kind, event.message),
        }
    }
}

/// Forwards alerts to an unbounded tokio channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelSink {
    fn deliver(&self, event: &AlertEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event.clone());
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(pub F);

impl<F> AlertSink for FnSink<F>
where
    F: Fn(&AlertEvent) + Send + Sync,
{
    fn deliver(&self, event: &AlertEvent) {
        (self.0)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::AlertKind;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    fn event() -> AlertEvent {
        AlertEvent {
            id: Uuid::new_v4(),
            kind: AlertKind::SourceDegraded,
            metric: "net_rx_rate".to_string(),
            rule: None,
            severity: Severity::Warning,
            triggered_at: Utc::now(),
            observed_value: None,
            message: "net_rx_rate failed 3 consecutive polls".to_string(),
        }
    }

    #[test]
    fn test_channel_sink() {
        let (sink, mut rx) = ChannelSink::new();
        sink.deliver(&event());
        let got = rx.try_recv().unwrap();
        assert_eq!(got.metric, "net_rx_rate");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.deliver(&event());
    }

    #[test]
    fn test_fn_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let sink = FnSink(move |_: &AlertEvent| {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        sink.deliver(&event());
        sink.deliver(&event());
        assert_eq!(count.load(Ordering::Relaxed), 2);
        LogSink.deliver(&event());
    }
}
