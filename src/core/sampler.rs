// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Sampler loop - polls sources, records series, evaluates rules

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::snapshot::{MetricSnapshot, Snapshot, StopReason};
use super::SamplerHandle;
use crate::alerting::{AlertEngine, AlertEvent, AlertRule, AlertSink};
use crate::config::{validate_derived, Config, SamplerConfig};
use crate::error::{ConfigError, SourceError};
use crate::series::{DerivedMetric, RingBuffer, SeriesSummary};
use crate::sources::{MetricSource, Sample, Value};

struct Series {
    ring: RingBuffer,
    last_seq: u64,
    /// Whether the most recent tick produced a sample
    fresh: bool,
}

impl Series {
    fn new(metric: &str, capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(metric, capacity),
            last_seq: 0,
            fresh: false,
        }
    }
}

/// Owns every series and the alert engine; the only writer of either
pub struct Sampler {
    config: SamplerConfig,
    sources: Vec<Box<dyn MetricSource>>,
    derived: Vec<DerivedMetric>,
    series: BTreeMap<String, Series>,
    engine: AlertEngine,
    sinks: Vec<Box<dyn AlertSink>>,
    ticks: u64,
    stop_reason: Option<StopReason>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));

        Ok(Self {
            engine: AlertEngine::new(config.alert_history, config.degraded_after),
            config,
            sources: Vec::new(),
            derived: Vec::new(),
            series: BTreeMap::new(),
            sinks: Vec::new(),
            ticks: 0,
            stop_reason: None,
            snapshot_tx,
        })
    }

    /// Build a sampler with every adapter, derived series and rule from `config`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut sampler = Self::new(config.sampler.clone())?;
        for adapter in &config.adapters {
            sampler.register(adapter.build())?;
        }
        for derived in &config.derived {
            sampler.add_derived(derived.clone())?;
        }
        for rule in &config.rules {
            sampler.add_rule(rule.clone())?;
        }
        Ok(sampler)
    }

    /// Register an adapter; metric names must be unique
    pub fn register(&mut self, source: Box<dyn MetricSource>) -> Result<(), ConfigError> {
        let metric = source.metric().to_string();
        if self.series.contains_key(&metric) {
            return Err(ConfigError::invalid(format!(
                "metric '{}' is already registered",
                metric
            )));
        }

        info!("Registered source: {} ({})", metric, source.kind());
        self.series
            .insert(metric.clone(), Series::new(&metric, self.config.buffer_capacity));
        self.sources.push(source);
        Ok(())
    }

    pub fn add_derived(&mut self, derived: DerivedMetric) -> Result<(), ConfigError> {
        let known: HashSet<String> = self.series.keys().cloned().collect();
        validate_derived(&derived, &known)?;

        let name = derived.name();
        debug!("Added derived series: {}", name);
        self.series
            .insert(name.clone(), Series::new(&name, self.config.buffer_capacity));
        self.derived.push(derived);
        Ok(())
    }

    pub fn add_rule(&mut self, rule: AlertRule) -> Result<(), ConfigError> {
        rule.validate()?;
        self.engine.add_rule(rule);
        Ok(())
    }

    pub fn add_sink(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn recent_alerts(&self, n: usize) -> Vec<AlertEvent> {
        self.engine.recent(n)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Run one tick: poll, record, derive, evaluate, publish
    ///
    /// Returns the alerts emitted during this tick.
    pub async fn tick(&mut self) -> Vec<AlertEvent> {
        let started = Instant::now();
        let poll_timeout = self.config.poll_timeout();

        let mut results: Vec<(String, Result<Value, SourceError>)> =
            Vec::with_capacity(self.sources.len());
        for source in self.sources.iter_mut() {
            let metric = source.metric().to_string();
            let result = match timeout(poll_timeout, source.poll()).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    metric: metric.clone(),
                    timeout: poll_timeout,
                }),
            };
            results.push((metric, result));
        }

        for series in self.series.values_mut() {
            series.fresh = false;
        }

        let mut fresh_values: HashMap<String, f64> = HashMap::new();
        let mut emitted = Vec::new();

        for (metric, result) in results {
            match result {
                Ok(value) => {
                    self.engine.record_success(&metric);
                    if let Some(v) = value.as_f64() {
                        fresh_values.insert(metric.clone(), v);
                    }
                    self.record(&metric, value);
                }
                Err(e) => {
                    debug!("Poll failed: {}", e);
                    if let Some(event) = self.engine.record_failure(&metric, &e) {
                        emitted.push(event);
                    }
                }
            }
        }

        self.compute_derived(&mut fresh_values);

        emitted.extend(self.engine.evaluate(Instant::now(), &fresh_values));
        self.ticks += 1;

        for event in &emitted {
            for sink in &self.sinks {
                sink.deliver(event);
            }
            if event.requests_stop() && self.stop_reason.is_none() {
                error!("EMERGENCY STOP TRIGGERED: {}", event.message);
                self.stop_reason = Some(StopReason::Alert {
                    metric: event.metric.clone(),
                    message: event.message.clone(),
                });
            }
        }

        self.publish();

        let elapsed = started.elapsed();
        if elapsed > self.config.tick_interval() {
            warn!(
                "Tick {} took {:?} (interval {:?}), skipped tick",
                self.ticks,
                elapsed,
                self.config.tick_interval()
            );
        }

        emitted
    }

    fn record(&mut self, metric: &str, value: Value) {
        let capacity = self.config.buffer_capacity;
        let series = self
            .series
            .entry(metric.to_string())
            .or_insert_with(|| Series::new(metric, capacity));

        series.last_seq += 1;
        let sample = Sample::new(metric, series.last_seq, value);

        if let Err(e) = series.ring.push(sample.clone()) {
            error!("{}; rebuilding buffer for '{}'", e, series.ring.metric());
            series.ring.clear();
            series.last_seq = sample.seq;
            if let Err(e) = series.ring.push(sample) {
                error!("{} after rebuild", e);
                return;
            }
        }
        series.fresh = true;
    }

    fn compute_derived(&mut self, fresh_values: &mut HashMap<String, f64>) {
        for i in 0..self.derived.len() {
            let derived = &self.derived[i];
            let value = match self.series.get(&derived.source) {
                Some(source) if source.fresh => derived.compute(&source.ring),
                _ => None,
            };

            if let Some(v) = value.filter(|v| v.is_finite()) {
                let name = derived.name();
                fresh_values.insert(name.clone(), v);
                self.record(&name, Value::Number(v));
            }
        }
    }

    fn build_snapshot(&self) -> Snapshot {
        let keep = self.config.snapshot_history;
        let metrics = self
            .series
            .iter()
            .map(|(name, series)| {
                let history: Vec<Sample> = series.ring.recent(keep).cloned().collect();
                let numeric: Vec<f64> = history.iter().filter_map(Sample::as_f64).collect();
                let view = MetricSnapshot {
                    latest: if series.fresh { series.ring.latest().cloned() } else { None },
                    consecutive_failures: self.engine.consecutive_failures(name),
                    summary: SeriesSummary::from_values(&numeric),
                    history,
                };
                (name.clone(), view)
            })
            .collect();

        Snapshot {
            taken_at: Utc::now(),
            tick: self.ticks,
            metrics,
            alerts: self.engine.recent(self.config.alert_history),
            stop_reason: self.stop_reason.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Arc::new(self.build_snapshot()));
    }

    /// Check every rule targets a known series
    fn check_rules(&self) -> Result<(), ConfigError> {
        for rule in self.engine.rules() {
            if !self.series.contains_key(&rule.metric) {
                return Err(ConfigError::invalid(format!(
                    "rule '{}' refers to unknown metric '{}'",
                    rule, rule.metric
                )));
            }
        }
        Ok(())
    }

    /// Start the loop on the current tokio runtime
    pub fn spawn(self) -> Result<SamplerHandle, ConfigError> {
        self.check_rules()?;

        let snapshot_rx = self.snapshot_tx.subscribe();
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let task = tokio::spawn(self.run(shutdown_rx));

        Ok(SamplerHandle::new(snapshot_rx, shutdown_tx, task))
    }

    /// Tick until shutdown or a stop-action alert; returns the final snapshot
    ///
    /// Shutdown is only observed between ticks, so a tick is never cut short.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Arc<Snapshot> {
        info!(
            "Starting sampler: {} sources, {} derived, tick every {:?}",
            self.sources.len(),
            self.derived.len(),
            self.config.tick_interval()
        );

        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Sampler shutting down...");
                    self.stop_reason.get_or_insert(StopReason::Requested);
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.tick().await;

            if let Some(reason) = &self.stop_reason {
                warn!("Sampler stopping: {}", reason);
                break;
            }
        }

        self.publish();
        info!("Sampler stopped after {} ticks", self.ticks);
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::{AlertAction, AlertKind, ChannelSink, Comparator, Severity};
    use crate::series::DerivedKind;
    use crate::sources::testing::{ControlledSource, ScriptedSource};
    use async_trait::async_trait;
    use std::time::Duration;

    fn config(capacity: usize) -> SamplerConfig {
        SamplerConfig {
            tick_interval_ms: 100,
            buffer_capacity: capacity,
            poll_timeout_ms: 50,
            degraded_after: 3,
            alert_history: 100,
            snapshot_history: capacity,
        }
    }

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl MetricSource for SlowSource {
        fn metric(&self) -> &str { "slow" }
        fn kind(&self) -> &'static str { "slow" }

        async fn poll(&mut self) -> Result<Value, SourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(Value::Number(1.0))
        }
    }

    #[tokio::test]
    async fn test_immediate_threshold_alert() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        sampler
            .register(Box::new(ScriptedSource::new("cpu_temp", vec![Some(90.0)])))
            .unwrap();
        sampler
            .add_rule(AlertRule::new("cpu_temp", Comparator::Gt, 85.0))
            .unwrap();

        let events = sampler.tick().await;
        assert_eq!(events.len(), 1);

        let alerts = sampler.snapshot().recent_alerts(10);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].observed_value, Some(90.0));
        assert_eq!(alerts[0].kind, AlertKind::Threshold);
    }

    #[tokio::test]
    async fn test_hundred_clean_ticks_make_hundred_samples() {
        let mut sampler = Sampler::new(config(1000)).unwrap();
        sampler
            .register(Box::new(ScriptedSource::new("load", vec![Some(1.0)])))
            .unwrap();

        for _ in 0..100 {
            sampler.tick().await;
        }

        let snapshot = sampler.snapshot();
        let load = &snapshot.metrics["load"];
        assert_eq!(load.history.len(), 100);
        assert_eq!(load.summary.count, 100);
        assert_eq!(snapshot.tick, 100);
    }

    #[tokio::test]
    async fn test_history_bounded_by_capacity() {
        let mut sampler = Sampler::new(config(5)).unwrap();
        let script = (1..=7).map(|v| Some(v as f64)).collect();
        sampler
            .register(Box::new(ScriptedSource::new("load", script)))
            .unwrap();

        for _ in 0..7 {
            sampler.tick().await;
        }

        let values: Vec<f64> = sampler.snapshot().metrics["load"]
            .history
            .iter()
            .filter_map(Sample::as_f64)
            .collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[tokio::test]
    async fn test_failures_mark_missing_and_degrade_once() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        let mut script = vec![Some(50.0)];
        script.extend(std::iter::repeat(None).take(10));
        sampler
            .register(Box::new(ScriptedSource::new("cpu_temp", script)))
            .unwrap();
        let (sink, mut rx) = ChannelSink::new();
        sampler.add_sink(Box::new(sink));

        for _ in 0..11 {
            sampler.tick().await;
        }

        let snapshot = sampler.snapshot();
        let cpu = &snapshot.metrics["cpu_temp"];
        assert!(cpu.is_missing());
        assert_eq!(cpu.display_value(), "no data");
        assert_eq!(cpu.history.len(), 1);
        assert_eq!(cpu.consecutive_failures, 10);

        let degraded: Vec<_> = snapshot
            .alerts
            .iter()
            .filter(|a| a.kind == AlertKind::SourceDegraded)
            .collect();
        assert_eq!(degraded.len(), 1);

        let delivered = rx.try_recv().unwrap();
        assert_eq!(delivered.kind, AlertKind::SourceDegraded);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_sample_does_not_trip_rule() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        let (source, value) = ControlledSource::new("cpu_temp", Some(95.0));
        sampler.register(Box::new(source)).unwrap();
        sampler
            .add_rule(AlertRule::new("cpu_temp", Comparator::Gt, 85.0).with_cooldown(0.0))
            .unwrap();

        assert_eq!(sampler.tick().await.len(), 1);

        *value.lock() = None;
        assert!(sampler.tick().await.is_empty());
        assert!(sampler.snapshot().metrics["cpu_temp"].is_missing());
    }

    #[tokio::test]
    async fn test_derived_series_and_rules() {
        let mut sampler = Sampler::new(config(50)).unwrap();
        let (source, value) = ControlledSource::new("ping_ms", Some(10.0));
        sampler.register(Box::new(source)).unwrap();
        sampler
            .add_derived(DerivedMetric::new("ping_ms", DerivedKind::Jitter, 4))
            .unwrap();
        sampler
            .add_derived(DerivedMetric::new("ping_ms", DerivedKind::Mean, 4))
            .unwrap();
        sampler
            .add_rule(AlertRule::new("ping_ms.jitter", Comparator::Gt, 20.0))
            .unwrap();

        // one sample: mean only, jitter needs two
        sampler.tick().await;
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.value("ping_ms.mean"), Some(10.0));
        assert_eq!(snapshot.display("ping_ms.jitter"), "no data");

        *value.lock() = Some(70.0);
        let events = sampler.tick().await;
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.value("ping_ms.mean"), Some(40.0));
        assert_eq!(snapshot.value("ping_ms.jitter"), Some(30.0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metric, "ping_ms.jitter");

        // no derived values when the source misses a tick
        *value.lock() = None;
        sampler.tick().await;
        assert_eq!(sampler.snapshot().value("ping_ms.mean"), None);
    }

    #[tokio::test]
    async fn test_registration_errors() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        sampler
            .register(Box::new(ScriptedSource::new("a", vec![Some(1.0)])))
            .unwrap();
        assert!(sampler
            .register(Box::new(ScriptedSource::new("a", vec![Some(1.0)])))
            .is_err());
        assert!(sampler
            .add_derived(DerivedMetric::new("b", DerivedKind::Mean, 3))
            .is_err());
        assert!(sampler
            .add_rule(AlertRule::new("a", Comparator::Gt, f64::NAN))
            .is_err());

        sampler
            .add_rule(AlertRule::new("missing", Comparator::Gt, 1.0))
            .unwrap();
        assert!(sampler.spawn().is_err());

        let bad = SamplerConfig {
            tick_interval_ms: 0,
            ..config(10)
        };
        assert!(Sampler::new(bad).is_err());
    }

    #[tokio::test]
    async fn test_corrupted_buffer_is_rebuilt() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        sampler
            .register(Box::new(ScriptedSource::new("load", vec![Some(1.0)])))
            .unwrap();
        for _ in 0..3 {
            sampler.tick().await;
        }

        // force a sequence regression
        sampler.series.get_mut("load").unwrap().last_seq = 0;
        sampler.tick().await;

        let history = &sampler.snapshot().metrics["load"].history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].seq, 1);

        let ring = &sampler.series["load"].ring;
        assert_eq!(ring.metric(), "load");
        assert_eq!(ring.capacity(), 10);

        // pushes continue from the rebuilt sequence
        sampler.tick().await;
        let seqs: Vec<u64> = sampler.snapshot().metrics["load"].history.iter().map(|s| s.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_counts_as_failure() {
        let mut sampler = Sampler::new(config(10)).unwrap();
        sampler
            .register(Box::new(SlowSource { delay: Duration::from_secs(10) }))
            .unwrap();

        for _ in 0..3 {
            sampler.tick().await;
        }

        let snapshot = sampler.snapshot();
        assert!(snapshot.metrics["slow"].is_missing());
        assert_eq!(snapshot.alerts.len(), 1);
        assert!(snapshot.alerts[0].message.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_cleanly_on_request() {
        let mut sampler = Sampler::new(config(100)).unwrap();
        sampler
            .register(Box::new(ScriptedSource::new("load", vec![Some(1.0)])))
            .unwrap();
        let handle = sampler.spawn().unwrap();

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let live = handle.snapshot();
        assert!(live.tick >= 10);
        assert!(handle.uptime() >= Duration::from_millis(1050));

        let last = handle.stop().await.unwrap();
        assert_eq!(last.stop_reason, Some(StopReason::Requested));
        assert_eq!(last.metrics["load"].history.len() as u64, last.tick);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_ticks_do_not_queue() {
        let mut sampler = Sampler::new(SamplerConfig {
            poll_timeout_ms: 1000,
            ..config(100)
        })
        .unwrap();
        sampler
            .register(Box::new(SlowSource { delay: Duration::from_millis(250) }))
            .unwrap();
        let handle = sampler.spawn().unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let last = handle.stop().await.unwrap();

        // 100ms interval but 250ms polls: roughly one tick per 300ms, no backlog burst
        assert!(last.tick >= 3 && last.tick <= 5, "ticks = {}", last.tick);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_action_halts_loop() {
        let mut sampler = Sampler::new(config(100)).unwrap();
        let (source, value) = ControlledSource::new("cpu_temp", Some(70.0));
        sampler.register(Box::new(source)).unwrap();
        sampler
            .add_rule(
                AlertRule::new("cpu_temp", Comparator::Gt, 90.0)
                    .with_grace(1.0)
                    .with_severity(Severity::Critical)
                    .with_action(AlertAction::Stop),
            )
            .unwrap();
        let handle = sampler.spawn().unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!handle.is_finished());

        *value.lock() = Some(97.0);
        let last = handle.wait().await.unwrap();

        assert!(matches!(
            last.stop_reason,
            Some(StopReason::Alert { ref metric, .. }) if metric == "cpu_temp"
        ));
        assert_eq!(last.alerts.len(), 1);
        assert_eq!(last.alerts[0].severity, Severity::Critical);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_snapshots_are_bounded_and_ordered() {
        let mut sampler = Sampler::new(SamplerConfig {
            tick_interval_ms: 1,
            ..config(8)
        })
        .unwrap();
        let script = (1..=10_000).map(|v| Some(v as f64)).collect();
        sampler
            .register(Box::new(ScriptedSource::new("load", script)))
            .unwrap();
        let handle = sampler.spawn().unwrap();

        let reader = {
            let rx = handle.subscribe();
            tokio::spawn(async move {
                let mut checked = 0;
                for _ in 0..500 {
                    let snapshot = rx.borrow().clone();
                    if let Some(load) = snapshot.metrics.get("load") {
                        assert!(load.history.len() <= 8);
                        assert!(load.history.windows(2).all(|w| w[0].seq < w[1].seq));
                        checked += 1;
                    }
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                checked
            })
        };

        let checked = reader.await.unwrap();
        handle.stop().await.unwrap();
        assert!(checked > 0);
    }
}
