// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Vigil - Periodic Metric Sampler and Threshold Alerting
//!
//! Headless monitor: samples the local machine (or simulated sources in
//! demo mode), prints periodic status lines, raises alerts and writes a
//! report on exit.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vigil::alerting::LogSink;
use vigil::export::{render_report, JsonLinesSink, SnapshotExporter};
use vigil::{Config, Sampler, Snapshot, StopReason, NAME, VERSION};

/// Vigil - Periodic Metric Sampler and Threshold Alerting
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version = VERSION)]
#[command(about = "Periodic metric sampling with grace-period threshold alerts")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Demo mode with simulated sources
    #[arg(long)]
    demo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// How often to print a status line
    #[arg(long, default_value = "5000")]
    status_every_ms: u64,

    /// Write the final text report here
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🌡️ {} v{} - Periodic Metric Sampler", NAME, VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if config.demo_mode {
        config.adapters = Config::demo_adapters();
    }
    if let Some(ms) = args.interval_ms {
        config.sampler.tick_interval_ms = ms;
    }
    if let Some(report) = args.report.clone() {
        config.export.report_path = Some(report);
    }

    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, &args))
}

async fn run(config: Config, args: &Args) -> Result<()> {
    let mut sampler = Sampler::from_config(&config)?;
    sampler.add_sink(Box::new(LogSink));
    if let Some(path) = &config.export.alert_log {
        sampler.add_sink(Box::new(JsonLinesSink::open(path)?));
        info!("Appending alerts to {:?}", path);
    }

    let handle = sampler.spawn()?;

    info!("🚀 {} running", NAME);
    info!("   Press Ctrl+C to shutdown");

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    // closes when the sampler task exits
    let mut updates = handle.subscribe();

    let mut status = tokio::time::interval(Duration::from_millis(args.status_every_ms.max(1)));
    status.tick().await;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown signal received, cleaning up...");
                break;
            }
            _ = &mut deadline => {
                info!("Run duration reached");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = status.tick() => {
                info!("{}", status_line(&handle.snapshot()));
            }
        }
    }

    let uptime = handle.uptime();
    let last = handle.stop().await?;
    if let Some(StopReason::Alert { metric, message }) = &last.stop_reason {
        error!("Stopped by alert on {}: {}", metric, message);
    }

    write_exports(&config, &last);
    info!("{} shutdown complete after {:.1}s", NAME, uptime.as_secs_f64());
    Ok(())
}

fn status_line(snapshot: &Snapshot) -> String {
    let metrics: Vec<String> = snapshot
        .metrics
        .keys()
        .map(|name| format!("{}={}", name, snapshot.display(name)))
        .collect();
    format!("[tick {}] {}", snapshot.tick, metrics.join("  "))
}

fn write_exports(config: &Config, snapshot: &Snapshot) {
    let report = render_report(snapshot);
    match &config.export.report_path {
        Some(path) => {
            let written = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|_| std::fs::write(path, &report));
            match written {
                Ok(()) => info!("Report written to {:?}", path),
                Err(e) => error!("Failed to write report to {:?}: {}", path, e),
            }
        }
        None => println!("{}", report),
    }

    if let Some(path) = &config.export.snapshot_path {
        let exporter = SnapshotExporter::new(path, config.export.snapshot_format);
        if let Err(e) = exporter.write(snapshot) {
            error!("Failed to export snapshot to {:?}: {}", exporter.path(), e);
        }
    }
}
