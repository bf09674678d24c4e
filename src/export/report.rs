// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Plain-text run report

use std::fmt::Write;

use crate::core::Snapshot;

const RULE_WIDTH: usize = 72;

/// Render a human-readable summary of a snapshot
pub fn render_report(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(40);

    // writeln! into a String cannot fail
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "VIGIL MONITORING REPORT");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "Taken: {}", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Ticks: {}", snapshot.tick);
    if let Some(reason) = &snapshot.stop_reason {
        let _ = writeln!(out, "Stopped: {}", reason);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "METRICS");
    let _ = writeln!(out, "{}", light);
    if snapshot.metrics.is_empty() {
        let _ = writeln!(out, "No metrics registered");
    }
    for (name, metric) in &snapshot.metrics {
        let summary = &metric.summary;
        if summary.count == 0 {
            let _ = writeln!(out, "{:<24} latest {:>10}", name, metric.display_value());
            continue;
        }
        let _ = writeln!(
            out,
            "{:<24} latest {:>10}  min {:>10.2}  max {:>10.2}  mean {:>10.2}  ({} samples)",
            name,
            metric.display_value(),
            summary.min,
            summary.max,
            summary.mean,
            summary.count
        );
        if metric.consecutive_failures > 0 {
            let _ = writeln!(out, "{:<24} {} failed polls in a row", "", metric.consecutive_failures);
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "ALERTS");
    let _ = writeln!(out, "{}", light);
    if snapshot.alerts.is_empty() {
        let _ = writeln!(out, "No alerts recorded");
    }
    for (i, alert) in snapshot.alerts.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{:?}] {} {}",
            i + 1,
            alert.severity,
            alert.triggered_at.format("%H:%M:%S"),
            alert.message
        );
    }

    out
}
