// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! File exporters for snapshots and alerts

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::ExportFormat;
use crate::alerting::{AlertEvent, AlertSink};
use crate::core::Snapshot;

/// Writes a whole snapshot to one file
pub struct SnapshotExporter {
    path: PathBuf,
    format: ExportFormat,
}

impl SnapshotExporter {
    /// A path without an extension gets the one matching `format`
    pub fn new(path: &Path, format: ExportFormat) -> Self {
        let path = match path.extension() {
            Some(_) => path.to_path_buf(),
            None => path.with_extension(format.extension()),
        };
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        create_parent(&self.path)?;
        let mut writer = BufWriter::new(File::create(&self.path)?);

        match self.format {
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, snapshot)?;
                writeln!(writer)?;
            }
            ExportFormat::Csv => {
                writeln!(writer, "metric,latest,min,max,mean,count")?;
                for (name, metric) in &snapshot.metrics {
                    let latest = metric
                        .latest
                        .as_ref()
                        .map(|s| s.value.to_string())
                        .unwrap_or_default();
                    let s = &metric.summary;
                    writeln!(
                        writer,
                        "{},{},{},{},{},{}",
                        csv_field(name),
                        csv_field(&latest),
                        s.min,
                        s.max,
                        s.mean,
                        s.count
                    )?;
                }
            }
        }

        writer.flush()?;
        info!("Exported snapshot to {:?}", self.path);
        Ok(())
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Alert sink appending one JSON object per line
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    pub fn open(path: &Path) -> Result<Self> {
        create_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow!("Failed to open alert log {:?}: {}", path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn append(&self, event: &AlertEvent) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, event)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl AlertSink for JsonLinesSink {
    fn deliver(&self, event: &AlertEvent) {
        if let Err(e) = self.append(event) {
            warn!("Failed to append alert to {:?}: {}", self.path, e);
        }
    }
}
