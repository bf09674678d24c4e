// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Export module - text report, snapshot files and the alert log

mod report;
mod writer;

pub use report::render_report;
pub use writer::{JsonLinesSink, SnapshotExporter};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Export configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Text report written when the sampler stops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    /// Final snapshot written when the sampler stops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    pub snapshot_format: ExportFormat,

    /// Every alert appended as one JSON line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_log: Option<PathBuf>,
}

/// Export format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}
