// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Subprocess source - runs a program and reads its first output token

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use super::{MetricSource, Value};
use crate::error::SourceError;

/// Runs `program args..` on every poll
///
/// The first whitespace-separated token of stdout is parsed as a number; if it
/// is not numeric the whole trimmed output is returned as text. The child is
/// killed if the poll future is dropped (e.g. by the sampler's timeout).
pub struct CommandSource {
    metric: String,
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(metric: &str, program: &str, args: &[String]) -> Self {
        Self {
            metric: metric.to_string(),
            program: program.to_string(),
            args: args.to_vec(),
        }
    }
}

pub(crate) fn parse_output(metric: &str, stdout: &str) -> Result<Value, SourceError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(SourceError::Parse {
            metric: metric.to_string(),
            output: "<empty>".to_string(),
        });
    }

    match trimmed.split_whitespace().next().map(str::parse::<f64>) {
        Some(Ok(v)) if v.is_finite() => Ok(Value::Number(v)),
        _ => Ok(Value::Text(trimmed.to_string())),
    }
}

#[async_trait]
impl MetricSource for CommandSource {
    fn metric(&self) -> &str { &self.metric }
    fn kind(&self) -> &'static str { "command" }

    async fn poll(&mut self) -> Result<Value, SourceError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SourceError::unavailable(&self.metric, format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(SourceError::unavailable(
                &self.metric,
                format!("{} exited with {}", self.program, output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("{} -> {:?}", self.program, stdout);
        parse_output(&self.metric, &stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_output() {
        assert_eq!(parse_output("ping", "12.5 ms\n").unwrap(), Value::Number(12.5));
        assert_eq!(
            parse_output("link", "  eth0 down ").unwrap(),
            Value::Text("eth0 down".to_string())
        );
        assert!(matches!(
            parse_output("ping", "   \n"),
            Err(SourceError::Parse { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_program() {
        let mut source = CommandSource::new("answer", "sh", &["-c".into(), "echo 42".into()]);
        assert_eq!(source.poll().await.unwrap(), Value::Number(42.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_unavailable() {
        let mut source = CommandSource::new("answer", "sh", &["-c".into(), "exit 3".into()]);
        assert!(matches!(
            source.poll().await,
            Err(SourceError::Unavailable { .. })
        ));

        let mut missing = CommandSource::new("answer", "definitely-not-a-real-binary-vigil", &[]);
        assert!(missing.poll().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_program_can_be_timed_out() {
        let mut source = CommandSource::new("slow", "sleep", &["5".into()]);
        let result = tokio::time::timeout(Duration::from_millis(100), source.poll()).await;
        assert!(result.is_err());
    }
}
