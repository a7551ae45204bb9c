//! Summaries of audit runs for CI artifacts and dashboards.
//!
//! A summary records when a run happened, how many units were audited and
//! how many ended up in each severity. Severities are kept as their report
//! labels so the summary format does not depend on the auditor's types.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Overall outcome of an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// No unit has a build error.
    Pass,
    /// At least one unit has a build error.
    Fail,
}

/// Summary of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Which report produced the summary (`status`, `todo`, ...).
    pub run_name: String,

    /// When the run finished (RFC 3339, UTC).
    pub timestamp: String,

    /// Host the installation is published on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Overall outcome.
    pub result: RunResult,

    /// Units audited.
    pub units: usize,

    /// Units per severity label.
    pub severities: BTreeMap<String, usize>,

    /// Message of the installation-wide checks, when they failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_error: Option<String>,

    /// Wall-clock duration of the run.
    pub duration_seconds: f64,
}

/// Builder for [`AuditSummary`].
pub struct AuditSummaryBuilder {
    summary: AuditSummary,
    failing_label: String,
}

impl AuditSummaryBuilder {
    /// Start a summary for `run_name`, stamped now.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self::at(run_name, Utc::now())
    }

    /// Start a summary stamped at `timestamp`.
    pub fn at(run_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            summary: AuditSummary {
                run_name: run_name.into(),
                timestamp: timestamp.to_rfc3339(),
                host: None,
                result: RunResult::Pass,
                units: 0,
                severities: BTreeMap::new(),
                global_error: None,
                duration_seconds: 0.0,
            },
            failing_label: "red".to_string(),
        }
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.summary.host = Some(host.into());
        self
    }

    /// Count one unit with the given severity label.
    pub fn unit(mut self, severity: &str) -> Self {
        self.record(severity);
        self
    }

    /// Count every unit of an iterator of severity labels.
    pub fn units<'a>(mut self, severities: impl IntoIterator<Item = &'a str>) -> Self {
        for severity in severities {
            self.record(severity);
        }
        self
    }

    /// Record a failed installation-wide check.
    pub fn global_error(mut self, message: impl Into<String>) -> Self {
        self.summary.global_error = Some(message.into());
        self.summary.result = RunResult::Fail;
        self
    }

    /// Set the run duration.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.summary.duration_seconds = seconds;
        self
    }

    /// Build the summary.
    pub fn build(self) -> AuditSummary {
        self.summary
    }

    fn record(&mut self, severity: &str) {
        self.summary.units += 1;
        *self
            .summary
            .severities
            .entry(severity.to_string())
            .or_default() += 1;
        if severity == self.failing_label {
            self.summary.result = RunResult::Fail;
        }
    }
}

/// Sink for writing summaries to JSON files.
pub struct SummarySink {
    path: PathBuf,
}

impl SummarySink {
    /// Create a sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Write a summary as pretty JSON.
    pub fn write(&self, summary: &AuditSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
