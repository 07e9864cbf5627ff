//! Typed benchmark results and their export
//!
//! Every benchmark point becomes a [`BenchmarkPoint`]; a completed run is a
//! [`BenchmarkReport`] that can be written as TSV, JSON or YAML.

use crate::error::{BenchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Supported report formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Tab-separated values with a `#` metadata header
    #[default]
    Tsv,
    /// JavaScript Object Notation
    Json,
    /// YAML
    Yaml,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Tsv => write!(f, "tsv"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(ReportFormat::Tsv),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(format!("unknown report format '{}' (tsv, json, yaml)", other)),
        }
    }
}

/// Whether the tool finished successfully at a point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PointStatus {
    Completed,
    Failed { reason: String },
}

/// One benchmark point: a sub-sequence length and what the tool did with it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkPoint {
    /// Zero-based position in the step series
    pub index: usize,
    /// Sub-sequence length handed to the tool
    pub length: usize,
    /// Wall-clock time of the invocation, absent if the tool never ran
    #[serde(with = "optional_seconds")]
    pub elapsed: Option<Duration>,
    /// Size of the captured stdout, absent if the tool never ran
    pub output_bytes: Option<usize>,
    /// The configured quit marker appeared in stdout
    #[serde(default)]
    pub quit_marker_seen: bool,
    #[serde(flatten)]
    pub status: PointStatus,
}

impl BenchmarkPoint {
    pub fn is_completed(&self) -> bool {
        self.status == PointStatus::Completed
    }
}

/// Snapshot of the machine the benchmark ran on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostInfo {
    pub host_name: Option<String>,
    pub os: Option<String>,
    pub cpu_brand: Option<String>,
    pub cpu_count: usize,
    pub total_memory_bytes: u64,
}

impl HostInfo {
    pub fn collect() -> Self {
        use sysinfo::System;

        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            host_name: System::host_name(),
            os: System::long_os_version(),
            cpu_brand: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty()),
            cpu_count: sys.cpus().len(),
            total_memory_bytes: sys.total_memory(),
        }
    }
}

/// Results of a completed benchmark run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub executable: String,
    pub arguments: Vec<String>,
    pub source_name: String,
    pub source_length: usize,
    pub initial_step: usize,
    pub stride: usize,
    pub host: Option<HostInfo>,
    pub points: Vec<BenchmarkPoint>,
}

impl BenchmarkReport {
    /// Attach a host snapshot
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = Some(host);
        self
    }

    /// Sub-sequence lengths in visiting order
    pub fn lengths(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.length).collect()
    }

    /// Sum of all measured tool times
    pub fn total_tool_time(&self) -> Duration {
        self.points.iter().filter_map(|p| p.elapsed).sum()
    }

    /// Export in `format` to `path`, replacing any existing file
    pub fn write<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        match format {
            ReportFormat::Tsv => self.write_tsv(&mut writer)?,
            ReportFormat::Json => serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| BenchError::report(format!("JSON serialize error: {}", e)))?,
            ReportFormat::Yaml => serde_yaml::to_writer(&mut writer, self)
                .map_err(|e| BenchError::report(format!("YAML serialize error: {}", e)))?,
        }
        writer.flush()?;

        info!(
            path = %path.display(),
            format = %format,
            points = self.points.len(),
            "Benchmark report written"
        );
        Ok(())
    }

    /// TSV with a commented metadata header and one row per point
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# run_id: {}", self.run_id)?;
        writeln!(writer, "# started_at: {}", self.started_at.to_rfc3339())?;
        writeln!(writer, "# finished_at: {}", self.finished_at.to_rfc3339())?;
        writeln!(writer, "# command: {} {}", self.executable, self.arguments.join(" "))?;
        writeln!(
            writer,
            "# source: {} ({} nt), initial_step={}, stride={}",
            self.source_name, self.source_length, self.initial_step, self.stride
        )?;
        if let Some(host) = &self.host {
            writeln!(
                writer,
                "# host: {} / {} / {} x {}",
                host.host_name.as_deref().unwrap_or("unknown"),
                host.os.as_deref().unwrap_or("unknown"),
                host.cpu_count,
                host.cpu_brand.as_deref().unwrap_or("unknown cpu")
            )?;
        }
        writeln!(writer, "index\tlength\telapsed_ms\toutput_bytes\tquit_marker\tstatus")?;

        for point in &self.points {
            let elapsed = point
                .elapsed
                .map(|d| format!("{:.3}", d.as_secs_f64() * 1000.0))
                .unwrap_or_else(|| "NA".to_string());
            let bytes = point
                .output_bytes
                .map(|b| b.to_string())
                .unwrap_or_else(|| "NA".to_string());
            let status = match &point.status {
                PointStatus::Completed => "completed".to_string(),
                PointStatus::Failed { reason } => format!("failed: {}", reason.replace(['\t', '\n'], " ")),
            };
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                point.index, point.length, elapsed, bytes, point.quit_marker_seen, status
            )?;
        }
        Ok(())
    }
}

/// Serde helper: `Option<Duration>` as fractional seconds
mod optional_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
