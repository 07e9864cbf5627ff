//! Benchmark driver loop
//!
//! For every length in the step series the driver stages a FASTA record,
//! runs the tool once against it, and records a [`BenchmarkPoint`]. Points
//! run strictly one after another and the first failure ends the run.

use crate::config::BenchConfig;
use crate::error::{BenchError, InvocationError, Result};
use crate::invoke::{ProcessRunner, ToolRunner};
use crate::report::{BenchmarkPoint, BenchmarkReport, PointStatus};
use crate::schedule::StepSchedule;
use crate::sequence::SourceSequence;
use crate::staging::{DEFAULT_RECORD_NAME, FastaRecord, FileStager, Stager};
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// Characters of stderr kept in a failure message
const STDERR_EXCERPT_CHARS: usize = 2000;

/// Everything the loop needs besides the source, stager and runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub initial_step: usize,
    pub stride: usize,
    /// Name embedded in every staged header
    pub record_name: String,
    /// Full argument vector for the tool, staging path included
    pub arguments: Vec<String>,
    /// Flag points whose stdout contains this text
    pub quit_marker: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            initial_step: crate::schedule::DEFAULT_INITIAL_STEP,
            stride: crate::schedule::DEFAULT_STRIDE,
            record_name: DEFAULT_RECORD_NAME.to_string(),
            arguments: Vec::new(),
            quit_marker: None,
        }
    }
}

/// Drives one benchmark series against a single tool
pub struct BenchmarkDriver<S: Stager, R: ToolRunner> {
    source: SourceSequence,
    schedule: StepSchedule,
    settings: DriverSettings,
    stager: S,
    runner: R,
    points: Vec<BenchmarkPoint>,
}

impl BenchmarkDriver<FileStager, ProcessRunner> {
    /// Driver with a real staging file and child process, as configured
    pub fn from_config(config: &BenchConfig, source: SourceSequence) -> Result<Self> {
        let stager = FileStager::new(&config.staging.path);
        let runner = ProcessRunner::new(config.tool.executable.clone())
            .with_timeout(config.tool.timeout());
        let settings = DriverSettings {
            initial_step: config.sequence.initial_step,
            stride: config.sequence.stride,
            record_name: config.staging.record_name.clone(),
            arguments: config.tool.arguments(stager.path()),
            quit_marker: config.quit_marker.clone(),
        };
        Self::new(source, settings, stager, runner)
    }
}

impl<S: Stager, R: ToolRunner> BenchmarkDriver<S, R> {
    pub fn new(source: SourceSequence, settings: DriverSettings, stager: S, runner: R) -> Result<Self> {
        let schedule = StepSchedule::new(settings.initial_step, settings.stride, source.len())?;
        Ok(Self {
            source,
            schedule,
            settings,
            stager,
            runner,
            points: Vec::new(),
        })
    }

    pub fn schedule(&self) -> &StepSchedule {
        &self.schedule
    }

    pub fn source(&self) -> &SourceSequence {
        &self.source
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn stager(&self) -> &S {
        &self.stager
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Points recorded by the last run, including the failed one if it failed
    pub fn points(&self) -> &[BenchmarkPoint] {
        &self.points
    }

    /// Run the whole series
    pub fn run(&mut self) -> Result<BenchmarkReport> {
        self.run_with(|_| {})
    }

    /// Run the whole series, calling `on_point` after every completed point
    pub fn run_with<F>(&mut self, mut on_point: F) -> Result<BenchmarkReport>
    where
        F: FnMut(&BenchmarkPoint),
    {
        self.points.clear();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            executable = self.runner.executable(),
            source = self.source.name(),
            source_length = self.source.len(),
            initial_step = self.schedule.initial_step(),
            stride = self.schedule.stride(),
            points = self.schedule.point_count(),
            "Starting benchmark series"
        );

        for (index, length) in self.schedule.lengths().enumerate() {
            let _span = info_span!("point", index, length).entered();
            match self.run_point(index, length) {
                Ok(point) => {
                    on_point(&point);
                    self.points.push(point);
                }
                Err(err) => {
                    error!(run_id = %run_id, length, error = %err.detailed(), "Benchmark aborted");
                    return Err(err);
                }
            }
        }

        let report = BenchmarkReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            executable: self.runner.executable().to_string(),
            arguments: self.settings.arguments.clone(),
            source_name: self.source.name().to_string(),
            source_length: self.source.len(),
            initial_step: self.schedule.initial_step(),
            stride: self.schedule.stride(),
            host: None,
            points: self.points.clone(),
        };

        info!(
            run_id = %run_id,
            points = report.points.len(),
            total_tool_time = ?report.total_tool_time(),
            "Benchmark series completed"
        );
        Ok(report)
    }

    fn run_point(&mut self, index: usize, length: usize) -> Result<BenchmarkPoint> {
        let record = FastaRecord::for_prefix(&self.settings.record_name, self.source.prefix(length));
        if let Err(source) = self.stager.stage(&record) {
            let err = BenchError::StagingWrite {
                length,
                path: self.stager.path().to_path_buf(),
                source,
            };
            return Err(self.record_failure(index, length, None, None, err));
        }

        let invocation = match self.runner.run(&self.settings.arguments) {
            Ok(invocation) => invocation,
            Err(source) => {
                let elapsed = match &source {
                    InvocationError::Timeout { timeout, .. } => Some(*timeout),
                    _ => None,
                };
                let err = BenchError::Invocation { length, source };
                return Err(self.record_failure(index, length, elapsed, None, err));
            }
        };

        let output_bytes = invocation.stdout.len();
        if !invocation.success() {
            let err = BenchError::ToolFailed {
                length,
                executable: self.runner.executable().to_string(),
                code: invocation.exit_code,
                stderr: invocation.stderr_excerpt(STDERR_EXCERPT_CHARS),
            };
            return Err(self.record_failure(
                index,
                length,
                Some(invocation.elapsed),
                Some(output_bytes),
                err,
            ));
        }

        let quit_marker_seen = self
            .settings
            .quit_marker
            .as_deref()
            .is_some_and(|marker| contains(&invocation.stdout, marker.as_bytes()));
        if quit_marker_seen {
            warn!(length, "Tool output contains the quit marker");
        }

        info!(
            output_bytes,
            elapsed_ms = invocation.elapsed.as_secs_f64() * 1000.0,
            "Benchmark point completed"
        );

        Ok(BenchmarkPoint {
            index,
            length,
            elapsed: Some(invocation.elapsed),
            output_bytes: Some(output_bytes),
            quit_marker_seen,
            status: PointStatus::Completed,
        })
    }

    fn record_failure(
        &mut self,
        index: usize,
        length: usize,
        elapsed: Option<Duration>,
        output_bytes: Option<usize>,
        err: BenchError,
    ) -> BenchError {
        self.points.push(BenchmarkPoint {
            index,
            length,
            elapsed,
            output_bytes,
            quit_marker_seen: false,
            status: PointStatus::Failed {
                reason: err.detailed(),
            },
        });
        err
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::Invocation;
    use std::io;
    use std::path::{Path, PathBuf};

    /// Keeps staged records in memory
    #[derive(Default)]
    struct MemoryStager {
        staged: Vec<FastaRecord>,
        fail_at_length: Option<usize>,
        path: PathBuf,
    }

    impl Stager for MemoryStager {
        fn stage(&mut self, record: &FastaRecord) -> io::Result<()> {
            if self.fail_at_length == Some(record.sequence().len()) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.staged.push(record.clone());
            Ok(())
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    /// Echoes a fixed payload and counts calls
    struct EchoRunner {
        stdout: Vec<u8>,
        calls: usize,
    }

    impl ToolRunner for EchoRunner {
        fn executable(&self) -> &str {
            "echo-tool"
        }

        fn run(&mut self, _args: &[String]) -> std::result::Result<Invocation, InvocationError> {
            self.calls += 1;
            Ok(Invocation {
                exit_code: Some(0),
                stdout: self.stdout.clone(),
                stderr: Vec::new(),
                elapsed: Duration::from_millis(self.calls as u64),
            })
        }
    }

    fn source(len: usize) -> SourceSequence {
        let residues: String = "ACGU".chars().cycle().take(len).collect();
        SourceSequence::new("test", residues).unwrap()
    }

    #[test]
    fn test_points_follow_schedule() {
        let runner = EchoRunner {
            stdout: b"((..))".to_vec(),
            calls: 0,
        };
        let mut driver =
            BenchmarkDriver::new(source(320), DriverSettings::default(), MemoryStager::default(), runner)
                .unwrap();

        let report = driver.run().unwrap();
        assert_eq!(report.lengths(), vec![100, 150, 200, 250, 300, 320]);
        assert_eq!(driver.runner().calls, 6);
        assert!(report.points.iter().all(|p| p.output_bytes == Some(6) && p.is_completed()));
        assert_eq!(report.points[2].elapsed, Some(Duration::from_millis(3)));

        let headers: Vec<&str> = driver.stager().staged.iter().map(|r| r.header()).collect();
        assert_eq!(headers[0], "ZDFS33 : 0-100");
        assert_eq!(headers[5], "ZDFS33 : 0-320");
    }

    #[test]
    fn test_staging_failure_skips_invocation() {
        let stager = MemoryStager {
            fail_at_length: Some(150),
            ..Default::default()
        };
        let runner = EchoRunner {
            stdout: Vec::new(),
            calls: 0,
        };
        let mut driver = BenchmarkDriver::new(source(320), DriverSettings::default(), stager, runner).unwrap();

        let err = driver.run().unwrap_err();
        assert!(matches!(err, BenchError::StagingWrite { length: 150, .. }));
        assert_eq!(driver.runner().calls, 1);
        assert_eq!(driver.points().len(), 2);
        assert!(!driver.points()[1].is_completed());
        assert_eq!(driver.points()[1].elapsed, None);
    }

    #[test]
    fn test_quit_marker_flags_point() {
        let runner = EchoRunner {
            stdout: b"...\nQuitting because combinatorial issues\n".to_vec(),
            calls: 0,
        };
        let settings = DriverSettings {
            quit_marker: Some("combinatorial issues".to_string()),
            ..Default::default()
        };
        let mut driver = BenchmarkDriver::new(source(40), settings, MemoryStager::default(), runner).unwrap();

        let report = driver.run().unwrap();
        assert_eq!(report.lengths(), vec![40]);
        assert!(report.points[0].quit_marker_seen);
        assert!(report.points[0].is_completed());
    }

    #[test]
    fn test_rejects_invalid_schedule() {
        let runner = EchoRunner {
            stdout: Vec::new(),
            calls: 0,
        };
        let settings = DriverSettings {
            stride: 0,
            ..Default::default()
        };
        let result = BenchmarkDriver::new(source(10), settings, MemoryStager::default(), runner);
        assert!(matches!(result, Err(BenchError::InvalidSchedule(_))));
    }

    #[test]
    fn test_contains() {
        assert!(contains(b"abcdef", b"cde"));
        assert!(!contains(b"abc", b"abcd"));
        assert!(!contains(b"abc", b""));
    }
}
