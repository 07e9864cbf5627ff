//! ProcessRunner against real child processes (Unix shells only)
#![cfg(unix)]

use lenbench::config::ToolSettings;
use lenbench::{
    BenchError, BenchmarkDriver, DriverSettings, FastaRecord, FileStager, InvocationError,
    ProcessRunner, SourceSequence, Stager, ToolRunner,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}

#[test]
fn test_captures_stdout_and_exit_code() {
    let mut runner = ProcessRunner::new("/bin/sh");
    let invocation = runner.run(&sh("printf '((..))'")).unwrap();
    assert!(invocation.success());
    assert_eq!(invocation.stdout, b"((..))");
    assert!(invocation.elapsed > Duration::ZERO);
}

#[test]
fn test_non_zero_exit_is_returned() {
    let mut runner = ProcessRunner::new("/bin/sh");
    let invocation = runner.run(&sh("echo oops >&2; exit 3")).unwrap();
    assert!(!invocation.success());
    assert_eq!(invocation.exit_code, Some(3));
    assert_eq!(invocation.stderr_excerpt(100), "oops");
}

#[test]
fn test_missing_executable() {
    let mut runner = ProcessRunner::new("/nonexistent/bin/biorseo");
    let err = runner.run(&[]).unwrap_err();
    match err {
        InvocationError::NotFound { executable } => assert_eq!(executable, "/nonexistent/bin/biorseo"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_timeout_kills_child() {
    let mut runner = ProcessRunner::new("/bin/sh").with_timeout(Some(Duration::from_millis(200)));
    let start = Instant::now();
    let err = runner.run(&sh("exec sleep 10")).unwrap_err();
    assert!(matches!(err, InvocationError::Timeout { .. }));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_timeout_covers_background_child_holding_stdout() {
    let mut runner = ProcessRunner::new("/bin/sh").with_timeout(Some(Duration::from_millis(500)));
    let start = Instant::now();
    let err = runner.run(&sh("sleep 4 & echo hi")).unwrap_err();
    assert!(matches!(err, InvocationError::Timeout { .. }), "unexpected {err:?}");
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_timeout_does_not_inflate_elapsed() {
    let fastest = |runner: &mut ProcessRunner| {
        (0..20)
            .map(|_| runner.run(&sh("true")).unwrap().elapsed)
            .min()
            .unwrap()
    };
    let untimed = fastest(&mut ProcessRunner::new("/bin/sh"));
    let timed = fastest(&mut ProcessRunner::new("/bin/sh").with_timeout(Some(Duration::from_secs(30))));
    assert!(
        timed <= untimed + Duration::from_millis(2),
        "timed {timed:?} vs untimed {untimed:?}"
    );
}

#[test]
fn test_timeout_not_hit_by_fast_child() {
    let mut runner = ProcessRunner::new("/bin/sh").with_timeout(Some(Duration::from_secs(30)));
    let invocation = runner.run(&sh("printf 'abc'; printf 'err' >&2")).unwrap();
    assert!(invocation.success());
    assert_eq!(invocation.stdout, b"abc");
    assert_eq!(invocation.stderr, b"err");
}

#[test]
fn test_driver_with_shell_tool_reads_staging_file() {
    let dir = TempDir::new().unwrap();
    let source = SourceSequence::new("shell", "ACGU".repeat(40)).unwrap();
    let stager = FileStager::new(dir.path().join("stage.fa"));
    let settings = DriverSettings {
        // $0 is the staging path
        arguments: vec![
            "-c".to_string(),
            "cat \"$0\"".to_string(),
            stager.path().display().to_string(),
        ],
        ..Default::default()
    };
    let mut driver =
        BenchmarkDriver::new(source.clone(), settings, stager, ProcessRunner::new("/bin/sh")).unwrap();

    let report = driver.run().unwrap();
    assert_eq!(report.lengths(), vec![100, 150, 160]);
    for point in &report.points {
        let expected = FastaRecord::for_prefix("ZDFS33", source.prefix(point.length)).to_string();
        assert_eq!(point.output_bytes, Some(expected.len()));
    }
}

#[test]
fn test_driver_with_failing_shell_tool() {
    let dir = TempDir::new().unwrap();
    let stager = FileStager::new(dir.path().join("stage.fa"));
    let settings = DriverSettings {
        arguments: sh("echo 'cannot open module dir' >&2; exit 1"),
        ..Default::default()
    };
    let mut driver = BenchmarkDriver::new(
        SourceSequence::builtin(),
        settings,
        stager,
        ProcessRunner::new("/bin/sh"),
    )
    .unwrap();

    let err = driver.run().unwrap_err();
    assert!(matches!(err, BenchError::ToolFailed { length: 100, code: Some(1), .. }));
    assert!(err.to_string().contains("cannot open module dir"));
}

#[test]
fn test_default_tool_arguments_reach_child() {
    let dir = TempDir::new().unwrap();
    let staging = dir.path().join("stage.fa");
    let mut args = sh("printf '%s|' \"$@\"");
    args.push("biorseo".to_string());
    args.extend(ToolSettings::default().arguments(&staging));

    let mut runner = ProcessRunner::new("/bin/sh");
    let invocation = runner.run(&args).unwrap();
    let echoed = String::from_utf8(invocation.stdout).unwrap();
    assert_eq!(
        echoed,
        format!("-d|./data/modules/DESC|-s|{}|-v|", staging.display())
    );
}
