use anyhow::Context;
use clap::Parser;
use lenbench::config::ConfigManager;
use lenbench::logging::{LogLevel, LoggingSystem};
use lenbench::report::{HostInfo, ReportFormat};
use lenbench::{BenchmarkDriver, BenchmarkPoint, SourceSequence};
use std::path::PathBuf;
use std::process::ExitCode;

/// Time an external RNA structure predictor on growing sequence prefixes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// FASTA file holding the source sequence (built-in 16S rRNA otherwise)
    #[arg(long)]
    fasta: Option<PathBuf>,

    /// Record identifier inside the FASTA file
    #[arg(long)]
    record: Option<String>,

    /// First sub-sequence length
    #[arg(long)]
    initial_step: Option<usize>,

    /// Increment between sub-sequence lengths
    #[arg(long)]
    stride: Option<usize>,

    /// Executable to benchmark
    #[arg(long)]
    executable: Option<String>,

    /// Module directory passed to the tool with -d
    #[arg(long)]
    module_dir: Option<PathBuf>,

    /// Staging FASTA file handed to the tool with -s
    #[arg(long)]
    staging_path: Option<PathBuf>,

    /// Record name written into the staged header
    #[arg(long)]
    record_name: Option<String>,

    /// Kill the tool after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Extra argument appended to the tool command line (repeatable)
    #[arg(long = "extra-arg", allow_hyphen_values = true)]
    extra_args: Vec<String>,

    /// Do not pass -v to the tool
    #[arg(long)]
    no_tool_verbose: bool,

    /// Write a structured report here after a successful run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Report format: tsv, json or yaml
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Flag points whose tool output contains this text
    #[arg(long)]
    quit_marker: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// JSON logs on stderr
    #[arg(long)]
    json_logs: bool,

    /// Also write daily-rolling JSON logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn build_config(args: &Args) -> anyhow::Result<ConfigManager> {
    let mut manager = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigManager::new(),
    };
    manager.load_from_env()?;

    let config = manager.config_mut();
    if let Some(fasta) = &args.fasta {
        config.sequence.fasta = Some(fasta.clone());
    }
    if let Some(record) = &args.record {
        config.sequence.record = Some(record.clone());
    }
    if let Some(step) = args.initial_step {
        config.sequence.initial_step = step;
    }
    if let Some(stride) = args.stride {
        config.sequence.stride = stride;
    }
    if let Some(executable) = &args.executable {
        config.tool.executable = executable.clone();
    }
    if let Some(module_dir) = &args.module_dir {
        config.tool.module_dir = module_dir.clone();
    }
    if let Some(staging) = &args.staging_path {
        config.staging.path = staging.clone();
    }
    if let Some(name) = &args.record_name {
        config.staging.record_name = name.clone();
    }
    if let Some(timeout) = args.timeout_secs {
        config.tool.timeout_secs = Some(timeout);
    }
    if !args.extra_args.is_empty() {
        config.tool.extra_args = args.extra_args.clone();
    }
    if args.no_tool_verbose {
        config.tool.verbose = false;
    }
    if let Some(report) = &args.report {
        config.report.path = Some(report.clone());
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if let Some(marker) = &args.quit_marker {
        config.quit_marker = Some(marker.clone());
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(log_dir) = &args.log_dir {
        config.logging.log_dir = Some(log_dir.clone());
    }

    manager.validate()?;
    Ok(manager)
}

fn print_point(point: &BenchmarkPoint) {
    let elapsed = point.elapsed.map(|d| d.as_secs_f64()).unwrap_or_default();
    let bytes = point.output_bytes.unwrap_or_default();
    let marker = if point.quit_marker_seen { " quit_marker" } else { "" };
    println!(
        "length={} output_bytes={} elapsed={:.3}s{}",
        point.length, bytes, elapsed, marker
    );
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args)?.into_config();

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let _logging = LoggingSystem::init(config.logging.clone())?;

    let source = SourceSequence::load(
        config.sequence.fasta.as_deref(),
        config.sequence.record.as_deref(),
    )
    .context("loading source sequence")?;

    let mut driver = BenchmarkDriver::from_config(&config, source)?;
    let report = driver.run_with(print_point)?;

    println!(
        "completed {} points, total tool time {:.3}s",
        report.points.len(),
        report.total_tool_time().as_secs_f64()
    );

    if let Some(path) = &config.report.path {
        report
            .with_host(HostInfo::collect())
            .write(path, config.report.format)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
