//! Configuration management for the length benchmark
//!
//! Provides configuration loading, validation, and saving with support for
//! TOML/YAML/JSON files and `LENBENCH_*` environment overrides. Every tool
//! path lives here instead of in process-wide constants.

use crate::error::{BenchError, Result};
use crate::logging::{LogLevel, LoggingConfig};
use crate::report::ReportFormat;
use crate::schedule::{DEFAULT_INITIAL_STEP, DEFAULT_STRIDE};
use crate::staging::{DEFAULT_RECORD_NAME, DEFAULT_STAGING_PATH};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BenchConfig {
    /// Text whose presence in the tool's stdout flags a point
    #[validate(length(min = 1))]
    pub quit_marker: Option<String>,

    /// Source sequence and step series
    #[validate(nested)]
    pub sequence: SequenceSettings,

    /// Benchmarked executable
    #[validate(nested)]
    pub tool: ToolSettings,

    /// Staging file
    #[validate(nested)]
    pub staging: StagingSettings,

    /// Structured report export
    pub report: ReportSettings,

    /// Comparison tools; declared for reference, never invoked
    pub auxiliary: AuxiliaryTools,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Source sequence and step series settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SequenceSettings {
    /// FASTA file to read the source from (built-in sequence when absent)
    pub fasta: Option<PathBuf>,

    /// Record identifier inside `fasta` (first record when absent)
    pub record: Option<String>,

    /// First sub-sequence length
    #[validate(range(min = 1))]
    pub initial_step: usize,

    /// Increment between sub-sequence lengths
    #[validate(range(min = 1))]
    pub stride: usize,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            fasta: None,
            record: None,
            initial_step: DEFAULT_INITIAL_STEP,
            stride: DEFAULT_STRIDE,
        }
    }
}

/// Benchmarked executable and its fixed arguments
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ToolSettings {
    /// Path to the executable
    #[validate(length(min = 1))]
    pub executable: String,

    /// Module/data directory passed with `-d`
    pub module_dir: PathBuf,

    /// Pass `-v` to the tool
    pub verbose: bool,

    /// Appended after the standard arguments
    pub extra_args: Vec<String>,

    /// Kill the tool after this many seconds (no limit when absent)
    #[validate(range(min = 1))]
    pub timeout_secs: Option<u64>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            executable: "./bin/biorseo".to_string(),
            module_dir: PathBuf::from("./data/modules/DESC"),
            verbose: true,
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl ToolSettings {
    /// Argument vector: `-d MODULE_DIR -s STAGING [-v] EXTRA...`
    pub fn arguments(&self, staging_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            self.module_dir.display().to_string(),
            "-s".to_string(),
            staging_path.display().to_string(),
        ];
        if self.verbose {
            args.push("-v".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Staging file settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StagingSettings {
    /// Reused input file for the tool
    pub path: PathBuf,

    /// Record name written into every header
    #[validate(length(min = 1))]
    pub record_name: String,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STAGING_PATH),
            record_name: DEFAULT_RECORD_NAME.to_string(),
        }
    }
}

/// Report export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Where to write the report (no report when absent)
    pub path: Option<PathBuf>,
    pub format: ReportFormat,
}

/// Paths of comparison tools that sit next to the benchmarked one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuxiliaryTools {
    pub jar3d: PathBuf,
    pub bayespairing: PathBuf,
    pub bayespairing2: PathBuf,
    pub rnamoip: PathBuf,
    pub biokop: PathBuf,
}

impl Default for AuxiliaryTools {
    fn default() -> Self {
        Self {
            jar3d: PathBuf::from("/opt/jar3d_2014-12-11.jar"),
            bayespairing: PathBuf::from("/opt/BayesPairing/bayespairing/src"),
            bayespairing2: PathBuf::from("/opt/rnabayespairing2.git/bayespairing/src"),
            rnamoip: PathBuf::from("/opt/RNAMoIP/Src/RNAMoIP.py"),
            biokop: PathBuf::from("/opt/biokop"),
        }
    }
}

/// Configuration manager: file, environment, validation
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: BenchConfig,
}

impl ConfigManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing configuration, validating it first
    pub fn from_config(config: BenchConfig) -> Result<Self> {
        validate(&config, "Configuration validation failed")?;
        Ok(Self { config })
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: BenchConfig = match extension(path) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| BenchError::config(format!("TOML parse error: {}", e)))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| BenchError::config(format!("YAML parse error: {}", e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| BenchError::config(format!("JSON parse error: {}", e)))?,
            _ => return Err(unsupported_format()),
        };

        Self::from_config(config)
    }

    /// Apply `LENBENCH_*` environment overrides to the current config
    pub fn load_from_env(&mut self) -> Result<()> {
        if let Ok(executable) = env::var("LENBENCH_EXECUTABLE") {
            self.config.tool.executable = executable;
        }

        if let Ok(module_dir) = env::var("LENBENCH_MODULE_DIR") {
            self.config.tool.module_dir = PathBuf::from(module_dir);
        }

        if let Ok(staging) = env::var("LENBENCH_STAGING_PATH") {
            self.config.staging.path = PathBuf::from(staging);
        }

        if let Ok(step) = env::var("LENBENCH_INITIAL_STEP") {
            self.config.sequence.initial_step = step
                .parse()
                .map_err(|e| BenchError::config(format!("Invalid LENBENCH_INITIAL_STEP: {}", e)))?;
        }

        if let Ok(stride) = env::var("LENBENCH_STRIDE") {
            self.config.sequence.stride = stride
                .parse()
                .map_err(|e| BenchError::config(format!("Invalid LENBENCH_STRIDE: {}", e)))?;
        }

        if let Ok(timeout) = env::var("LENBENCH_TIMEOUT_SECS") {
            self.config.tool.timeout_secs = Some(
                timeout
                    .parse()
                    .map_err(|e| BenchError::config(format!("Invalid LENBENCH_TIMEOUT_SECS: {}", e)))?,
            );
        }

        if let Ok(log_level) = env::var("LENBENCH_LOG_LEVEL") {
            self.config.logging.level = log_level.parse::<LogLevel>().map_err(BenchError::config)?;
        }

        if let Ok(json_logs) = env::var("LENBENCH_JSON_LOGS") {
            self.config.logging.json_format = json_logs
                .parse()
                .map_err(|e| BenchError::config(format!("Invalid LENBENCH_JSON_LOGS: {}", e)))?;
        }

        validate(
            &self.config,
            "Configuration validation failed after env override",
        )
    }

    /// Re-validate after direct edits through [`ConfigManager::config_mut`]
    pub fn validate(&self) -> Result<()> {
        validate(&self.config, "Configuration validation failed")
    }

    /// Get current configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Get mutable configuration
    pub fn config_mut(&mut self) -> &mut BenchConfig {
        &mut self.config
    }

    pub fn into_config(self) -> BenchConfig {
        self.config
    }

    /// Save current configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match extension(path) {
            Some("toml") => toml::to_string_pretty(&self.config)
                .map_err(|e| BenchError::config(format!("TOML serialize error: {}", e)))?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(&self.config)
                .map_err(|e| BenchError::config(format!("YAML serialize error: {}", e)))?,
            Some("json") => serde_json::to_string_pretty(&self.config)
                .map_err(|e| BenchError::config(format!("JSON serialize error: {}", e)))?,
            _ => return Err(unsupported_format()),
        };

        std::fs::write(path, content).map_err(|e| {
            BenchError::config(format!("Failed to write config file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn unsupported_format() -> BenchError {
    BenchError::config("Unsupported config file format. Use .toml, .yaml, .yml, or .json")
}

fn validate(config: &BenchConfig, context: &str) -> Result<()> {
    config
        .validate()
        .map_err(|e| BenchError::config(format!("{}: {}", context, e)))
}
