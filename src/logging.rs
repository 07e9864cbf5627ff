//! Structured logging setup
//!
//! Console logs go to stderr so that stdout carries only the per-point
//! benchmark lines. An optional log directory receives a daily-rolling JSON
//! log as well.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self as tracing_fmt, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level, used when `RUST_LOG` is not set
    pub level: LogLevel,
    /// Structured JSON output on the console
    pub json_format: bool,
    /// File name prefix for the rolling log
    pub log_file_pattern: String,
    /// Log file directory (None for console only)
    pub log_dir: Option<PathBuf>,
    /// Module-specific log levels
    pub module_levels: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json_format: false,
            log_file_pattern: "lenbench.log".to_string(),
            log_dir: None,
            module_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Filter from `RUST_LOG` if present, else from the configured levels
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()));

        for (module, level) in &self.module_levels {
            let directive = format!("{}={}", module, level)
                .parse()
                .map_err(|e| BenchError::config(format!("Invalid log directive for {}: {}", module, e)))?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

/// Installed logging; keep it alive for the whole run so buffered lines flush
pub struct LoggingSystem {
    config: LoggingConfig,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber
    pub fn init(config: LoggingConfig) -> Result<Self> {
        let mut guards = Vec::new();
        let env_filter = config.env_filter()?;

        let (console_writer, console_guard) = tracing_appender::non_blocking(std::io::stderr());
        guards.push(console_guard);

        let console_layer = if config.json_format {
            tracing_fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(console_writer)
                .boxed()
        } else {
            tracing_fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_target(true)
                .with_writer(console_writer)
                .boxed()
        };

        let file_layer = match &config.log_dir {
            Some(log_dir) => {
                fs::create_dir_all(log_dir)?;
                let appender = tracing_appender::rolling::daily(log_dir, &config.log_file_pattern);
                let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
                guards.push(file_guard);
                Some(
                    tracing_fmt::layer()
                        .json()
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .with_writer(file_writer),
                )
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| BenchError::config(format!("Failed to initialize logging: {}", e)))?;

        info!(config = ?config, "Logging initialized");

        Ok(Self {
            config,
            _guards: guards,
        })
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}
