//! Sequence-length scaling benchmark for an external RNA structure predictor.
//!
//! The driver feeds growing prefixes of a fixed RNA sequence to an external
//! executable through a FASTA staging file and records how long every call
//! takes.

pub mod config;
pub mod driver;
pub mod error;
pub mod invoke;
pub mod logging;
pub mod report;
pub mod schedule;
pub mod sequence;
pub mod staging;

pub use config::{BenchConfig, ConfigManager};
pub use driver::{BenchmarkDriver, DriverSettings};
pub use error::{BenchError, InvocationError, Result};
pub use invoke::{Invocation, ProcessRunner, ToolRunner};
pub use report::{BenchmarkPoint, BenchmarkReport, HostInfo, PointStatus, ReportFormat};
pub use schedule::StepSchedule;
pub use sequence::SourceSequence;
pub use staging::{FastaRecord, FileStager, Stager};
