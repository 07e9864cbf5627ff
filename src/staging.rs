//! FASTA record formatting and the reused staging file
//!
//! The staging file is the only channel to the external tool: each benchmark
//! point truncates and rewrites it before the tool is started, and nothing
//! removes it afterwards.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default staging path, relative to the working directory
pub const DEFAULT_STAGING_PATH: &str = "./ZDFS33.fa";

/// Default record name embedded in the header
pub const DEFAULT_RECORD_NAME: &str = "ZDFS33";

/// A single-record FASTA document: `>header` then one line of residues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    header: String,
    sequence: String,
}

impl FastaRecord {
    /// Record for the prefix `0..length` of a source, header `>NAME : 0-LENGTH`
    pub fn for_prefix(name: &str, prefix: &str) -> Self {
        Self {
            header: format!("{} : 0-{}", name, prefix.chars().count()),
            sequence: prefix.to_string(),
        }
    }

    /// Header text without the leading `>`
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Write the record; the sequence is not wrapped
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, ">{}", self.header)?;
        writeln!(writer, "{}", self.sequence)
    }
}

impl fmt::Display for FastaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">{}", self.header)?;
        writeln!(f, "{}", self.sequence)
    }
}

/// Places a record where the external tool will read it
pub trait Stager {
    /// Replace any previous content with `record`
    fn stage(&mut self, record: &FastaRecord) -> io::Result<()>;

    /// Path handed to the external tool
    fn path(&self) -> &Path;
}

/// Stager backed by a single file that is overwritten on every call
#[derive(Debug, Clone)]
pub struct FileStager {
    path: PathBuf,
}

impl FileStager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileStager {
    fn default() -> Self {
        Self::new(DEFAULT_STAGING_PATH)
    }
}

impl Stager for FileStager {
    fn stage(&mut self, record: &FastaRecord) -> io::Result<()> {
        // File::create truncates, so a shorter record never keeps stale bytes
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        record.write_to(&mut writer)?;
        writer.flush()?;
        trace!(path = %self.path.display(), bytes = record.sequence().len(), "Staged record");
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
