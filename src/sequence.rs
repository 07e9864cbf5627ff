//! Source sequence for the benchmark
//!
//! The source is fixed at startup and never mutated. Each benchmark point
//! reads a prefix of it.

use crate::error::{BenchError, Result};
use needletail::parse_fastx_file;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 16S ribosomal RNA used when no FASTA file is given (1522 nt)
pub const BUILTIN_SEQUENCE: &str = concat!(
    "UUUGUUGGAGAGUUUGAUCCUGGCUCAGGGUGAACGCUGGCGGCGUGCCUAAGACAUGCAAGUCGUGCGGGCCGCGGGGU",
    "UUUACUCCGUGGUCAGCGGCGGACGGGUGAGUAACGCGUGGGUGACCUACCCGGAAGAGGGGGACAACCCGGGGAAACUC",
    "GGGCUAAUCCCCCAUGUGGACCCGCCCCUUGGGGUGUGUCCAAAGGGCUUUGCCCGCUUCCGGAUGGGCCCGCGUCCCAU",
    "CAGCUAGUUGGUGGGGUAAUGGCCCACCAAGGCGACGACGGGUAGCCGGUCUGAGAGGAUGGCCGGCCACAGGGGCACUG",
    "AGACACGGGCCCCACUCCUACGGGAGGCAGCAGUUAGGAAUCUUCCGCAAUGGGCGCAAGCCUGACGGAGCGACGCCGCU",
    "UGGAGGAAGAAGCCCUUCGGGGUGUAAACUCCUGAACCCGGGACGAAACCCCCGACGAGGGGACUGACGGUACCGGGGUA",
    "AUAGCGCCGGCCAACUCCGUGCCAGCAGCCGCGGUAAUACGGAGGGCGCGAGCGUUACCCGGAUUCACUGGGCGUAAAGG",
    "GCGUGUAGGCGGCCUGGGGCGUCCCAUGUGAAAGACCACGGCUCAACCGUGGGGGAGCGUGGGAUACGCUCAGGCUAGAC",
    "GGUGGGAGAGGGUGGUGGAAUUCCCGGAGUAGCGGUGAAAUGCGCAGAUACCGGGAGGAACGCCGAUGGCGAAGGCAGCC",
    "ACCUGGUCCACCCGUGACGCUGAGGCGCGAAAGCGUGGGGAGCAAACCGGAUUAGAUACCCGGGUAGUCCACGCCCUAAA",
    "CGAUGCGCGCUAGGUCUCUGGGUCUCCUGGGGGCCGAAGCUAACGCGUUAAGCGCGCCGCCUGGGGAGUACGGCCGCAAG",
    "GCUGAAACUCAAAGGAAUUGACGGGGGCCCGCACAAGCGGUGGAGCAUGUGGUUUAAUUCGAAGCAACGCGAAGAACCUU",
    "ACCAGGCCUUGACAUGCUAGGGAACCCGGGUGAAAGCCUGGGGUGCCCCGCGAGGGGAGCCCUAGCACAGGUGCUGCAUG",
    "GCCGUCGUCAGCUCGUGCCGUGAGGUGUUGGGUUAAGUCCCGCAACGAGCGCAACCCCCGCCGUUAGUUGCCAGCGGUUC",
    "GGCCGGGCACUCUAACGGGACUGCCCGCGAAAGCGGGAGGAAGGAGGGGACGACGUCUGGUCAGCAUGGCCCUUACGGCC",
    "UGGGCGACACACGUGCUACAAUGCCCACUACAAAGCGAUGCCACCCGGCAACGGGGAGCUAAUCGCAAAAAGGUGGGCCC",
    "AGUUCGGAUUGGGGUCUGCAACCCGACCCCAUGAAGCCGGAAUCGCUAGUAAUCGCGGAUCAGCCAUGCCGCGGUGAAUA",
    "CGUUCCCGGGCCUUGUACACACCGCCCGUCACGCCAUGGGAGCGGGCUCUACCCGAAGUCGCCGGGAGCCUACGGGCAGG",
    "CGCCGAGGGUAGGGCCCGUGACUGGGGCGAAGUCGUAACAAGGUAGCUGUACCGGAAGGUGCGGCUGGAUCACCUCCUUU",
    "CU",
);

/// Immutable source sequence, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSequence {
    name: String,
    residues: Arc<str>,
    /// Length in residues (chars), equal to the byte length for ASCII input
    length: usize,
}

impl SourceSequence {
    /// Wrap an in-memory sequence; the residues are taken verbatim
    pub fn new(name: impl Into<String>, residues: impl Into<String>) -> Result<Self> {
        let residues: String = residues.into();
        if residues.is_empty() {
            return Err(BenchError::invalid_fasta(0, "source sequence is empty"));
        }
        Ok(Self {
            name: name.into(),
            length: residues.chars().count(),
            residues: Arc::from(residues),
        })
    }

    /// The built-in rRNA sequence
    pub fn builtin() -> Self {
        Self {
            name: "builtin-16S".to_string(),
            residues: Arc::from(BUILTIN_SEQUENCE),
            length: BUILTIN_SEQUENCE.len(),
        }
    }

    /// Built-in sequence, or a record from `fasta` when one is given
    pub fn load(fasta: Option<&Path>, record: Option<&str>) -> Result<Self> {
        match fasta {
            Some(path) => Self::from_fasta(path, record),
            None => {
                if let Some(record) = record {
                    return Err(BenchError::config(format!(
                        "record '{}' requested but no FASTA file given",
                        record
                    )));
                }
                Ok(Self::builtin())
            }
        }
    }

    /// Load one record from a FASTA file
    ///
    /// With `record = None` the first record is used, otherwise the first
    /// record whose identifier (text up to the first whitespace) matches.
    pub fn from_fasta<P: AsRef<Path>>(path: P, record: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = parse_fastx_file(path)?;

        let mut index = 0usize;
        while let Some(entry) = reader.next() {
            let entry = entry?;
            let raw_id = String::from_utf8_lossy(entry.id()).into_owned();
            let id = raw_id.split_whitespace().next().unwrap_or("").to_string();
            debug!(record = index, id = %id, "Scanning FASTA record");

            if record.is_none_or(|wanted| wanted == id) {
                let residues = String::from_utf8_lossy(&entry.seq()).into_owned();
                if residues.is_empty() {
                    return Err(BenchError::invalid_fasta(
                        index,
                        format!("record '{}' has no residues", id),
                    ));
                }
                let source = Self::new(id, residues)?;
                info!(
                    path = %path.display(),
                    record = %source.name,
                    length = source.len(),
                    "Loaded source sequence"
                );
                return Ok(source);
            }
            index += 1;
        }

        Err(match record {
            Some(wanted) => BenchError::invalid_fasta(
                index,
                format!("record '{}' not found in {}", wanted, path.display()),
            ),
            None => BenchError::invalid_fasta(0, "No sequences found in FASTA file"),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full sequence text
    pub fn as_str(&self) -> &str {
        &self.residues
    }

    /// Number of residues
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// First `min(length, L)` residues, cut on a char boundary
    pub fn prefix(&self, length: usize) -> &str {
        if self.length == self.residues.len() {
            return &self.residues[..length.min(self.length)];
        }
        match self.residues.char_indices().nth(length) {
            Some((end, _)) => &self.residues[..end],
            None => &self.residues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_fasta(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_builtin_sequence() {
        let source = SourceSequence::builtin();
        assert_eq!(source.len(), 1522);
        assert!(source.as_str().starts_with("UUUGUUGGAGAGUUUGAUCC"));
        assert!(source.as_str().ends_with("CACCUCCUUUCU"));
        assert!(source.as_str().bytes().all(|b| b"ACGU".contains(&b)));
    }

    #[test]
    fn test_prefix_is_capped() {
        let source = SourceSequence::new("s", "ACGUACGU").unwrap();
        assert_eq!(source.prefix(3), "ACG");
        assert_eq!(source.prefix(8), "ACGUACGU");
        assert_eq!(source.prefix(100), "ACGUACGU");
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(
            SourceSequence::new("empty", ""),
            Err(BenchError::InvalidFasta { .. })
        ));
    }

    #[test]
    fn test_residues_kept_verbatim() {
        // no alphabet validation, lowercase and N are kept as-is
        let file = create_test_fasta(">rna1 some description\nacguNNacgu\n");
        let source = SourceSequence::from_fasta(file.path(), None).unwrap();
        assert_eq!(source.name(), "rna1");
        assert_eq!(source.as_str(), "acguNNacgu");
    }

    #[test]
    fn test_non_ascii_residues_are_loaded_and_cut_on_chars() {
        let file = create_test_fasta(">odd\nACGUé∆ACGU\n");
        let source = SourceSequence::from_fasta(file.path(), None).unwrap();
        assert_eq!(source.len(), 10);
        assert_eq!(source.prefix(5), "ACGUé");
        assert_eq!(source.prefix(6), "ACGUé∆");
        assert_eq!(source.prefix(50), "ACGUé∆ACGU");
    }

    #[test]
    fn test_multiline_record_is_joined() {
        let file = create_test_fasta(">rna1\nACGU\nGGCC\n");
        let source = SourceSequence::from_fasta(file.path(), None).unwrap();
        assert_eq!(source.as_str(), "ACGUGGCC");
    }

    #[test]
    fn test_named_record_selection() {
        let file = create_test_fasta(">first\nAAAA\n>second desc\nCCCCGG\n");
        let source = SourceSequence::from_fasta(file.path(), Some("second")).unwrap();
        assert_eq!(source.name(), "second");
        assert_eq!(source.as_str(), "CCCCGG");

        let err = SourceSequence::from_fasta(file.path(), Some("third")).unwrap_err();
        assert!(err.to_string().contains("third"));
    }

    #[test]
    fn test_missing_file() {
        let result = SourceSequence::from_fasta("/nonexistent/input.fa", None);
        assert!(result.is_err());
    }
}
