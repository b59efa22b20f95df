//! Error types for the demultiplexer

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for demultiplexer operations
pub type Result<T> = std::result::Result<T, DemuxError>;

/// Everything that can stop a demultiplexing run.
///
/// Each variant maps to its own process exit code, see [`DemuxError::exit_code`].
#[derive(Debug, Error)]
pub enum DemuxError {
    /// Input missing, unreadable, or not a gzip stream
    #[error("cannot open input {}: {reason}", path.display())]
    InputOpen { path: PathBuf, reason: String },

    /// The gzip stream turned out to be corrupt or truncated while reading
    #[error("failed to decompress {} near line {line}", path.display())]
    Decompress {
        path: PathBuf,
        line: u64,
        #[source]
        source: io::Error,
    },

    /// The output directory does not exist or is not a directory
    #[error("cannot use output directory {}: {reason}", path.display())]
    WorkingDirectory { path: PathBuf, reason: String },

    /// An output file could not be created, written, or closed
    #[error("cannot write {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line is longer than the configured limit
    #[error("line {line} is longer than the limit of {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    /// Two of the configured outputs resolve to the same file
    #[error("outputs {} and {} resolve to the same file {}", .0, .1, .2.display())]
    OutputCollision(&'static str, &'static str, PathBuf),

    /// The decompressed stream holds no metadata line at all
    #[error("input {} decompresses to an empty stream, no job metadata line", path.display())]
    EmptyInput { path: PathBuf },
}

impl DemuxError {
    pub(crate) fn input_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DemuxError::InputOpen {
            path: path.into(),
            reason: source.to_string(),
        }
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DemuxError::OutputWrite {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error. 2 is left to clap for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            DemuxError::InputOpen { .. } => 3,
            DemuxError::Decompress { .. } => 4,
            DemuxError::WorkingDirectory { .. } => 5,
            DemuxError::OutputWrite { .. } => 6,
            DemuxError::LineTooLong { .. } => 7,
            DemuxError::EmptyInput { .. } => 8,
            DemuxError::OutputCollision(..) => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            DemuxError::input_open("a.gz", io::Error::from(io::ErrorKind::NotFound)),
            DemuxError::Decompress {
                path: "a.gz".into(),
                line: 1,
                source: io::Error::from(io::ErrorKind::InvalidData),
            },
            DemuxError::WorkingDirectory {
                path: "out".into(),
                reason: "not found".into(),
            },
            DemuxError::output_write("reads.1.fq", io::Error::from(io::ErrorKind::PermissionDenied)),
            DemuxError::LineTooLong { line: 3, limit: 148 },
            DemuxError::EmptyInput { path: "a.gz".into() },
            DemuxError::OutputCollision("mate1", "mate2", "reads.fq".into()),
        ];

        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0 && c != 1 && c != 2));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn messages_name_the_offending_path() {
        let err = DemuxError::input_open("missing.gz", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("missing.gz"));

        let err = DemuxError::LineTooLong { line: 9, limit: 148 };
        assert_eq!(err.to_string(), "line 9 is longer than the limit of 148 bytes");
    }
}
