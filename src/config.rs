//! Run configuration and the fixed output names

use std::path::{Path, PathBuf};

/// Job description file, the first decompressed line
pub const METADATA_FILE_NAME: &str = "coinami.job.json";
/// Mate 1 reads
pub const MATE1_FILE_NAME: &str = "reads.1.fq";
/// Mate 2 reads
pub const MATE2_FILE_NAME: &str = "reads.2.fq";

/// Longest metadata line (without `\n`) the historic 1000-byte buffer could hold whole.
pub const REFERENCE_MAX_METADATA_LENGTH: usize = 998;
/// Longest read line (without `\n`) the historic 150-byte buffer could hold whole.
pub const REFERENCE_MAX_LINE_LENGTH: usize = 148;

/// File names of the three outputs, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub metadata: String,
    pub mate1: String,
    pub mate2: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        OutputNames {
            metadata: METADATA_FILE_NAME.to_string(),
            mate1: MATE1_FILE_NAME.to_string(),
            mate2: MATE2_FILE_NAME.to_string(),
        }
    }
}

/// Everything a single demultiplexing run needs.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// gzip-compressed interleaved input
    pub input: PathBuf,
    /// Directory the outputs are created in; `None` means the current directory.
    pub output_dir: Option<PathBuf>,
    pub names: OutputNames,
    /// Reject data lines longer than this many bytes (terminator excluded).
    pub max_line_length: Option<usize>,
    /// Same, for the metadata line.
    pub max_metadata_length: Option<usize>,
    /// gzip the two read outputs and add `.gz` to their names
    pub compress: bool,
}

impl DemuxConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        DemuxConfig {
            input: input.into(),
            output_dir: None,
            names: OutputNames::default(),
            max_line_length: None,
            max_metadata_length: None,
            compress: false,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Enforce the line limits the original fixed-size buffers implied.
    pub fn with_reference_limits(mut self) -> Self {
        self.max_line_length = Some(REFERENCE_MAX_LINE_LENGTH);
        self.max_metadata_length = Some(REFERENCE_MAX_METADATA_LENGTH);
        self
    }

    fn base_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir().join(&self.names.metadata)
    }

    pub fn mate1_path(&self) -> PathBuf {
        self.read_output_path(&self.names.mate1)
    }

    pub fn mate2_path(&self) -> PathBuf {
        self.read_output_path(&self.names.mate2)
    }

    fn read_output_path(&self, name: &str) -> PathBuf {
        if self.compress {
            self.base_dir().join(format!("{}.gz", name))
        } else {
            self.base_dir().join(name)
        }
    }
}
