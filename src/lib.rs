//! Split a gzip-compressed coinami job archive into its job description and
//! the two mates of its interleaved paired-end reads.
//!
//! ```no_run
//! use coinami_decompressor::{run, DemuxConfig};
//!
//! let config = DemuxConfig::new("job.fq.gz").with_output_dir("/work/job1");
//! let summary = run(&config)?;
//! println!("{} read pairs", summary.mate2_records());
//! # Ok::<(), coinami_decompressor::DemuxError>(())
//! ```

pub mod config;
pub mod demux;
pub mod error;
pub mod io;

pub use config::{DemuxConfig, OutputNames};
pub use demux::{mate_for_line, run, DemuxSummary, Mate};
pub use error::{DemuxError, Result};
