//! Splitting an interleaved job archive into metadata, mate 1 and mate 2.
//!
//! The decompressed input is one job description line followed by FASTQ
//! records that alternate between the two mates in blocks of four lines:
//!
//! ```text
//! {"id":"job1"}     -> coinami.job.json
//! @frag1/1 ... x4   -> reads.1.fq
//! @frag1/2 ... x4   -> reads.2.fq
//! @frag2/1 ... x4   -> reads.1.fq
//! ...
//! ```
//!
//! Routing is purely positional. Records are never parsed, so a stream whose
//! line count is not a multiple of eight is still split line by line; the
//! [`DemuxSummary`] reports the leftover lines.

use crate::config::DemuxConfig;
use crate::error::{DemuxError, Result};
use crate::io::{open_gzip, LineReader, OutputFile};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// FASTQ lines per record
pub const LINES_PER_RECORD: u64 = 4;
/// One mate 1 record followed by one mate 2 record
pub const CYCLE_LINES: u64 = 2 * LINES_PER_RECORD;

/// Which half of a read pair a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    First,
    Second,
}

/// Mate for the `index`-th data line (0-based, metadata line not counted).
pub fn mate_for_line(index: u64) -> Mate {
    if index % CYCLE_LINES < LINES_PER_RECORD {
        Mate::First
    } else {
        Mate::Second
    }
}

/// Position inside the 8-line cycle.
#[derive(Debug, Default)]
struct Cycle {
    counter: u64,
}

impl Cycle {
    /// Mate for the current line, then step to the next one.
    fn advance(&mut self) -> Mate {
        let mate = mate_for_line(self.counter);
        self.counter += 1;
        if self.counter == CYCLE_LINES {
            self.counter = 0;
        }
        mate
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemuxSummary {
    pub metadata_path: PathBuf,
    pub mate1_path: PathBuf,
    pub mate2_path: PathBuf,
    /// Length of the metadata line, terminator included
    pub metadata_bytes: usize,
    pub mate1_lines: u64,
    pub mate2_lines: u64,
}

impl DemuxSummary {
    /// Lines after the metadata line
    pub fn data_lines(&self) -> u64 {
        self.mate1_lines + self.mate2_lines
    }

    /// Complete 4-line records written for mate 1
    pub fn mate1_records(&self) -> u64 {
        self.mate1_lines / LINES_PER_RECORD
    }

    pub fn mate2_records(&self) -> u64 {
        self.mate2_lines / LINES_PER_RECORD
    }

    /// Lines past the last complete pair
    pub fn trailing_lines(&self) -> u64 {
        self.data_lines() % CYCLE_LINES
    }

    /// True when the input held whole pairs only.
    pub fn is_balanced(&self) -> bool {
        self.trailing_lines() == 0
    }
}

/// Run one demultiplexing pass as described by `config`.
///
/// Nothing is created until the input has been opened, the output directory
/// and output names checked and the metadata line read. All handles are
/// released on every return path; outputs already written before a failure
/// are left in place.
pub fn run(config: &DemuxConfig) -> Result<DemuxSummary> {
    info!(input = %config.input.display(), "opening job archive");
    let input = open_gzip(&config.input)?;

    if let Some(dir) = &config.output_dir {
        check_output_dir(dir)?;
    }
    check_distinct_outputs(config)?;

    let mut lines = LineReader::new(input, &config.input);

    let metadata_path = config.metadata_path();
    let metadata_bytes = {
        let line = lines
            .next_line(config.max_metadata_length)?
            .ok_or_else(|| DemuxError::EmptyInput {
                path: config.input.clone(),
            })?;
        let mut out = OutputFile::create(&metadata_path, false)?;
        out.write_line(line)?;
        out.finish()?;
        line.len()
    };
    debug!(path = %metadata_path.display(), bytes = metadata_bytes, "wrote job metadata");

    let mut mate1 = OutputFile::create(&config.mate1_path(), config.compress)?;
    let mut mate2 = OutputFile::create(&config.mate2_path(), config.compress)?;
    let (mate1_lines, mate2_lines) =
        split_reads(&mut lines, &mut mate1, &mut mate2, config.max_line_length)?;

    let mate1_path = mate1.path().to_path_buf();
    let mate2_path = mate2.path().to_path_buf();
    mate1.finish()?;
    mate2.finish()?;

    let summary = DemuxSummary {
        metadata_path,
        mate1_path,
        mate2_path,
        metadata_bytes,
        mate1_lines,
        mate2_lines,
    };

    if !summary.is_balanced() {
        warn!(
            trailing = summary.trailing_lines(),
            "input does not end on a complete read pair, trailing lines were routed by position"
        );
    }
    info!(
        mate1_records = summary.mate1_records(),
        mate2_records = summary.mate2_records(),
        data_lines = summary.data_lines(),
        "demultiplexing complete"
    );

    Ok(summary)
}

/// Route every remaining line to its mate. Returns the line count per mate.
fn split_reads<R: BufRead>(
    lines: &mut LineReader<R>,
    mate1: &mut OutputFile,
    mate2: &mut OutputFile,
    limit: Option<usize>,
) -> Result<(u64, u64)> {
    let mut cycle = Cycle::default();
    let (mut mate1_lines, mut mate2_lines) = (0u64, 0u64);

    while let Some(line) = lines.next_line(limit)? {
        match cycle.advance() {
            Mate::First => {
                mate1.write_line(line)?;
                mate1_lines += 1;
            }
            Mate::Second => {
                mate2.write_line(line)?;
                mate2_lines += 1;
            }
        }

        if lines.line_no() % 1_000_000 == 0 {
            debug!(lines = lines.line_no(), "still splitting");
        }
    }

    Ok((mate1_lines, mate2_lines))
}

fn check_output_dir(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|e| DemuxError::WorkingDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(DemuxError::WorkingDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    // resolving "dir/." needs search permission, same as changing into it
    fs::metadata(dir.join(".")).map_err(|e| DemuxError::WorkingDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn check_distinct_outputs(config: &DemuxConfig) -> Result<()> {
    let outputs = [
        ("metadata", config.metadata_path()),
        ("mate1", config.mate1_path()),
        ("mate2", config.mate2_path()),
    ];
    for (i, (first, first_path)) in outputs.iter().enumerate() {
        for (second, second_path) in &outputs[i + 1..] {
            if first_path == second_path {
                return Err(DemuxError::OutputCollision(*first, *second, first_path.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_blocks_of_four() {
        let mates: Vec<Mate> = (0..16).map(mate_for_line).collect();
        for (i, mate) in mates.iter().enumerate() {
            let expected = if (i % 8) < 4 { Mate::First } else { Mate::Second };
            assert_eq!(*mate, expected, "line {}", i);
        }
    }

    #[test]
    fn cycle_wraps_after_eight_lines() {
        let mut cycle = Cycle::default();
        let first_pass: Vec<Mate> = (0..8).map(|_| cycle.advance()).collect();
        assert_eq!(cycle.counter, 0);
        let second_pass: Vec<Mate> = (0..8).map(|_| cycle.advance()).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn summary_reports_partial_pairs() {
        let summary = DemuxSummary {
            metadata_path: "coinami.job.json".into(),
            mate1_path: "reads.1.fq".into(),
            mate2_path: "reads.2.fq".into(),
            metadata_bytes: 14,
            mate1_lines: 8,
            mate2_lines: 6,
        };
        assert_eq!(summary.data_lines(), 14);
        assert_eq!(summary.mate1_records(), 2);
        assert_eq!(summary.mate2_records(), 1);
        assert_eq!(summary.trailing_lines(), 6);
        assert!(!summary.is_balanced());
    }

    #[test]
    fn missing_output_dir_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            check_output_dir(&missing),
            Err(DemuxError::WorkingDirectory { .. })
        ));

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        match check_output_dir(&file) {
            Err(DemuxError::WorkingDirectory { reason, .. }) => assert_eq!(reason, "not a directory"),
            other => panic!("expected WorkingDirectory, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn unsearchable_output_dir_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o600)).unwrap();

        // root ignores directory permissions
        let searchable = std::fs::metadata(locked.join(".")).is_ok();
        let result = check_output_dir(&locked);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if searchable {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(DemuxError::WorkingDirectory { .. })));
        }
    }

    #[test]
    fn colliding_output_names_are_rejected() {
        let mut config = DemuxConfig::new("job.gz");
        assert!(check_distinct_outputs(&config).is_ok());

        config.names.mate2 = config.names.mate1.clone();
        match check_distinct_outputs(&config) {
            Err(DemuxError::OutputCollision(first, second, path)) => {
                assert_eq!((first, second), ("mate1", "mate2"));
                assert_eq!(path, PathBuf::from("reads.1.fq"));
            }
            other => panic!("expected OutputCollision, got {:?}", other),
        }

        // compression only renames the read outputs
        let mut config = DemuxConfig::new("job.gz");
        config.names.metadata = "reads.1.fq.gz".to_string();
        assert!(check_distinct_outputs(&config).is_ok());
        config.compress = true;
        assert!(matches!(
            check_distinct_outputs(&config),
            Err(DemuxError::OutputCollision("metadata", "mate1", _))
        ));
    }
}
