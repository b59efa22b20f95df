//! gzip input and plain/gzip output plumbing

use crate::error::{DemuxError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decompressed view of the interleaved input.
pub type GzipInput = BufReader<MultiGzDecoder<BufReader<File>>>;

/// Open `path` as a gzip stream.
///
/// The magic bytes are checked up front so a wrong file fails here rather
/// than after the outputs have been created.
pub fn open_gzip(path: &Path) -> Result<GzipInput> {
    let file = File::open(path).map_err(|e| DemuxError::input_open(path, e))?;
    let mut raw = BufReader::new(file);
    let is_gzip = raw
        .fill_buf()
        .map_err(|e| DemuxError::input_open(path, e))?
        .starts_with(&GZIP_MAGIC);
    if !is_gzip {
        return Err(DemuxError::InputOpen {
            path: path.to_path_buf(),
            reason: "not a gzip stream".to_string(),
        });
    }

    // 2 MiB, same as the FASTQ readers
    Ok(BufReader::with_capacity(2 << 20, MultiGzDecoder::new(raw)))
}

/// Line reader over a buffered stream that reuses one buffer for every line.
///
/// Lines are returned byte-for-byte, terminator included. With a limit set,
/// a line whose content (without `\n`) is longer than the limit is an error;
/// lines are never split or truncated.
pub struct LineReader<R> {
    inner: R,
    source: PathBuf,
    buf: Vec<u8>,
    line_no: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, source: impl Into<PathBuf>) -> Self {
        LineReader {
            inner,
            source: source.into(),
            buf: Vec::with_capacity(256),
            line_no: 0,
        }
    }

    /// Number of lines handed out so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Next line, or `None` at end of stream.
    pub fn next_line(&mut self, limit: Option<usize>) -> Result<Option<&[u8]>> {
        self.buf.clear();
        let read = match limit {
            // content + '\n' + one byte to tell "too long" from "exactly full"
            Some(limit) => (&mut self.inner)
                .take((limit as u64).saturating_add(2))
                .read_until(b'\n', &mut self.buf),
            None => self.inner.read_until(b'\n', &mut self.buf),
        };
        let n = read.map_err(|source| DemuxError::Decompress {
            path: self.source.clone(),
            line: self.line_no + 1,
            source,
        })?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        if let Some(limit) = limit {
            if content_len(&self.buf) > limit {
                return Err(DemuxError::LineTooLong {
                    line: self.line_no,
                    limit,
                });
            }
        }
        Ok(Some(self.buf.as_slice()))
    }
}

fn content_len(line: &[u8]) -> usize {
    match line.last() {
        Some(b'\n') => line.len() - 1,
        _ => line.len(),
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

/// A truncate-on-open output file.
///
/// Dropping it releases the handle on every path; call [`OutputFile::finish`]
/// on success so flush and gzip trailer errors are reported.
pub struct OutputFile {
    path: PathBuf,
    sink: Sink,
}

impl OutputFile {
    pub fn create(path: &Path, compress: bool) -> Result<Self> {
        let file = File::create(path).map_err(|e| DemuxError::output_write(path, e))?;

        let sink = if compress {
            // level 1 trades ratio for several times the speed
            let encoder = GzEncoder::new(file, Compression::new(1));
            Sink::Gzip(BufWriter::with_capacity(4 << 20, encoder))
        } else {
            Sink::Plain(BufWriter::with_capacity(4 << 20, file))
        };

        Ok(OutputFile {
            path: path.to_path_buf(),
            sink,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let written = match &mut self.sink {
            Sink::Plain(w) => w.write_all(line),
            Sink::Gzip(w) => w.write_all(line),
        };
        written.map_err(|e| DemuxError::output_write(&self.path, e))
    }

    /// Flush everything and close the file.
    pub fn finish(self) -> Result<()> {
        let OutputFile { path, sink } = self;
        let closed = match sink {
            Sink::Plain(w) => w.into_inner().map(drop).map_err(|e| e.into_error()),
            Sink::Gzip(w) => w
                .into_inner()
                .map_err(|e| e.into_error())
                .and_then(|encoder| encoder.finish())
                .map(drop),
        };
        closed.map_err(|e| DemuxError::output_write(path, e))
    }
}
