use crate::error::{ProcessingError, Result};
use crate::models::{ChunkRange, PartialResult, StationTable};
use crate::utils::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_TABLE_CAPACITY, FIELD_DELIMITER, LINE_TERMINATOR,
};
use crate::utils::rounding::to_tenths;
use memmap2::MmapOptions;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// How a worker gets at the bytes of its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Map the chunk read-only into memory
    #[default]
    Mmap,
    /// Stream the chunk through a `BufReader`
    Buffered,
}

impl ReadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadMode::Mmap => "mmap",
            ReadMode::Buffered => "buffered",
        }
    }
}

/// Result of aggregating one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub range: ChunkRange,
    pub table: PartialResult,
    /// Non-blank lines seen
    pub lines: u64,
    /// Lines dropped for a missing delimiter or an unparsable value
    pub skipped: u64,
}

/// Parses and aggregates the records of a single chunk.
pub struct ChunkReader {
    read_mode: ReadMode,
}

impl ChunkReader {
    pub fn new() -> Self {
        Self {
            read_mode: ReadMode::default(),
        }
    }

    pub fn with_read_mode(read_mode: ReadMode) -> Self {
        Self { read_mode }
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Aggregate every record that starts inside `range`.
    ///
    /// Any I/O fault is reported as [`ProcessingError::WorkerFailure`]; a chunk
    /// is never partially aggregated.
    pub fn read_chunk(&self, path: &Path, range: ChunkRange) -> Result<ChunkOutcome> {
        if range.is_empty() {
            return Ok(ChunkOutcome::empty(range));
        }

        let outcome = match self.read_mode {
            ReadMode::Mmap => self.read_chunk_mmap(path, range),
            ReadMode::Buffered => self.read_chunk_buffered(path, range),
        }
        .map_err(|e| ProcessingError::worker(range, e))?;

        debug!(
            chunk = %range,
            mode = self.read_mode().as_str(),
            stations = outcome.table.len(),
            lines = outcome.lines,
            skipped = outcome.skipped,
            "Aggregated chunk"
        );

        Ok(outcome)
    }

    /// Map `[start - 1, end)`. The extra leading byte tells whether `start`
    /// falls on a line boundary.
    fn read_chunk_mmap(&self, path: &Path, range: ChunkRange) -> io::Result<ChunkOutcome> {
        let file = open_for_range(path, range)?;
        let view_start = range.start.saturating_sub(1);
        let view_len = (range.end - view_start) as usize;

        let mmap = unsafe {
            MmapOptions::new()
                .offset(view_start)
                .len(view_len)
                .map(&file)?
        };

        let mut aggregator = LineAggregator::new();
        aggregator.ingest_bytes(skip_leading_partial(range, &mmap));
        Ok(aggregator.finish(range))
    }

    fn read_chunk_buffered(&self, path: &Path, range: ChunkRange) -> io::Result<ChunkOutcome> {
        let mut file = open_for_range(path, range)?;
        let view_start = range.start.saturating_sub(1);
        file.seek(SeekFrom::Start(view_start))?;

        let mut reader =
            BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file.take(range.end - view_start));
        let mut line = Vec::with_capacity(128);

        if range.start > 0 {
            let mut previous = [0u8; 1];
            reader.read_exact(&mut previous)?;
            if previous[0] != LINE_TERMINATOR {
                reader.read_until(LINE_TERMINATOR, &mut line)?;
            }
        }

        let mut aggregator = LineAggregator::new();
        loop {
            line.clear();
            if reader.read_until(LINE_TERMINATOR, &mut line)? == 0 {
                break;
            }
            aggregator.ingest_line(&line);
        }

        Ok(aggregator.finish(range))
    }

    /// Aggregate a chunk that is already in memory, where `data` is the whole file.
    pub fn read_chunk_from_slice(&self, data: &[u8], range: ChunkRange) -> ChunkOutcome {
        if range.is_empty() {
            return ChunkOutcome::empty(range);
        }

        let view_start = range.start.saturating_sub(1) as usize;
        let view = &data[view_start..range.end as usize];

        let mut aggregator = LineAggregator::new();
        aggregator.ingest_bytes(skip_leading_partial(range, view));
        aggregator.finish(range)
    }
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkOutcome {
    fn empty(range: ChunkRange) -> Self {
        Self {
            range,
            table: StationTable::new(),
            lines: 0,
            skipped: 0,
        }
    }
}

fn open_for_range(path: &Path, range: ChunkRange) -> io::Result<File> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    if range.end > file_size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("chunk ends at {} but file is {} bytes", range.end, file_size),
        ));
    }
    Ok(file)
}

/// `view` covers `[start - 1, end)` (or `[0, end)` for the first chunk). Drops the
/// look-behind byte and, if `start` is mid-line, the rest of that line.
fn skip_leading_partial(range: ChunkRange, view: &[u8]) -> &[u8] {
    if range.start == 0 {
        return view;
    }

    match view.split_first() {
        Some((&LINE_TERMINATOR, rest)) => rest,
        Some((_, rest)) => match memchr::memchr(LINE_TERMINATOR, rest) {
            Some(pos) => &rest[pos + 1..],
            None => &[],
        },
        None => view,
    }
}

/// Per-line parsing and fixed-point accumulation.
struct LineAggregator {
    table: StationTable,
    lines: u64,
    skipped: u64,
}

impl LineAggregator {
    fn new() -> Self {
        Self {
            table: StationTable::with_capacity(DEFAULT_TABLE_CAPACITY),
            lines: 0,
            skipped: 0,
        }
    }

    fn ingest_bytes(&mut self, bytes: &[u8]) {
        let mut start = 0;
        for end in memchr::memchr_iter(LINE_TERMINATOR, bytes) {
            self.ingest_line(&bytes[start..end]);
            start = end + 1;
        }
        if start < bytes.len() {
            self.ingest_line(&bytes[start..]);
        }
    }

    fn ingest_line(&mut self, line: &[u8]) {
        let line = line.strip_suffix(&[LINE_TERMINATOR]).unwrap_or(line);
        if line.trim_ascii().is_empty() {
            return;
        }
        self.lines += 1;

        match parse_record(line) {
            Some((key, measurement)) => self.table.record(key, measurement),
            None => self.skipped += 1,
        }
    }

    fn finish(self, range: ChunkRange) -> ChunkOutcome {
        ChunkOutcome {
            range,
            table: self.table,
            lines: self.lines,
            skipped: self.skipped,
        }
    }
}

/// Split a line into its raw key and measurement in tenths.
fn parse_record(line: &[u8]) -> Option<(&[u8], i64)> {
    let delimiter = memchr::memchr(FIELD_DELIMITER, line)?;
    let key = &line[..delimiter];
    let value = line[delimiter + 1..].trim_ascii();

    let value: f64 = lexical_core::parse(value).ok()?;
    Some((key, to_tenths(value)?))
}
