use crate::error::{ProcessingError, Result};
use crate::models::ChunkRange;
use crate::utils::constants::{ALLOCATION_GRANULARITY, LINE_TERMINATOR};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Splits a file into contiguous, line-aligned byte ranges, one per worker.
pub struct ChunkPlanner {
    granularity: u64,
}

impl ChunkPlanner {
    pub fn new() -> Self {
        Self {
            granularity: ALLOCATION_GRANULARITY,
        }
    }

    pub fn with_granularity(granularity: u64) -> Self {
        Self {
            granularity: granularity.max(1),
        }
    }

    /// Nominal chunk length: `file_size / workers` rounded up to whole granules.
    /// Always at least one granule, so never zero.
    pub fn chunk_length(&self, file_size: u64, workers: usize) -> u64 {
        let nominal = file_size.div_ceil(workers.max(1) as u64);
        let granules = nominal.div_ceil(self.granularity).max(1);
        granules.saturating_mul(self.granularity)
    }

    /// Plan chunk ranges over an in-memory view of the file.
    ///
    /// Every range but the last ends just past a line terminator; the last ends
    /// at `data.len()`. At most `workers` ranges are produced.
    pub fn plan(&self, data: &[u8], workers: usize) -> Result<Vec<ChunkRange>> {
        if workers == 0 {
            return Err(ProcessingError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }

        let file_size = data.len() as u64;
        let chunk_length = self.chunk_length(file_size, workers);
        let mut ranges = Vec::with_capacity(workers);
        let mut start = 0u64;

        while start < file_size {
            let mut end = start.saturating_add(chunk_length).min(file_size);
            if end < file_size {
                end = align_to_line_end(data, end);
            }
            if end == start {
                end = next_line_end(data, start);
            }

            ranges.push(ChunkRange::new(start, end));
            start = end;
        }

        debug!(
            file_size,
            workers,
            chunk_length,
            chunks = ranges.len(),
            "Planned chunk boundaries"
        );

        Ok(ranges)
    }

    /// Plan chunk ranges for a file on disk. The file is mapped read-only only
    /// for the duration of the boundary scan.
    pub fn plan_file(&self, path: &Path, workers: usize) -> Result<Vec<ChunkRange>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return self.plan(&[], workers);
        }

        let mmap = unsafe { Mmap::map(&file)? };
        self.plan(&mmap, workers)
    }
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep `pos` if it already starts a line, otherwise move it past the next terminator.
fn align_to_line_end(data: &[u8], pos: u64) -> u64 {
    if pos == 0 || data[pos as usize - 1] == LINE_TERMINATOR {
        pos
    } else {
        next_line_end(data, pos)
    }
}

/// Offset just past the next terminator at or after `pos`, or end of data
/// when there is none.
fn next_line_end(data: &[u8], pos: u64) -> u64 {
    match memchr::memchr(LINE_TERMINATOR, &data[pos as usize..]) {
        Some(offset) => pos + offset as u64 + 1,
        None => data.len() as u64,
    }
}
