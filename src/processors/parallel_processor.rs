use crate::error::{ProcessingError, Result};
use crate::models::{ChunkRange, GlobalResult};
use crate::processors::{ChunkPlanner, ResultMerger};
use crate::readers::{ChunkOutcome, ChunkReader, ReadMode};
use crate::utils::constants::{ALLOCATION_GRANULARITY, BYTES_PER_WORKER};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Drives planning, parallel chunk aggregation and merging for one input file.
pub struct ParallelProcessor {
    workers: usize,
    read_mode: ReadMode,
    granularity: u64,
}

/// What a run produced, plus the counters printed in the summary.
#[derive(Debug)]
pub struct ProcessingSummary {
    pub file_size: u64,
    pub workers: usize,
    pub chunks: usize,
    pub lines: u64,
    pub skipped: u64,
    pub result: GlobalResult,
}

impl ParallelProcessor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            read_mode: ReadMode::default(),
            granularity: ALLOCATION_GRANULARITY,
        }
    }

    /// Size the pool from the file size and the machine's parallelism.
    pub fn for_file_size(file_size: u64) -> Self {
        Self::new(Self::worker_count(file_size, num_cpus::get()))
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_granularity(mut self, granularity: u64) -> Self {
        self.granularity = granularity.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// One worker per 50 MiB of input, at least one, never more than `available`.
    pub fn worker_count(file_size: u64, available: usize) -> usize {
        let by_size = (file_size / BYTES_PER_WORKER).max(1);
        let by_size = usize::try_from(by_size).unwrap_or(usize::MAX);
        by_size.min(available.max(1))
    }

    pub fn plan(&self, path: &Path) -> Result<Vec<ChunkRange>> {
        ChunkPlanner::with_granularity(self.granularity).plan_file(path, self.workers)
    }

    /// Aggregate the whole file. Fails as a whole if any chunk fails; no
    /// partial result is ever returned.
    pub fn process_file(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<ProcessingSummary> {
        if let Some(p) = progress {
            p.set_message("Planning chunks...");
        }
        let ranges = self.plan(path)?;
        // The last range always ends at EOF
        let file_size = ranges.last().map_or(0, |range| range.end);
        info!(
            file_size,
            workers = self.workers,
            chunks = ranges.len(),
            "Chunk plan ready"
        );

        if let Some(p) = progress {
            p.set_length(ranges.len() as u64);
            p.set_message(&format!("Aggregating {} chunks...", ranges.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("chunk-worker-{}", index))
            .build()
            .map_err(|e| ProcessingError::ThreadPool(e.to_string()))?;

        let reader = ChunkReader::with_read_mode(self.read_mode);
        let outcomes: Result<Vec<ChunkOutcome>> = pool.install(|| {
            ranges
                .par_iter()
                .map(|range| {
                    let outcome = reader.read_chunk(path, *range);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    outcome
                })
                .collect()
        });
        let outcomes = outcomes?;

        let lines = outcomes.iter().map(|o| o.lines).sum();
        let skipped = outcomes.iter().map(|o| o.skipped).sum();
        if skipped > 0 {
            warn!(skipped, "Skipped malformed lines");
        }

        if let Some(p) = progress {
            p.set_message("Merging chunk results...");
        }
        let result = ResultMerger::new().merge_all(outcomes.into_iter().map(|o| o.table));

        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} stations", result.len()));
        }

        Ok(ProcessingSummary {
            file_size,
            workers: self.workers,
            chunks: ranges.len(),
            lines,
            skipped,
            result,
        })
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
