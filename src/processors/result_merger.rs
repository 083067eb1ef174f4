use crate::models::{GlobalResult, PartialResult, StationTable};
use rayon::prelude::*;
use tracing::debug;

/// Folds per-chunk results into one table for the whole file.
///
/// Combining station statistics is commutative and associative, so
/// [`merge_all`](Self::merge_all) and [`merge_tree`](Self::merge_tree) give
/// identical results for any input order.
pub struct ResultMerger;

impl ResultMerger {
    pub fn new() -> Self {
        Self
    }

    /// Fold one partial result into the accumulator.
    pub fn merge_partial(&self, global: &mut GlobalResult, partial: PartialResult) {
        global.absorb(partial);
    }

    /// Sequential left fold.
    pub fn merge_all<I>(&self, partials: I) -> GlobalResult
    where
        I: IntoIterator<Item = PartialResult>,
    {
        let mut global = StationTable::new();
        let mut merged = 0usize;
        for partial in partials {
            self.merge_partial(&mut global, partial);
            merged += 1;
        }

        debug!(partials = merged, stations = global.len(), "Merged partial results");
        global
    }

    /// Pairwise reduction on the current rayon pool.
    pub fn merge_tree(&self, partials: Vec<PartialResult>) -> GlobalResult {
        partials
            .into_par_iter()
            .reduce(StationTable::new, |mut left, right| {
                left.absorb(right);
                left
            })
    }
}

impl Default for ResultMerger {
    fn default() -> Self {
        Self::new()
    }
}
