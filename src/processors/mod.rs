pub mod chunk_planner;
pub mod parallel_processor;
pub mod result_merger;

pub use chunk_planner::ChunkPlanner;
pub use parallel_processor::{ParallelProcessor, ProcessingSummary};
pub use result_merger::ResultMerger;
