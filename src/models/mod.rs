pub mod chunk;
pub mod station;

pub use chunk::ChunkRange;
pub use station::{GlobalResult, PartialResult, StationKey, StationStats, StationTable};
