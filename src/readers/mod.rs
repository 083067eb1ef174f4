pub mod chunk_reader;

pub use chunk_reader::{ChunkOutcome, ChunkReader, ReadMode};
