/// Field delimiter between station key and measurement
pub const FIELD_DELIMITER: u8 = b';';

/// Record terminator
pub const LINE_TERMINATOR: u8 = b'\n';

/// Chunk lengths are rounded up to this many bytes (memory-map page granularity)
pub const ALLOCATION_GRANULARITY: u64 = 4096;

/// Input bytes per worker before another worker is added
pub const BYTES_PER_WORKER: u64 = 50 * 1024 * 1024;

/// Measurements are stored as integers scaled by this factor
pub const FIXED_POINT_SCALE: f64 = 10.0;

/// Largest accepted measurement magnitude, in tenths. Larger values are malformed.
pub const MAX_MEASUREMENT_TENTHS: i64 = 1_000_000_000_000_000;

/// File names
pub const DEFAULT_INPUT_FILE: &str = "testcase.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Environment variables
pub const ENV_INPUT_FILE: &str = "INPUT_FILE";
pub const ENV_OUTPUT_FILE: &str = "OUTPUT_FILE";
pub const ENV_WORKERS: &str = "STATS_WORKERS";
pub const ENV_READ_MODE: &str = "STATS_READ_MODE";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_TABLE_CAPACITY: usize = 1024;
