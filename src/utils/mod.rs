pub mod constants;
pub mod progress;
pub mod rounding;

pub use constants::*;
pub use progress::ProgressReporter;
pub use rounding::{round_toward_positive_infinity, to_tenths};
