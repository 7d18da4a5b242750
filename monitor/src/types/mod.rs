//! Per-cycle data types

mod memory;
mod outcome;
mod snapshot;
mod summary;

pub use memory::*;
pub use outcome::*;
pub use snapshot::*;
pub use summary::*;

/// Bytes in one GiB, the unit used for thresholds and log output
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a byte count to GiB for display
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}
