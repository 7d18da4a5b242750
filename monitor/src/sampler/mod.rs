//! Process sampling
//!
//! [`ProcessSource`] is the enumeration boundary: the cycle driver only ever
//! sees a [`Sample`], so tests can substitute an in-memory process table.

mod host;

pub use host::SysinfoSampler;

use crate::error::SampleError;
use crate::types::{ProcessSnapshot, SystemMemoryInfo};

/// One cycle's view of the host: memory figures plus a one-shot,
/// lazily produced sequence of process snapshots.
pub struct Sample<'a> {
    pub memory: SystemMemoryInfo,
    pub processes: Box<dyn Iterator<Item = ProcessSnapshot> + 'a>,
}

impl<'a> Sample<'a> {
    pub fn new(
        memory: SystemMemoryInfo,
        processes: impl Iterator<Item = ProcessSnapshot> + 'a,
    ) -> Self {
        Self {
            memory,
            processes: Box::new(processes),
        }
    }
}

/// Source of process snapshots and system memory figures.
///
/// Implementations must skip processes that vanish or cannot be read instead
/// of failing the whole sample; only host-wide failures are errors.
pub trait ProcessSource {
    /// Read system memory only
    fn memory(&mut self) -> Result<SystemMemoryInfo, SampleError>;

    /// Take a fresh sample for one cycle
    fn sample(&mut self) -> Result<Sample<'_>, SampleError>;
}
