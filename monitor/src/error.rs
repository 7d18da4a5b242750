//! Error types for the memory monitor
//!
//! Per-process read failures never surface here: the sampler skips those
//! processes silently. What remains are cycle-level sampling failures,
//! signal delivery failures and fatal startup failures.

use thiserror::Error;

/// Cycle-level sampling failures. The cycle is abandoned, the daemon keeps running.
#[derive(Error, Debug)]
pub enum SampleError {
    /// Total system memory could not be read (reported as zero)
    #[error("total system memory is unavailable")]
    MemoryUnavailable,

    /// The process table could not be enumerated at all
    #[error("process table could not be enumerated")]
    EnumerationFailed,
}

/// Failures when sending a signal to a process
#[derive(Error, Debug)]
pub enum SignalError {
    /// The process no longer exists (ESRCH)
    #[error("no such process")]
    NoSuchProcess,

    /// Not allowed to signal the process (EPERM)
    #[error("permission denied")]
    PermissionDenied,

    /// The pid cannot be represented as a signal target
    #[error("invalid pid {0}")]
    InvalidPid(u32),

    /// Any other OS error
    #[error("signal delivery failed: {0}")]
    Os(#[source] std::io::Error),
}

impl SignalError {
    /// Classify the OS error left behind by a failed `kill(2)`
    pub fn from_io(err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ESRCH) => Self::NoSuchProcess,
            Some(libc::EPERM) => Self::PermissionDenied,
            _ => Self::Os(err),
        }
    }
}

/// Result type alias for signal operations
pub type SignalResult = Result<(), SignalError>;

/// Fatal errors that stop the daemon before the loop starts
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The process table is not readable at all
    #[error("cannot read process table at {path}: {source}")]
    ProcfsUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The first sample failed, so the loop would never do useful work
    #[error("initial system sample failed: {0}")]
    InitialSample(#[from] SampleError),
}
