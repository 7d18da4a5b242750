//! Process snapshot type

/// One process as seen during a single scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    /// Parent pid, 0 when the process has no visible parent
    pub parent_pid: u32,
    pub name: String,
    /// Owning user name, or the numeric uid when it has no passwd entry
    pub owner: String,
    /// Command line, joined with spaces (may be empty for kernel threads)
    pub cmdline: String,
    /// Resident set size in bytes
    pub resident_bytes: u64,
}
