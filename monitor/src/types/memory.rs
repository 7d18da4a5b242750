//! System memory types

/// System-wide memory figures, captured once per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMemoryInfo {
    /// Total physical memory in bytes
    pub total_bytes: u64,
    /// Used physical memory in bytes
    pub used_bytes: u64,
}

impl SystemMemoryInfo {
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        Self {
            total_bytes,
            used_bytes,
        }
    }

    /// Memory usage percentage (0-100)
    pub fn usage_percent(&self) -> f64 {
        self.percent_of_total(self.used_bytes)
    }

    /// Share of total memory that `bytes` represents, as a percentage
    pub fn percent_of_total(&self, bytes: u64) -> f64 {
        if self.total_bytes > 0 {
            (bytes as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        }
    }
}
