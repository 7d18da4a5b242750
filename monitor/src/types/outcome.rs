//! Termination outcome types

use std::fmt;

use super::{bytes_to_gb, ProcessSnapshot};

/// How a candidate ended up after the terminator handled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillMethod {
    /// Exited after the graceful signal and grace period
    Graceful,
    /// Still alive after the grace period and received the forceful signal
    Forced,
    /// Gone before the graceful signal could be delivered
    AlreadyGone,
    /// Signal delivery failed (typically insufficient privilege)
    Failed,
}

impl KillMethod {
    /// Short label used in log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Graceful => "graceful",
            Self::Forced => "forced",
            Self::AlreadyGone => "already_gone",
            Self::Failed => "failed",
        }
    }

    /// Whether this outcome counts as a kill in the cycle summary
    pub fn is_kill(&self) -> bool {
        matches!(self, Self::Graceful | Self::Forced)
    }
}

impl fmt::Display for KillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-candidate result, produced for logging and the cycle summary
#[derive(Debug, Clone, PartialEq)]
pub struct KillOutcome {
    pub pid: u32,
    pub name: String,
    pub owner: String,
    pub resident_bytes: u64,
    pub percent_of_total: f64,
    /// `None` for dry-run outcomes, where no signal was sent
    pub method: Option<KillMethod>,
    pub dry_run: bool,
}

impl KillOutcome {
    /// Outcome of a real termination attempt
    pub fn executed(snapshot: &ProcessSnapshot, percent_of_total: f64, method: KillMethod) -> Self {
        Self::build(snapshot, percent_of_total, Some(method), false)
    }

    /// Log-only outcome for dry-run mode
    pub fn dry_run(snapshot: &ProcessSnapshot, percent_of_total: f64) -> Self {
        Self::build(snapshot, percent_of_total, None, true)
    }

    fn build(
        snapshot: &ProcessSnapshot,
        percent_of_total: f64,
        method: Option<KillMethod>,
        dry_run: bool,
    ) -> Self {
        Self {
            pid: snapshot.pid,
            name: snapshot.name.clone(),
            owner: snapshot.owner.clone(),
            resident_bytes: snapshot.resident_bytes,
            percent_of_total,
            method,
            dry_run,
        }
    }

    pub fn resident_gb(&self) -> f64 {
        bytes_to_gb(self.resident_bytes)
    }

    pub fn is_kill(&self) -> bool {
        !self.dry_run && self.method.is_some_and(|m| m.is_kill())
    }
}
