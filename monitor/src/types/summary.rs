//! Cycle summary type

use super::{KillMethod, KillOutcome};

/// Counters emitted once at the end of every completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Processes sampled and evaluated (exempt ones included)
    pub scanned: usize,
    /// Outcomes with method graceful or forced
    pub killed: usize,
    /// Violations only logged because dry-run is enabled
    pub dry_run_matches: usize,
    /// Outcomes with method failed
    pub failed: usize,
    /// Outcomes with method already_gone
    pub already_gone: usize,
}

impl CycleSummary {
    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    pub fn record(&mut self, outcome: &KillOutcome) {
        if outcome.dry_run {
            self.dry_run_matches += 1;
            return;
        }
        match outcome.method {
            Some(KillMethod::Graceful) | Some(KillMethod::Forced) => self.killed += 1,
            Some(KillMethod::Failed) => self.failed += 1,
            Some(KillMethod::AlreadyGone) => self.already_gone += 1,
            None => {}
        }
    }
}
