//! Cycle driver
//!
//! Runs sample -> evaluate -> terminate once per interval until a stop is
//! requested. Each candidate is handled as soon as it is evaluated; the
//! grace-period wait blocks the rest of the cycle.

use std::path::Path;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::control::ProcessControl;
use crate::error::{MonitorError, SampleError};
use crate::policy::{PolicyEvaluator, Verdict};
use crate::sampler::ProcessSource;
use crate::shutdown::Shutdown;
use crate::terminator::Terminator;
use crate::types::{bytes_to_gb, CycleSummary, SystemMemoryInfo};

/// Consecutive failed cycles after which the daemon reports itself degraded
pub const DEGRADED_AFTER_FAILURES: u32 = 3;

/// Process table location checked before the loop starts
pub const PROCFS_PATH: &str = "/proc";

/// The memory monitor: owns the sampler, evaluator and terminator
pub struct MemoryMonitor<S, C> {
    sampler: S,
    evaluator: PolicyEvaluator,
    terminator: Terminator<C>,
    check_interval: Duration,
    consecutive_failures: u32,
}

impl<S: ProcessSource, C: ProcessControl> MemoryMonitor<S, C> {
    pub fn new(
        sampler: S,
        evaluator: PolicyEvaluator,
        terminator: Terminator<C>,
        check_interval: Duration,
    ) -> Self {
        Self {
            sampler,
            evaluator,
            terminator,
            check_interval,
            consecutive_failures: 0,
        }
    }

    /// Fail fast when the host cannot be sampled at all.
    ///
    /// Returns the memory figures used for the startup banner.
    pub fn preflight(&mut self) -> Result<SystemMemoryInfo, MonitorError> {
        Ok(self.sampler.memory()?)
    }

    pub fn log_startup(&self, memory: &SystemMemoryInfo) {
        let thresholds = self.evaluator.thresholds();
        let whitelist = self.evaluator.whitelist();
        tracing::info!("Memory Monitor initialized");
        tracing::info!("Total RAM: {:.2} GB", bytes_to_gb(memory.total_bytes));
        tracing::info!(
            "Thresholds: {}% or {} GB",
            thresholds.ram_percent,
            thresholds.ram_gb
        );
        tracing::info!(
            "Whitelist: {} pids, {} names, {} users",
            whitelist.pids.len(),
            whitelist.names.len(),
            whitelist.users.len()
        );
        tracing::info!("Dry Run Mode: {}", self.terminator.is_dry_run());
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures >= DEGRADED_AFTER_FAILURES
    }

    /// Run until `shutdown` is requested. The stop is honored only between
    /// cycles, never in the middle of one.
    pub async fn run(&mut self, mut shutdown: Shutdown) {
        tracing::info!(
            interval_secs = self.check_interval.as_secs(),
            "Memory Monitor started"
        );

        let mut interval = time::interval(self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.requested() => break,
                _ = interval.tick() => {}
            }
            if shutdown.is_requested() {
                break;
            }
            self.tick().await;
        }

        tracing::info!("Memory Monitor stopped");
    }

    /// Run one cycle, tracking consecutive failures.
    ///
    /// Cycle-level errors are logged and swallowed; the next interval retries.
    pub async fn tick(&mut self) -> Option<CycleSummary> {
        match self.run_cycle().await {
            Ok(summary) => {
                if self.is_degraded() {
                    tracing::info!(
                        failures = self.consecutive_failures,
                        "Scanning recovered"
                    );
                }
                self.consecutive_failures = 0;
                Some(summary)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::error!(
                    error = %e,
                    consecutive_failures = self.consecutive_failures,
                    "Scan failed, retrying next interval"
                );
                if self.is_degraded() {
                    tracing::warn!(
                        consecutive_failures = self.consecutive_failures,
                        "Monitor degraded: repeated scan failures"
                    );
                }
                None
            }
        }
    }

    /// Sample, evaluate and act on every process once
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, SampleError> {
        let Self {
            sampler,
            evaluator,
            terminator,
            ..
        } = self;

        let sample = sampler.sample()?;
        let memory = sample.memory;

        tracing::info!(
            "System Memory: {:.1}% used ({:.2}GB / {:.2}GB)",
            memory.usage_percent(),
            bytes_to_gb(memory.used_bytes),
            bytes_to_gb(memory.total_bytes)
        );
        tracing::debug!("Starting process scan...");

        let mut summary = CycleSummary::default();

        for snapshot in sample.processes {
            summary.record_scanned();

            match evaluator.evaluate(&snapshot, &memory) {
                Verdict::Violation(breach) => {
                    tracing::info!(
                        pid = snapshot.pid,
                        name = %snapshot.name,
                        "Process marked for termination: {}",
                        breach
                    );
                    let outcome = terminator.handle(&snapshot, &breach).await;
                    summary.record(&outcome);
                }
                Verdict::Exempt(exemption) => {
                    tracing::trace!(pid = snapshot.pid, ?exemption, "Exempt");
                }
                Verdict::Compliant => {}
            }
        }

        tracing::info!(
            scanned = summary.scanned,
            killed = summary.killed,
            dry_run_matches = summary.dry_run_matches,
            failed = summary.failed,
            already_gone = summary.already_gone,
            "Scan complete. Scanned: {}, Killed: {}",
            summary.scanned,
            summary.killed
        );

        Ok(summary)
    }
}

/// Check that the process table can be read at all
pub fn check_procfs(path: &Path) -> Result<(), MonitorError> {
    std::fs::read_dir(path)
        .map(|_| ())
        .map_err(|source| MonitorError::ProcfsUnavailable {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_procfs_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_procfs(&dir.path().join("proc")).unwrap_err();
        assert!(matches!(err, MonitorError::ProcfsUnavailable { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_check_procfs_linux() {
        assert!(check_procfs(Path::new(PROCFS_PATH)).is_ok());
    }
}
