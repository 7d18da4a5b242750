//! Termination state machine
//!
//! ```text
//! Candidate -> SIGTERM -> wait(grace) -> gone?  -> Graceful
//!                 |                        alive -> SIGKILL -> Forced
//!                 +-> no such process -> AlreadyGone
//!                 +-> permission denied -> Failed
//! ```
//!
//! The grace wait is a fixed sleep with no polling, and an escalation that
//! has started always runs to completion.

use std::time::Duration;

use crate::control::ProcessControl;
use crate::error::SignalError;
use crate::policy::Breach;
use crate::types::{KillMethod, KillOutcome, ProcessSnapshot};

/// Default wait between the graceful and the forceful signal
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Drives candidates through the graceful-then-forceful escalation
pub struct Terminator<C> {
    control: C,
    grace_period: Duration,
    dry_run: bool,
}

impl<C: ProcessControl> Terminator<C> {
    pub fn new(control: C, grace_period: Duration, dry_run: bool) -> Self {
        Self {
            control,
            grace_period,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    /// Handle one violating process and report what happened
    pub async fn handle(&self, snapshot: &ProcessSnapshot, breach: &Breach) -> KillOutcome {
        if self.dry_run {
            let outcome = KillOutcome::dry_run(snapshot, breach.percent);
            tracing::warn!(
                pid = outcome.pid,
                name = %outcome.name,
                owner = %outcome.owner,
                resident_gb = format_args!("{:.2}", outcome.resident_gb()),
                percent = format_args!("{:.2}", outcome.percent_of_total),
                method = "none",
                dry_run = true,
                "[DRY RUN] Would kill process"
            );
            return outcome;
        }

        tracing::warn!(
            pid = snapshot.pid,
            name = %snapshot.name,
            owner = %snapshot.owner,
            resident_gb = format_args!("{:.2}", crate::types::bytes_to_gb(snapshot.resident_bytes)),
            percent = format_args!("{:.2}", breach.percent),
            cmd = %snapshot.cmdline,
            "Killing process"
        );

        let method = self.escalate(snapshot.pid).await;
        let outcome = KillOutcome::executed(snapshot, breach.percent, method);
        log_outcome(&outcome);
        outcome
    }

    async fn escalate(&self, pid: u32) -> KillMethod {
        match self.control.terminate(pid) {
            Ok(()) => {}
            Err(SignalError::NoSuchProcess) => return KillMethod::AlreadyGone,
            Err(e) => {
                tracing::warn!(pid, error = %e, "Failed to send SIGTERM");
                return KillMethod::Failed;
            }
        }

        tokio::time::sleep(self.grace_period).await;

        if !self.control.is_alive(pid) {
            return KillMethod::Graceful;
        }

        match self.control.kill(pid) {
            Ok(()) => {
                tracing::warn!(pid, "Force killed process (did not respond to SIGTERM)");
                KillMethod::Forced
            }
            // Exited between the liveness check and SIGKILL
            Err(SignalError::NoSuchProcess) => KillMethod::Graceful,
            Err(e) => {
                tracing::warn!(pid, error = %e, "SIGKILL reported an error");
                KillMethod::Forced
            }
        }
    }
}

fn log_outcome(outcome: &KillOutcome) {
    let method = outcome.method.map(|m| m.label()).unwrap_or("none");
    match outcome.method {
        Some(KillMethod::AlreadyGone) => {
            tracing::info!(pid = outcome.pid, method, "Process already terminated");
        }
        _ => {
            tracing::warn!(
                pid = outcome.pid,
                name = %outcome.name,
                owner = %outcome.owner,
                resident_gb = format_args!("{:.2}", outcome.resident_gb()),
                percent = format_args!("{:.2}", outcome.percent_of_total),
                method,
                dry_run = false,
                "Termination finished"
            );
        }
    }
}
