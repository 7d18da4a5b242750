//! Policy evaluation: exemptions and memory thresholds
//!
//! Evaluation order is fixed:
//! 1. the daemon's own pid is always exempt
//! 2. the configured whitelist, where any one matching dimension exempts
//! 3. the thresholds, where either axis alone is a violation

use std::collections::HashSet;
use std::fmt;

use crate::types::{bytes_to_gb, ProcessSnapshot, SystemMemoryInfo, BYTES_PER_GB};

// ============================================================================
// Configuration values
// ============================================================================

/// Memory thresholds. A process violating either one is a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Percentage of total system memory
    pub ram_percent: f64,
    /// Absolute resident size in GiB
    pub ram_gb: f64,
}

impl Thresholds {
    pub fn new(ram_percent: f64, ram_gb: f64) -> Self {
        Self {
            ram_percent,
            ram_gb,
        }
    }

    /// Absolute threshold converted to bytes
    pub fn ram_bytes(&self) -> f64 {
        self.ram_gb * BYTES_PER_GB
    }
}

/// Configured exemptions. Names and users are matched exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    pub pids: HashSet<u32>,
    pub names: HashSet<String>,
    pub users: HashSet<String>,
}

impl Whitelist {
    pub fn new(
        pids: impl IntoIterator<Item = u32>,
        names: impl IntoIterator<Item = String>,
        users: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            pids: pids.into_iter().collect(),
            names: names.into_iter().collect(),
            users: users.into_iter().collect(),
        }
    }

    /// First matching exemption, if any
    pub fn matches(&self, snapshot: &ProcessSnapshot) -> Option<Exemption> {
        if self.pids.contains(&snapshot.pid) {
            Some(Exemption::Pid)
        } else if self.names.contains(&snapshot.name) {
            Some(Exemption::Name)
        } else if self.users.contains(&snapshot.owner) {
            Some(Exemption::User)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty() && self.names.is_empty() && self.users.is_empty()
    }
}

// ============================================================================
// Verdicts
// ============================================================================

/// Why a process was exempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    /// The daemon's own process
    SelfProtected,
    Pid,
    Name,
    User,
}

/// Which thresholds a violating process crossed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    /// Resident size as a percentage of total memory
    pub percent: f64,
    /// Resident size in bytes
    pub resident_bytes: u64,
    pub over_percent: bool,
    pub over_absolute: bool,
    thresholds: Thresholds,
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reasons = Vec::with_capacity(2);
        if self.over_percent {
            reasons.push(format!(
                "RAM usage {:.2}% exceeds {}%",
                self.percent, self.thresholds.ram_percent
            ));
        }
        if self.over_absolute {
            reasons.push(format!(
                "RAM usage {:.2}GB exceeds {}GB",
                bytes_to_gb(self.resident_bytes),
                self.thresholds.ram_gb
            ));
        }
        f.write_str(&reasons.join(", "))
    }
}

/// Result of evaluating one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Exempt(Exemption),
    Compliant,
    Violation(Breach),
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self, Self::Exempt(_))
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Decides the verdict for each sampled process. Stateless between calls.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    thresholds: Thresholds,
    whitelist: Whitelist,
    self_pid: u32,
}

impl PolicyEvaluator {
    /// Evaluator protecting the current process
    pub fn new(thresholds: Thresholds, whitelist: Whitelist) -> Self {
        Self::with_self_pid(thresholds, whitelist, std::process::id())
    }

    /// Evaluator protecting an explicit pid as "self"
    pub fn with_self_pid(thresholds: Thresholds, whitelist: Whitelist, self_pid: u32) -> Self {
        Self {
            thresholds,
            whitelist,
            self_pid,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn evaluate(&self, snapshot: &ProcessSnapshot, memory: &SystemMemoryInfo) -> Verdict {
        // Not configurable: checked before and independently of the whitelist
        if snapshot.pid == self.self_pid {
            return Verdict::Exempt(Exemption::SelfProtected);
        }

        if let Some(exemption) = self.whitelist.matches(snapshot) {
            return Verdict::Exempt(exemption);
        }

        let percent = memory.percent_of_total(snapshot.resident_bytes);
        let over_percent = percent > self.thresholds.ram_percent;
        let over_absolute = snapshot.resident_bytes as f64 > self.thresholds.ram_bytes();

        if over_percent || over_absolute {
            Verdict::Violation(Breach {
                percent,
                resident_bytes: snapshot.resident_bytes,
                over_percent,
                over_absolute,
                thresholds: self.thresholds,
            })
        } else {
            Verdict::Compliant
        }
    }
}
