//! Memory Monitor Library
//!
//! Samples the host process table at a fixed interval and terminates
//! processes whose resident memory exceeds a percentage of total RAM or an
//! absolute size, escalating from SIGTERM to SIGKILL after a grace period.
//! Whitelisted pids, names and users are never touched, and neither is the
//! monitor itself.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use memory_monitor::{
//!     MemoryMonitor, PolicyEvaluator, SysinfoSampler, Terminator, Thresholds,
//!     UnixProcessControl, Whitelist,
//! };
//!
//! let evaluator = PolicyEvaluator::new(Thresholds::new(10.0, 2.0), Whitelist::default());
//! let terminator = Terminator::new(UnixProcessControl, grace_period, dry_run);
//! let mut monitor = MemoryMonitor::new(SysinfoSampler::new(), evaluator, terminator, interval);
//! let summary = monitor.run_cycle().await?;
//! ```
//!
//! # Usage as Binary
//!
//! Run directly: `memory-monitor --config /etc/memory-monitor/config.toml run`

pub mod config;
pub mod control;
pub mod error;
pub mod hog;
pub mod logging;
pub mod monitor;
pub mod policy;
pub mod sampler;
pub mod shutdown;
pub mod terminator;
pub mod types;

pub use config::{Config, ConfigError};
pub use control::{ProcessControl, UnixProcessControl};
pub use error::{MonitorError, SampleError, SignalError, SignalResult};
pub use monitor::MemoryMonitor;
pub use policy::{Breach, Exemption, PolicyEvaluator, Thresholds, Verdict, Whitelist};
pub use sampler::{ProcessSource, Sample, SysinfoSampler};
pub use terminator::{Terminator, DEFAULT_GRACE_PERIOD};
pub use types::{CycleSummary, KillMethod, KillOutcome, ProcessSnapshot, SystemMemoryInfo};
