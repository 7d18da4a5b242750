//! `sysinfo`-backed process sampler

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};

use super::{ProcessSource, Sample};
use crate::error::SampleError;
use crate::types::{ProcessSnapshot, SystemMemoryInfo};

/// Longest command line kept in a snapshot, in characters
const CMDLINE_MAX_CHARS: usize = 256;

/// Samples the live process table through `sysinfo`
pub struct SysinfoSampler {
    system: System,
    users: Users,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::new()
            .with_memory()
            .with_user(UpdateKind::OnlyIfNotSet)
            .with_cmd(UpdateKind::OnlyIfNotSet)
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoSampler {
    fn memory(&mut self) -> Result<SystemMemoryInfo, SampleError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(SampleError::MemoryUnavailable);
        }
        Ok(SystemMemoryInfo::new(total, self.system.used_memory()))
    }

    fn sample(&mut self) -> Result<Sample<'_>, SampleError> {
        let memory = self.memory()?;

        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            Self::refresh_kind(),
        );
        if self.system.processes().is_empty() {
            return Err(SampleError::EnumerationFailed);
        }
        self.users.refresh_list();

        let users = &self.users;
        let processes = self
            .system
            .processes()
            .iter()
            .filter_map(move |(pid, process)| snapshot(*pid, process, users));

        Ok(Sample::new(memory, processes))
    }
}

/// Build a snapshot, or `None` for entries that should not be evaluated:
/// thread entries (their memory belongs to the owning process) and
/// processes whose owner could not be read.
fn snapshot(pid: Pid, process: &Process, users: &Users) -> Option<ProcessSnapshot> {
    if process.thread_kind().is_some() {
        return None;
    }

    let uid = process.user_id()?;
    let owner = users
        .get_user_by_id(uid)
        .map(|user| user.name().to_string())
        .unwrap_or_else(|| (**uid).to_string());

    Some(ProcessSnapshot {
        pid: pid.as_u32(),
        parent_pid: process.parent().map(|p| p.as_u32()).unwrap_or(0),
        name: process.name().to_string_lossy().to_string(),
        owner,
        cmdline: join_cmdline(process),
        resident_bytes: process.memory(),
    })
}

fn join_cmdline(process: &Process) -> String {
    let joined = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(CMDLINE_MAX_CHARS).collect()
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sees_current_process() {
        let mut sampler = SysinfoSampler::new();
        let sample = sampler.sample().expect("sample should succeed on linux");

        assert!(sample.memory.total_bytes > 0);

        let own_pid = std::process::id();
        let processes: Vec<ProcessSnapshot> = sample.processes.collect();
        let own = processes
            .iter()
            .find(|p| p.pid == own_pid)
            .expect("own process should be listed");
        assert!(own.resident_bytes > 0);
        assert!(!own.owner.is_empty());
    }

    #[test]
    fn test_thread_entries_are_skipped() {
        let handle = std::thread::spawn(|| std::thread::sleep(std::time::Duration::from_millis(500)));

        let mut sampler = SysinfoSampler::new();
        let sample = sampler.sample().expect("sample should succeed on linux");
        let own_pid = std::process::id();
        let own_entries = sample
            .processes
            .filter(|p| p.pid == own_pid || p.parent_pid == own_pid)
            .count();
        assert_eq!(own_entries, 1);

        handle.join().unwrap();
    }

    #[test]
    fn test_memory_reports_total() {
        let mut sampler = SysinfoSampler::new();
        let memory = sampler.memory().unwrap();
        assert!(memory.total_bytes >= memory.used_bytes);
    }
}
