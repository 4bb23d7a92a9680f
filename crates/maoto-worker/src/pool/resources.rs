//! Process resource sampling for monitor logs

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

/// Resource usage of this process at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub memory_rss_mb: f64,
    pub cpu_percent: f32,
}

/// Samples CPU and RSS of the current process
pub struct ResourceMonitor {
    pid: Pid,
    system: Mutex<System>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new().with_cpu().with_memory()),
        );

        Self {
            pid,
            system: Mutex::new(system),
        }
    }

    /// Refresh and read current usage
    ///
    /// CPU usage is measured since the previous call, so the first sample
    /// reports 0.
    pub fn sample(&self) -> ResourceSnapshot {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );

        match system.process(self.pid) {
            Some(process) => ResourceSnapshot {
                memory_rss_mb: process.memory() as f64 / (1024.0 * 1024.0),
                cpu_percent: process.cpu_usage(),
            },
            None => ResourceSnapshot::default(),
        }
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reports_own_memory() {
        let monitor = ResourceMonitor::new();
        let snapshot = monitor.sample();
        assert!(snapshot.memory_rss_mb > 0.0);
        assert!(snapshot.cpu_percent >= 0.0);
    }
}
