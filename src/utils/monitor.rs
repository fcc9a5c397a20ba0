#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

/// Samples this process between render jobs. The browser runs as a child
/// process and is not included in the numbers.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    inner: Option<Mutex<Sampler>>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let inner = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => {
                    let mut system = System::new_with_specifics(RefreshKind::everything());
                    system.refresh_all();
                    Some(Mutex::new(Sampler {
                        system,
                        pid,
                        peak_memory_mb: 0,
                    }))
                }
                Err(e) => {
                    tracing::warn!("System monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            inner,
            start_time: Instant::now(),
        }
    }

    pub fn get_stats(&self) -> Option<ProcessStats> {
        let mut sampler = self.inner.as_ref()?.lock().ok()?;
        sampler.system.refresh_all();

        let pid = sampler.pid;
        let process = sampler.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();

        sampler.peak_memory_mb = sampler.peak_memory_mb.max(memory_mb);

        Some(ProcessStats {
            cpu_usage,
            memory_usage_mb: memory_mb,
            peak_memory_mb: sampler.peak_memory_mb,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.get_stats().is_none());
    }

    #[test]
    fn test_enabled_monitor_tracks_peak() {
        let monitor = SystemMonitor::new(true);
        if let Some(stats) = monitor.get_stats() {
            assert!(stats.peak_memory_mb >= stats.memory_usage_mb);
        }
    }
}
