//! Host resource usage for `/stats` and the startup log

use std::fmt::Write as _;
use std::path::Path;

use sysinfo::{Disks, System};

use crate::{Error, Result};

/// Usage above this percentage is flagged
pub const HIGH_USAGE_PERCENT: f32 = 80.0;

/// Point-in-time CPU, memory and root-disk usage, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStats {
    pub cpu: f32,
    pub memory: f32,
    pub disk: f32,
}

impl SystemStats {
    /// Sample the host
    ///
    /// Blocks for one CPU measurement window.
    #[must_use]
    pub fn sample() -> Self {
        let mut sys = System::new();
        // CPU usage is a delta between two refreshes
        sys.refresh_cpu();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.iter().next())
            .map_or(0.0, |d| {
                percent(d.total_space().saturating_sub(d.available_space()), d.total_space())
            });

        Self {
            cpu: sys.global_cpu_info().cpu_usage(),
            memory: percent(sys.used_memory(), sys.total_memory()),
            disk,
        }
    }

    /// Sample on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns error if the sampling task panics or is cancelled
    pub async fn collect() -> Result<Self> {
        tokio::task::spawn_blocking(Self::sample)
            .await
            .map_err(|e| Error::Resource(format!("system stats sampling failed: {e}")))
    }

    /// One gauge per line, as sent for `/stats`
    #[must_use]
    pub fn reply_text(&self) -> String {
        self.gauges().join("\n")
    }

    /// All gauges on one line, for the log
    #[must_use]
    pub fn summary_line(&self) -> String {
        self.gauges().join(" | ")
    }

    fn gauges(&self) -> [String; 3] {
        [
            gauge("CPU", self.cpu, "🔥"),
            gauge("Memory", self.memory, "☁"),
            gauge("Disk", self.disk, "💾"),
        ]
    }
}

fn gauge(label: &str, value: f32, flag: &str) -> String {
    let mut text = format!("{label}: {value:.1}%");
    if value > HIGH_USAGE_PERCENT {
        let _ = write!(text, " {flag}");
    }
    text
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}
