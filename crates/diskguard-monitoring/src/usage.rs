//! Memory and disk usage report
//!
//! A lighter companion to the disk space check: computes used percentages
//! for memory and the root filesystem and warns at a fixed level. Nothing is
//! sent anywhere, the warnings are only logged.

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::sampler::DiskStatus;

/// Used percentage at or above which a warning is raised
pub const USAGE_WARNING_PERCENT: f64 = 80.0;

/// Physical memory usage, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStatus {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl MemoryStatus {
    pub fn from_bytes(total: u64, free: u64) -> Self {
        let free = free.min(total);
        Self {
            total,
            used: total - free,
            free,
        }
    }

    /// Read current memory figures from the OS
    pub fn sample() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self::from_bytes(sys.total_memory(), sys.available_memory())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Rounded to two decimals
    pub memory_used_percent: f64,
    /// Rounded to two decimals
    pub disk_used_percent: f64,
    pub warnings: Vec<String>,
}

impl UsageReport {
    pub fn new(memory: &MemoryStatus, disk: &DiskStatus) -> Self {
        let memory_used_percent = round2(percent(memory.used, memory.total));
        let disk_used_percent = round2(percent(disk.used, disk.all));

        let mut warnings = Vec::new();
        if memory_used_percent >= USAGE_WARNING_PERCENT {
            warnings.push(format!(
                "You are currently using {}% of your available memory",
                USAGE_WARNING_PERCENT
            ));
        }
        if disk_used_percent >= USAGE_WARNING_PERCENT {
            warnings.push(format!(
                "You are currently using {}% of your available disk",
                USAGE_WARNING_PERCENT
            ));
        }

        Self {
            memory_used_percent,
            disk_used_percent,
            warnings,
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 * 100.0) / total as f64
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
