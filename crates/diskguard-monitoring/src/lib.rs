//! Host health checks
//!
//! This crate provides diskguard's checks:
//! - Disk space sampling and the free space threshold alert
//! - Memory and disk usage report with fixed warning levels

pub mod disk_space;
pub mod host;
pub mod sampler;
pub mod usage;

pub use disk_space::*;
pub use host::resolve_host_tag;
pub use sampler::{DiskStatus, FilesystemSampler, StatfsSampler};
pub use usage::{MemoryStatus, UsageReport, USAGE_WARNING_PERCENT};
