//! Filesystem statistics via `statfs(2)`

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Block usage of one filesystem, in bytes
///
/// `used` is always derived as `all - free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskStatus {
    pub all: u64,
    pub used: u64,
    pub free: u64,
}

impl DiskStatus {
    /// Build a status from raw block counts
    pub fn from_blocks(total_blocks: u64, free_blocks: u64, block_size: u64) -> Self {
        let all = total_blocks.saturating_mul(block_size);
        let free = free_blocks.saturating_mul(block_size);

        Self::from_bytes(all, free)
    }

    pub fn from_bytes(all: u64, free: u64) -> Self {
        let free = free.min(all);
        Self {
            all,
            used: all - free,
            free,
        }
    }
}

/// Source of filesystem usage statistics
pub trait FilesystemSampler: Send + Sync {
    fn sample(&self, path: &Path) -> io::Result<DiskStatus>;
}

/// Samples the filesystem containing `path` with the `statfs` system call
#[derive(Debug, Clone, Copy, Default)]
pub struct StatfsSampler;

impl FilesystemSampler for StatfsSampler {
    #[cfg(unix)]
    #[allow(clippy::unnecessary_cast)]
    fn sample(&self, path: &Path) -> io::Result<DiskStatus> {
        let stat = nix::sys::statfs::statfs(path).map_err(io::Error::from)?;

        // Free blocks include the root reserve, matching f_bfree
        Ok(DiskStatus::from_blocks(
            stat.blocks() as u64,
            stat.blocks_free() as u64,
            stat.block_size() as u64,
        ))
    }

    #[cfg(not(unix))]
    fn sample(&self, _path: &Path) -> io::Result<DiskStatus> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "statfs is not available on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_from_blocks_derives_used() {
        let status = DiskStatus::from_blocks(1000, 250, 4096);

        assert_eq!(status.all, 4_096_000);
        assert_eq!(status.free, 1_024_000);
        assert_eq!(status.used, status.all - status.free);
    }

    #[test]
    fn test_used_plus_free_is_all() {
        let cases = [(0, 0, 4096), (100, 0, 512), (100, 100, 512), (26_214_400, 2_621_440, 4096)];

        for (blocks, free_blocks, bsize) in cases {
            let status = DiskStatus::from_blocks(blocks, free_blocks, bsize);
            assert_eq!(status.used + status.free, status.all);
        }
    }

    #[test]
    fn test_from_bytes() {
        let status = DiskStatus::from_bytes(100 * GIB, 10 * GIB);
        assert_eq!(status.used, 90 * GIB);
    }

    #[cfg(unix)]
    #[test]
    fn test_statfs_root() {
        let status = StatfsSampler.sample(Path::new("/")).unwrap();

        assert!(status.all > 0, "root filesystem should report a size");
        assert_eq!(status.used + status.free, status.all);
    }

    #[cfg(unix)]
    #[test]
    fn test_statfs_missing_path() {
        let err = StatfsSampler
            .sample(Path::new("/definitely/not/a/real/mount/point"))
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
