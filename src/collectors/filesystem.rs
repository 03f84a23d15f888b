//! Filesystem usage for a single mount point via statvfs(3).

use serde::Serialize;
use std::ffi::CString;
use std::io;
use std::mem;

use crate::error::SourceError;

/// Disk usage for one path, in bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsage {
    pub path: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

impl DiskUsage {
    /// Builds usage figures from raw statvfs block counts.
    ///
    /// `free` counts blocks available to unprivileged users while `used`
    /// excludes reserved blocks, so used + free can be less than total.
    pub fn from_blocks(
        path: &str,
        fragment_size: u64,
        blocks: u64,
        blocks_free: u64,
        blocks_available: u64,
    ) -> Self {
        let total = fragment_size * blocks;
        let free = fragment_size * blocks_available;
        let used = fragment_size * blocks.saturating_sub(blocks_free);

        let used_percent = if used + free == 0 {
            0.0
        } else {
            used as f64 / (used + free) as f64 * 100.0
        };

        Self {
            path: path.to_string(),
            total,
            free,
            used,
            used_percent,
        }
    }
}

/// Gets filesystem usage for the filesystem containing `path`.
pub fn read_disk_usage(path: &str) -> Result<DiskUsage, SourceError> {
    let c_path = CString::new(path).map_err(|e| SourceError::Parse {
        path: path.to_string(),
        reason: format!("invalid path: {}", e),
    })?;

    // SAFETY: statvfs is a plain C struct of integers, valid when zeroed,
    // and c_path is a NUL-terminated string that outlives the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(SourceError::Syscall {
                call: "statvfs",
                path: path.to_string(),
                source: io::Error::last_os_error(),
            });
        }
        stat
    };

    Ok(DiskUsage::from_blocks(
        path,
        stat.f_frsize as u64,
        stat.f_blocks as u64,
        stat.f_bfree as u64,
        stat.f_bavail as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks() {
        // 100 blocks, 10 reserved for root, 50 available to users
        let usage = DiskUsage::from_blocks("/", 4096, 100, 60, 50);
        assert_eq!(usage.total, 409_600);
        assert_eq!(usage.used, 40 * 4096);
        assert_eq!(usage.free, 50 * 4096);
        assert!((usage.used_percent - 40.0 / 90.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_blocks_empty_filesystem() {
        let usage = DiskUsage::from_blocks("/empty", 4096, 0, 0, 0);
        assert_eq!(usage.used_percent, 0.0);
    }

    #[test]
    fn test_read_disk_usage_root() {
        let usage = read_disk_usage("/").expect("statvfs on / should succeed");
        assert!(usage.total > 0, "Root filesystem reports zero size");
        assert!(usage.used_percent >= 0.0 && usage.used_percent <= 100.0);
    }

    #[test]
    fn test_read_disk_usage_missing_path() {
        let result = read_disk_usage("/definitely/not/a/mount/point");
        assert!(matches!(result, Err(SourceError::Syscall { .. })));
    }
}
