//! Physical memory and swap statistics from /proc/meminfo.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::SourceError;

/// Raw /proc/meminfo values in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: Option<u64>,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Physical memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VirtualMemory {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

/// Swap usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SwapMemory {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

impl MemInfo {
    /// Used memory is everything the kernel does not report as available.
    /// Kernels older than 3.14 lack MemAvailable; free + buffers + cached
    /// stands in for it there.
    pub fn virtual_memory(&self) -> VirtualMemory {
        let available = self
            .mem_available
            .unwrap_or_else(|| {
                self.mem_free
                    .saturating_add(self.buffers)
                    .saturating_add(self.cached)
            });

        VirtualMemory {
            total: self.mem_total,
            free: self.mem_free,
            used: self.mem_total.saturating_sub(available),
        }
    }

    pub fn swap_memory(&self) -> SwapMemory {
        SwapMemory {
            total: self.swap_total,
            free: self.swap_free,
            used: self.swap_total.saturating_sub(self.swap_free),
        }
    }
}

/// Parses the contents of /proc/meminfo.
///
/// MemTotal, MemFree, SwapTotal and SwapFree are required; the rest default
/// to zero (or `None` for MemAvailable).
pub fn parse_meminfo(content: &str) -> Result<MemInfo, String> {
    let mut mem_total: Option<u64> = None;
    let mut mem_free: Option<u64> = None;
    let mut swap_total: Option<u64> = None;
    let mut swap_free: Option<u64> = None;
    let mut info = MemInfo::default();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };

        let bytes = match value.parse::<u64>() {
            Ok(kb) => kb.saturating_mul(1024),
            Err(_) => continue,
        };

        match key {
            "MemTotal:" => mem_total = Some(bytes),
            "MemFree:" => mem_free = Some(bytes),
            "MemAvailable:" => info.mem_available = Some(bytes),
            "Buffers:" => info.buffers = bytes,
            "Cached:" => info.cached = bytes,
            "SwapTotal:" => swap_total = Some(bytes),
            "SwapFree:" => swap_free = Some(bytes),
            _ => {}
        }
    }

    match (mem_total, mem_free, swap_total, swap_free) {
        (Some(total), Some(free), Some(stotal), Some(sfree)) => {
            info.mem_total = total;
            info.mem_free = free;
            info.swap_total = stotal;
            info.swap_free = sfree;
            Ok(info)
        }
        _ => Err("missing MemTotal, MemFree, SwapTotal or SwapFree".to_string()),
    }
}

/// Reads and parses a meminfo file.
pub fn read_meminfo(path: &Path) -> Result<MemInfo, SourceError> {
    let content = fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_meminfo(&content).map_err(|reason| SourceError::Parse {
        path: path.display().to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16305312 kB
MemFree:         1234560 kB
MemAvailable:    8000000 kB
Buffers:          200000 kB
Cached:          5000000 kB
SwapCached:            0 kB
SwapTotal:       2097148 kB
SwapFree:        2000000 kB
HugePages_Total:       0
";

    #[test]
    fn test_parse_meminfo() {
        let info = parse_meminfo(MEMINFO).expect("meminfo should parse");
        assert_eq!(info.mem_total, 16305312 * 1024);
        assert_eq!(info.mem_available, Some(8000000 * 1024));

        let vm = info.virtual_memory();
        assert_eq!(vm.total, 16305312 * 1024);
        assert_eq!(vm.free, 1234560 * 1024);
        assert_eq!(vm.used, (16305312 - 8000000) * 1024);

        let swap = info.swap_memory();
        assert_eq!(swap.total, 2097148 * 1024);
        assert_eq!(swap.used, (2097148 - 2000000) * 1024);
    }

    #[test]
    fn test_parse_meminfo_without_mem_available() {
        let content = "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 250 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n";
        let vm = parse_meminfo(content).unwrap().virtual_memory();

        // 1000 - (100 + 50 + 250)
        assert_eq!(vm.used, 600 * 1024);
    }

    #[test]
    fn test_parse_meminfo_saturates_huge_values() {
        let content = format!(
            "MemTotal: {max} kB\nMemFree: {max} kB\nBuffers: {max} kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n",
            max = u64::MAX
        );
        let info = parse_meminfo(&content).unwrap();
        assert_eq!(info.mem_total, u64::MAX);

        let vm = info.virtual_memory();
        assert_eq!(vm.total, u64::MAX);
        assert_eq!(vm.used, 0);
    }

    #[test]
    fn test_parse_meminfo_missing_fields() {
        let result = parse_meminfo("MemTotal: 1000 kB\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_read_meminfo_missing_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = read_meminfo(&dir.path().join("meminfo"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
