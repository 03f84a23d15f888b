//! Host-counter source.
//!
//! `HostSource` is the seam between the snapshot builder and the operating
//! system. `ProcSource` implements it on Linux by reading the /proc
//! filesystem, calling statvfs(3) for disk usage and gethostname(2) for the
//! host tag.

use std::path::{Path, PathBuf};

use crate::collectors::{cpu, filesystem, meminfo, netdev};
use crate::collectors::{CpuTimes, DiskUsage, NetIoCounters, SwapMemory, VirtualMemory};
use crate::error::SourceError;

/// Read operations the sampler needs from the host.
pub trait HostSource {
    fn virtual_memory(&self) -> Result<VirtualMemory, SourceError>;

    fn swap_memory(&self) -> Result<SwapMemory, SourceError>;

    /// CPU times with the machine-wide aggregate first.
    fn cpu_times(&self) -> Result<Vec<CpuTimes>, SourceError>;

    fn disk_usage(&self, path: &str) -> Result<DiskUsage, SourceError>;

    /// Network counters with the all-interface aggregate first.
    fn net_io_counters(&self) -> Result<Vec<NetIoCounters>, SourceError>;

    fn hostname(&self) -> Result<String, SourceError>;
}

/// Linux implementation backed by /proc.
#[derive(Debug, Clone)]
pub struct ProcSource {
    proc_root: PathBuf,
}

impl Default for ProcSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Reads counters below `root` instead of /proc.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }
}

impl HostSource for ProcSource {
    fn virtual_memory(&self) -> Result<VirtualMemory, SourceError> {
        Ok(meminfo::read_meminfo(&self.proc_root.join("meminfo"))?.virtual_memory())
    }

    fn swap_memory(&self) -> Result<SwapMemory, SourceError> {
        Ok(meminfo::read_meminfo(&self.proc_root.join("meminfo"))?.swap_memory())
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimes>, SourceError> {
        cpu::read_cpu_times(&self.proc_root.join("stat"))
    }

    fn disk_usage(&self, path: &str) -> Result<DiskUsage, SourceError> {
        filesystem::read_disk_usage(path)
    }

    fn net_io_counters(&self) -> Result<Vec<NetIoCounters>, SourceError> {
        netdev::read_net_io_counters(&self.proc_root.join("net").join("dev"))
    }

    fn hostname(&self) -> Result<String, SourceError> {
        let name = nix::unistd::gethostname().map_err(|e| SourceError::Hostname(e.to_string()))?;

        name.into_string()
            .map_err(|raw| SourceError::Hostname(format!("not valid UTF-8: {:?}", raw)))
    }
}
