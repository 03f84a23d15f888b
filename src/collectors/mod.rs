//! Collectors for host resource counters.
//!
//! Each submodule parses one kernel interface: /proc/meminfo for memory and
//! swap, /proc/stat for CPU times, statvfs for disk usage and /proc/net/dev
//! for network counters.

pub mod cpu;
pub mod filesystem;
pub mod meminfo;
pub mod netdev;

pub use cpu::CpuTimes;
pub use filesystem::DiskUsage;
pub use meminfo::{SwapMemory, VirtualMemory};
pub use netdev::NetIoCounters;
