//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use node_metrics_sampler::collectors::{
    CpuTimes, DiskUsage, NetIoCounters, SwapMemory, VirtualMemory,
};
use node_metrics_sampler::{BatchPoints, HostSource, Sink, SinkError, SourceError};

fn unavailable(what: &str) -> SourceError {
    SourceError::Io {
        path: what.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "simulated failure"),
    }
}

/// Host source returning fixed counters, with per-counter failure switches.
#[derive(Debug, Clone)]
pub struct FakeSource {
    pub hostname: String,
    pub fail_memory: bool,
    pub fail_swap: bool,
    pub fail_cpu: bool,
    pub fail_disk: bool,
    pub fail_net: bool,
    pub fail_hostname: bool,
    pub empty_cpu: bool,
    pub cpu_system: f64,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self {
            hostname: "node-1".to_string(),
            fail_memory: false,
            fail_swap: false,
            fail_cpu: false,
            fail_disk: false,
            fail_net: false,
            fail_hostname: false,
            empty_cpu: false,
            cpu_system: 5.2,
        }
    }
}

impl HostSource for FakeSource {
    fn virtual_memory(&self) -> Result<VirtualMemory, SourceError> {
        if self.fail_memory {
            return Err(unavailable("meminfo"));
        }
        Ok(VirtualMemory {
            total: 1000,
            used: 400,
            free: 600,
        })
    }

    fn swap_memory(&self) -> Result<SwapMemory, SourceError> {
        if self.fail_swap {
            return Err(unavailable("meminfo"));
        }
        Ok(SwapMemory {
            total: 0,
            used: 0,
            free: 0,
        })
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimes>, SourceError> {
        if self.fail_cpu {
            return Err(unavailable("stat"));
        }
        if self.empty_cpu {
            return Ok(Vec::new());
        }
        Ok(vec![CpuTimes {
            cpu: "cpu".to_string(),
            user: 10.0,
            nice: 0.0,
            system: self.cpu_system,
            idle: 100.0,
            iowait: 0.0,
            irq: 0.0,
            softirq: 0.0,
            steal: 0.0,
        }])
    }

    fn disk_usage(&self, path: &str) -> Result<DiskUsage, SourceError> {
        if self.fail_disk {
            return Err(SourceError::Syscall {
                call: "statvfs",
                path: path.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "simulated failure"),
            });
        }
        Ok(DiskUsage {
            path: path.to_string(),
            total: 100,
            used: 40,
            free: 60,
            used_percent: 40.0,
        })
    }

    fn net_io_counters(&self) -> Result<Vec<NetIoCounters>, SourceError> {
        if self.fail_net {
            return Err(unavailable("net/dev"));
        }
        Ok(vec![NetIoCounters {
            name: "all".to_string(),
            bytes_recv: 123,
            bytes_sent: 456,
            ..Default::default()
        }])
    }

    fn hostname(&self) -> Result<String, SourceError> {
        if self.fail_hostname {
            return Err(SourceError::Hostname("simulated failure".to_string()));
        }
        Ok(self.hostname.clone())
    }
}

/// Sink that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub databases: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<BatchPoints>>,
    pub write_attempts: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_ensure: bool,
    /// Never answers the database ensure.
    pub stall_ensure: bool,
    pub fail_writes: bool,
    /// Cancelled once this many writes have been attempted.
    pub cancel_after_writes: Option<(usize, CancellationToken)>,
}

impl RecordingSink {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<BatchPoints> {
        self.batches.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn ensure_database(&self, name: &str) -> Result<(), SinkError> {
        if self.fail_ensure {
            return Err(SinkError::Response("database ensure refused".to_string()));
        }
        if self.stall_ensure {
            std::future::pending::<()>().await;
        }
        let mut databases = self.databases.lock().unwrap();
        if !databases.iter().any(|d| d == name) {
            databases.push(name.to_string());
        }
        Ok(())
    }

    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError> {
        let attempts = self.write_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, token)) = &self.cancel_after_writes {
            if attempts >= *limit {
                token.cancel();
            }
        }

        if self.fail_writes {
            return Err(SinkError::Status {
                endpoint: "write",
                status: 500,
                message: "simulated write failure".to_string(),
            });
        }

        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Output lines written by a sampler.
pub fn output_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::to_string)
        .collect()
}
