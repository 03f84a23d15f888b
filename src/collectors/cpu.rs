//! Aggregate and per-core CPU times from /proc/stat.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::SourceError;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    // SAFETY: sysconf is safe to call with _SC_CLK_TCK
    // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
    let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if tck > 0 {
        tck as f64
    } else {
        100.0
    }
}

/// System clock ticks per second.
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Cumulative CPU times in seconds for one `cpu*` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuTimes {
    pub cpu: String,
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
}

/// Parses every `cpu*` line of /proc/stat, in file order.
///
/// The kernel prints the aggregate `cpu` line first, so the first entry is
/// the machine-wide total. `ticks_per_second` converts jiffies to seconds.
pub fn parse_cpu_times(content: &str, ticks_per_second: f64) -> Result<Vec<CpuTimes>, String> {
    let mut times = Vec::new();

    for line in content.lines() {
        if !line.starts_with("cpu") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 8 {
            continue;
        }

        let mut ticks = [0u64; 8];
        for (slot, raw) in ticks.iter_mut().zip(parts[1..].iter()) {
            *slot = raw
                .parse::<u64>()
                .map_err(|e| format!("invalid tick value '{}' on {}: {}", raw, parts[0], e))?;
        }

        let secs = |t: u64| t as f64 / ticks_per_second;
        times.push(CpuTimes {
            cpu: parts[0].to_string(),
            user: secs(ticks[0]),
            nice: secs(ticks[1]),
            system: secs(ticks[2]),
            idle: secs(ticks[3]),
            iowait: secs(ticks[4]),
            irq: secs(ticks[5]),
            softirq: secs(ticks[6]),
            // steal only exists on 2.6.11+
            steal: secs(ticks[7]),
        });
    }

    if times.is_empty() {
        return Err("no cpu lines found".to_string());
    }

    Ok(times)
}

/// Reads CPU times from a /proc/stat file.
pub fn read_cpu_times(path: &Path) -> Result<Vec<CpuTimes>, SourceError> {
    let content = fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_cpu_times(&content, *CLK_TCK).map_err(|reason| SourceError::Parse {
        path: path.display().to_string(),
        reason,
    })
}
